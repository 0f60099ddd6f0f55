mod common;

use common::{authed, dead_base_url, setup};
use desktoppr::{AuthedState, Client, Flag, Outcome};

#[test]
fn token_authorization() {
    let (_server, mut client) = setup();
    assert!(client.authorize_token("alice-token"));
    assert_eq!(client.authed_user(), Some("alice"));
    assert_eq!(client.api_token(), Some("alice-token"));
}

#[test]
fn rejected_token_keeps_the_session() {
    let (_server, mut client) = setup();
    assert!(!client.authorize_token("nope"));
    assert!(!client.is_authed());

    assert!(client.authorize_token("bob-token"));
    assert!(!client.authorize_token("nope"));
    assert_eq!(client.authed_user(), Some("bob"));
}

#[test]
fn password_authorization_stores_the_token() {
    let (_server, mut client) = setup();
    assert!(!client.authorize_user_pass("keithpitt", "wrong"));
    assert!(!client.is_authed());

    assert!(client.authorize_user_pass("keithpitt", "hunter2"));
    assert_eq!(client.authed_user(), Some("keithpitt"));
    assert_eq!(client.api_token(), Some("keith-token"));
}

#[test]
fn whoami_returns_the_raw_account() {
    let (_server, client) = authed("keithpitt");
    let me = client.whoami().unwrap();
    assert_eq!(me["username"], "keithpitt");
    assert_eq!(me["api_token"], "keith-token");
    assert_eq!(me["lifetime_member"], true);
}

#[test]
fn privileged_calls_need_a_session() {
    let (server, client) = setup();
    assert_eq!(client.follow_user("alice"), Outcome::Unauthenticated);
    assert_eq!(client.unfollow_user("alice"), Outcome::Unauthenticated);
    assert_eq!(client.like_wallpaper(100), Outcome::Unauthenticated);
    assert_eq!(client.unlike_wallpaper(100), Outcome::Unauthenticated);
    assert_eq!(client.sync_wallpaper(100), Outcome::Unauthenticated);
    assert_eq!(client.unsync_wallpaper(100), Outcome::Unauthenticated);
    assert_eq!(client.flag_wallpaper(123, "flag_safe"), Outcome::Unauthenticated);
    assert_eq!(client.flag_wallpaper(123, Flag::Deletion), Outcome::Unauthenticated);
    assert_eq!(client.whoami(), None);
    assert_eq!(server.hits(), 0);
}

#[test]
fn logout_ends_the_session() {
    let (server, mut client) = authed("alice");
    let state = client.logout().unwrap();
    assert_eq!(state.username, "alice");
    let hits = server.hits();
    assert_eq!(client.like_wallpaper(100), Outcome::Unauthenticated);
    assert_eq!(server.hits(), hits);
}

#[test]
fn stale_token_fails_rather_than_unauthenticated() {
    let (_server, client) = setup();
    let client = client.load(AuthedState {
        api_token: "revoked".into(),
        username: "alice".into(),
    });
    assert_eq!(client.like_wallpaper(100), Outcome::Failure);
    assert_eq!(client.whoami(), None);
}

#[test]
fn follow_then_unfollow() {
    let (server, client) = authed("keithpitt");
    assert_eq!(client.follow_user("alice"), Outcome::Success);
    assert!(server.data.world().accounts["keithpitt"].following.contains("alice"));

    let following = client.user_following("keithpitt", 1).unwrap();
    assert!(following.iter().any(|u| u.username == "alice"));

    assert_eq!(client.unfollow_user("alice"), Outcome::Success);
    assert!(!server.data.world().accounts["keithpitt"].following.contains("alice"));
    // Only 200 counts for follows.
    assert_eq!(client.unfollow_user("alice"), Outcome::Failure);
    assert_eq!(client.follow_user("nobody"), Outcome::Failure);
}

#[test]
fn like_is_idempotent_and_visible() {
    let (_server, client) = authed("alice");
    assert_eq!(client.check_if_liked("alice", 104), Some(false));

    assert_eq!(client.like_wallpaper(104), Outcome::Success);
    assert_eq!(client.check_if_liked("alice", 104), Some(true));
    // Already liked comes back 422.
    assert_eq!(client.like_wallpaper(104), Outcome::Success);

    assert_eq!(client.unlike_wallpaper(104), Outcome::Success);
    assert_eq!(client.check_if_liked("alice", 104), Some(false));
    // Not liked comes back 404.
    assert_eq!(client.unlike_wallpaper(104), Outcome::Success);
}

#[test]
fn liking_a_missing_wallpaper_fails() {
    let (_server, client) = authed("alice");
    assert_eq!(client.like_wallpaper(999_999), Outcome::Failure);
    assert_eq!(client.sync_wallpaper(999_999), Outcome::Failure);
}

#[test]
fn sync_round_trip() {
    let (_server, client) = authed("bob");
    assert_eq!(client.check_if_synced("bob", 106), Some(false));

    assert_eq!(client.sync_wallpaper(106), Outcome::Success);
    assert_eq!(client.sync_wallpaper(106), Outcome::Success);
    assert_eq!(client.check_if_synced("bob", 106), Some(true));
    assert_eq!(client.user_collection("bob", 1).unwrap().items_on_page(), 1);

    assert_eq!(client.unsync_wallpaper(106), Outcome::Success);
    assert_eq!(client.unsync_wallpaper(106), Outcome::Success);
    assert_eq!(client.check_if_synced("bob", 106), Some(false));
}

#[test]
fn flagging() {
    let (server, client) = authed("carol");
    assert_eq!(client.flag_wallpaper(103, Flag::NotSafe), Outcome::Success);
    assert_eq!(client.flag_wallpaper(105, "flag_deletion"), Outcome::Success);
    assert_eq!(client.flag_wallpaper(999_999, Flag::Safe), Outcome::Failure);
    {
        let world = server.data.world();
        assert_eq!(world.wallpapers[&103].flags, vec!["flag_not_safe"]);
        assert_eq!(world.wallpapers[&105].flags, vec!["flag_deletion"]);
    }

    let hits = server.hits();
    assert_eq!(client.flag_wallpaper(103, "flag_bogus"), Outcome::InvalidInput);
    assert_eq!(server.hits(), hits);
}

#[test]
fn unreachable_server_fails_privileged_calls() {
    let _ = pretty_env_logger::try_init_timed();
    let state = AuthedState {
        api_token: "keith-token".into(),
        username: "keithpitt".into(),
    };
    let mut client = Client::with_base_url(&dead_base_url()).unwrap().load(state.clone());
    assert_eq!(client.like_wallpaper(100), Outcome::Failure);
    assert_eq!(client.follow_user("alice"), Outcome::Failure);
    assert_eq!(client.whoami(), None);

    assert!(!client.authorize_token("alice-token"));
    assert!(!client.authorize_user_pass("alice", "wonderland"));
    assert_eq!(client.state(), Some(&state));
}
