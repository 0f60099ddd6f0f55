mod common;

use common::{dead_base_url, setup};
use desktoppr::{Client, Image, ReviewState, SafeFilter};
use mock_server::{BROKEN_USER, GARBLED_USER, PER_PAGE};

#[test]
fn user_info() {
    let (_server, client) = setup();
    let keith = client.user_info("keithpitt").unwrap();
    assert_eq!(keith.username, "keithpitt");
    assert_eq!(keith.name.as_deref(), Some("Keith Pitt"));
    assert_eq!(keith.wallpapers_count, 3);
    assert_eq!(keith.uploaded_count, 3);
    assert_eq!(keith.followers_count, 2);
    assert_eq!(keith.following_count, 1);
    assert!(keith.lifetime_member);
    assert_eq!(keith.created().unwrap().year(), 2012);
    assert!(keith.extra.is_empty());
}

#[test]
fn missing_and_broken_users_are_absent() {
    let (server, client) = setup();
    assert!(client.user_info("nobody").is_none());
    assert!(client.user_info(BROKEN_USER).is_none());
    assert!(client.user_collection(BROKEN_USER, 1).is_none());
    assert!(client.user_random_wallpaper("nobody").is_none());
    assert!(client.check_if_liked("nobody", 100).is_none());
    assert!(client.check_if_synced(BROKEN_USER, 100).is_none());
    assert_eq!(server.hits(), 6);
}

#[test]
fn garbled_bodies_read_as_absent() {
    let (server, client) = setup();
    assert!(client.user_info(GARBLED_USER).is_none());
    assert!(client.user_collection(GARBLED_USER, 1).is_none());
    assert!(client.user_random_wallpaper(GARBLED_USER).is_none());
    assert_eq!(server.hits(), 3);
}

#[test]
fn unreachable_server_reads_as_absent() {
    let _ = pretty_env_logger::try_init_timed();
    let client = Client::with_base_url(&dead_base_url()).unwrap();
    assert!(client.user_info("keithpitt").is_none());
    assert!(client.wallpapers(1, SafeFilter::Safe).is_none());
    assert!(client.user_collection("keithpitt", 1).is_none());
    assert!(client.check_if_liked("keithpitt", 101).is_none());
}

#[test]
fn walking_every_safe_wallpaper() {
    let (_server, client) = setup();
    let mut ids = Vec::new();
    let mut page = 1;
    loop {
        let current = client.wallpapers(page, SafeFilter::Safe).unwrap();
        assert_eq!(current.current_page, page);
        assert!(current.items_on_page() <= PER_PAGE);
        if current.items_on_page() == 0 {
            break;
        }
        assert!(current.iter().all(|w| w.review_state == Some(ReviewState::Safe)));
        ids.extend(current.iter().map(|w| w.id));
        page = current.current_page + 1;
    }
    assert_eq!(ids, vec![100, 101, 104, 106]);
    assert_eq!(page, 3);
}

#[test]
fn pagination_metadata() {
    let (_server, client) = setup();
    let first = client.wallpapers(1, "all").unwrap();
    assert_eq!(first.previous_page, None);
    assert_eq!(first.next_page, Some(2));
    assert_eq!(first.per_page as usize, PER_PAGE);
    assert_eq!(first.pages_count, 4);
    assert!(!first.is_last());

    let last = client.wallpapers(4, "all").unwrap();
    assert_eq!(last.previous_page, Some(3));
    assert_eq!(last.next_page, None);
    assert_eq!(last.items_on_page(), 1);
    assert!(last.is_last());
}

#[test]
fn bogus_filter_makes_no_request() {
    let (server, client) = setup();
    assert!(client.wallpapers(1, "bogus").is_none());
    assert!(client.random_wallpaper("bogus").is_none());
    assert!(client.wallpaper_urls(1, "NSFW").is_none());
    assert_eq!(server.hits(), 0);
}

#[test]
fn include_pending_widens_the_listing() {
    let (_server, client) = setup();
    let mut states = Vec::new();
    for page in 1..=3 {
        let listed = client.wallpapers(page, SafeFilter::IncludePending).unwrap();
        states.extend(listed.into_iter().filter_map(|w| w.review_state));
    }
    assert_eq!(states.len(), 6);
    assert!(states.contains(&ReviewState::Pending));
    assert!(!states.contains(&ReviewState::NotSafe));
}

#[test]
fn wallpaper_entities() {
    let (_server, client) = setup();
    let page = client.wallpapers(2, SafeFilter::Safe).unwrap();
    let orphan = page.iter().find(|w| w.id == 104).unwrap();
    assert_eq!(orphan.uploader, None);
    assert_eq!(orphan.width, 1920);
    assert_eq!(orphan.bytes, 400_104);
    assert_eq!(orphan.palette.len(), 2);
    assert_eq!(orphan.url.as_deref(), Some("https://www.desktoppr.co/wallpapers/104"));

    let Some(Image::Full(full)) = &orphan.image else {
        panic!("top level image should be full resolution");
    };
    assert_eq!(full.url, "https://a.desktoppr.co/wallpapers/104/full.jpg");
    assert_eq!((full.thumb.width, full.thumb.height), (296, 185));
    assert_eq!((full.preview.width, full.preview.height), (960, 600));
}

#[test]
fn wallpaper_urls() {
    let (_server, client) = setup();
    let urls = client.wallpaper_urls(1, SafeFilter::Safe).unwrap();
    assert_eq!(
        urls,
        vec![
            "https://a.desktoppr.co/wallpapers/100/full.jpg",
            "https://a.desktoppr.co/wallpapers/101/full.jpg",
        ]
    );
}

#[test]
fn random_wallpapers() {
    let (_server, client) = setup();
    for _ in 0..4 {
        let paper = client.random_wallpaper(SafeFilter::Safe).unwrap();
        assert!(paper.is_safe());
    }
    let picked = client.user_random_wallpaper("keithpitt").unwrap();
    assert!([100, 101, 102].contains(&picked.id));
    // carol's collection is empty.
    assert!(client.user_random_wallpaper("carol").is_none());
}

#[test]
fn collection_walk_ends_on_an_empty_page() {
    let (_server, client) = setup();
    let first = client.user_collection("keithpitt", 1).unwrap();
    assert_eq!(first.items_on_page(), 2);
    let second = client.user_collection("keithpitt", 2).unwrap();
    assert_eq!(second.items_on_page(), 1);
    assert!(second.is_last());
    let past = client.user_collection("keithpitt", 3).unwrap();
    assert!(past.is_empty());

    let empty = client.user_collection("carol", 1).unwrap();
    assert_eq!(empty.items_on_page(), 0);
    assert_eq!(empty.next_page, None);
}

#[test]
fn followers_and_following() {
    let (_server, client) = setup();
    let followers = client.user_followers("keithpitt", 1).unwrap();
    let names: Vec<_> = followers.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);

    let following = client.user_following("keithpitt", 1).unwrap();
    assert_eq!(following.items_on_page(), 1);
    assert_eq!(following.items[0].username, "bob");

    assert!(client.user_followers("nobody", 1).is_none());
}

#[test]
fn likes_and_liked_status() {
    let (_server, client) = setup();
    let liked = client.user_likes("keithpitt", 1).unwrap();
    let ids: Vec<_> = liked.iter().map(|w| w.id).collect();
    assert_eq!(ids, [101, 103]);
    for id in ids {
        assert_eq!(client.check_if_liked("keithpitt", id), Some(true));
    }
    assert_eq!(client.check_if_liked("keithpitt", 100), Some(false));
}

#[test]
fn synced_status_reads_the_count() {
    let (_server, client) = setup();
    assert_eq!(client.check_if_synced("keithpitt", 100), Some(true));
    assert_eq!(client.check_if_synced("keithpitt", 106), Some(false));
    assert_eq!(client.check_if_synced("keithpitt", 1_240_890_000), Some(false));
}
