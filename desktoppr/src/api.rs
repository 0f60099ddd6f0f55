use crate::client::Client;
use crate::endpoint::SimpleEndpoint;
use crate::error::{Error, Result};
use crate::model::{PageNum, User, Wallpaper, WallpaperId};
use crate::page::{Listing, Page, UserPage, WallpaperPage};
use log::{debug, error, info, warn};
use reqwest::blocking::RequestBuilder;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use strum_macros::IntoStaticStr;
use url::{Position, Url};

/// The URL without its query, which may hold the API token.
fn loggable(url: &Url) -> &str {
    &url[..Position::AfterPath]
}

pub(crate) fn finalize<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let r = req.send().map_err(|e| e.without_url())?;
    let st = r.status();
    let url = r.url().clone();
    match st {
        StatusCode::OK => {
            debug!("{} from {}", st, loggable(&url));
            Ok(serde_json::from_str(&r.text()?)?)
        }
        StatusCode::NOT_FOUND => {
            info!("{} from {}", st, loggable(&url));
            Err(Error::NotFound)
        }
        _ => {
            error!("{} from {}", st, loggable(&url));
            Err(Error::Desktoppr(st.as_u16(), r.text()?))
        }
    }
}

fn list<T: DeserializeOwned>(req: RequestBuilder) -> Result<Page<T>> {
    let listing: Listing<T> = finalize(req)?;
    Ok(listing.into_page())
}

fn one<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let envelope: Envelope<T> = finalize(req)?;
    Ok(envelope.response)
}

/// Turns an internal failure into the absent value, keeping the reason in
/// the log only.
pub(crate) fn settle<T>(what: &str, res: Result<T>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(Error::NotFound) => {
            info!("{what}: nothing found");
            None
        }
        Err(e) => {
            warn!("{what}: {e:?}");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: T,
}

#[derive(Debug, Deserialize)]
struct Counted {
    count: u64,
}

/// Result of a privileged call.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No session; nothing was sent.
    Unauthenticated,
    /// The argument was rejected locally; nothing was sent.
    InvalidInput,
    Success,
    Failure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }

    pub fn is_unauthenticated(self) -> bool {
        self == Outcome::Unauthenticated
    }
}

/// Which review states a listing may include.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SafeFilter {
    #[default]
    Safe,
    IncludePending,
    All,
}

impl FromStr for SafeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "safe" => Ok(SafeFilter::Safe),
            "include_pending" => Ok(SafeFilter::IncludePending),
            "all" => Ok(SafeFilter::All),
            _ => Err(Error::InvalidFilter(s.to_owned())),
        }
    }
}

impl TryFrom<&str> for SafeFilter {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for SafeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).into())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum Flag {
    #[strum(serialize = "flag_safe")]
    Safe,
    #[strum(serialize = "flag_not_safe")]
    NotSafe,
    #[strum(serialize = "flag_deletion")]
    Deletion,
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flag_safe" => Ok(Flag::Safe),
            "flag_not_safe" => Ok(Flag::NotSafe),
            "flag_deletion" => Ok(Flag::Deletion),
            _ => Err(Error::InvalidFlag(s.to_owned())),
        }
    }
}

impl TryFrom<&str> for Flag {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).into())
    }
}

fn checked<T, F>(arg: F) -> Option<T>
where
    F: TryInto<T>,
    F::Error: fmt::Display,
{
    match arg.try_into() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

impl Client {
    /// Sends a privileged request. `tolerated` is a status that means the
    /// server is already in the requested state.
    fn act(&self, what: &str, endpoint: SimpleEndpoint, tolerated: Option<StatusCode>) -> Outcome {
        let req = match self.call(&endpoint) {
            Ok(req) => req,
            Err(_) => {
                warn!(
                    "{what} needs a session, authorize with authorize_token or authorize_user_pass first"
                );
                return Outcome::Unauthenticated;
            }
        };
        match req.send() {
            Ok(r) => {
                let st = r.status();
                if st == StatusCode::OK || Some(st) == tolerated {
                    debug!("{what}: {} from {}", st, loggable(r.url()));
                    Outcome::Success
                } else {
                    warn!("{what}: {} from {}", st, loggable(r.url()));
                    Outcome::Failure
                }
            }
            Err(e) => {
                error!("{what}: {:?}", e.without_url());
                Outcome::Failure
            }
        }
    }

    pub fn user_info(&self, username: &str) -> Option<User> {
        let req = self.guest_call(&self.api.user(username));
        settle("user info", one(req))
    }

    /// A page of the wallpapers in a user's collection. Pages past the end
    /// come back empty.
    pub fn user_collection(&self, username: &str, page: PageNum) -> Option<WallpaperPage> {
        let req = self
            .guest_call(&self.api.user_wallpapers(username))
            .query(&[("page", page)]);
        settle("user collection", list(req))
    }

    pub fn user_followers(&self, username: &str, page: PageNum) -> Option<UserPage> {
        let req = self
            .guest_call(&self.api.followers(username))
            .query(&[("page", page)]);
        settle("followers", list(req))
    }

    pub fn user_following(&self, username: &str, page: PageNum) -> Option<UserPage> {
        let req = self
            .guest_call(&self.api.following(username))
            .query(&[("page", page)]);
        settle("following", list(req))
    }

    pub fn user_likes(&self, username: &str, page: PageNum) -> Option<WallpaperPage> {
        let req = self
            .guest_call(&self.api.likes(username))
            .query(&[("page", page)]);
        settle("user likes", list(req))
    }

    pub fn user_random_wallpaper(&self, username: &str) -> Option<Wallpaper> {
        let req = self.guest_call(&self.api.user_random_wallpaper(username));
        settle("user random wallpaper", one(req))
    }

    /// Lists wallpapers. `filter` is a [`SafeFilter`] or its string form; an
    /// unknown string yields `None` without touching the network.
    pub fn wallpapers<F>(&self, page: PageNum, filter: F) -> Option<WallpaperPage>
    where
        F: TryInto<SafeFilter>,
        F::Error: fmt::Display,
    {
        let filter: SafeFilter = checked(filter)?;
        let req = self
            .guest_call(&self.api.wallpapers())
            .query(&[("page", page)])
            .query(&[("safe_filter", <&str>::from(filter))]);
        settle("wallpapers", list(req))
    }

    /// Full resolution image URLs of one page of [`Client::wallpapers`].
    /// Wallpapers without a usable image are skipped.
    pub fn wallpaper_urls<F>(&self, page: PageNum, filter: F) -> Option<Vec<String>>
    where
        F: TryInto<SafeFilter>,
        F::Error: fmt::Display,
    {
        let page = self.wallpapers(page, filter)?;
        Some(
            page.into_iter()
                .filter_map(|w| w.image.map(|i| i.url().to_owned()))
                .collect(),
        )
    }

    pub fn random_wallpaper<F>(&self, filter: F) -> Option<Wallpaper>
    where
        F: TryInto<SafeFilter>,
        F::Error: fmt::Display,
    {
        let filter: SafeFilter = checked(filter)?;
        let req = self
            .guest_call(&self.api.random_wallpaper())
            .query(&[("safe_filter", <&str>::from(filter))]);
        settle("random wallpaper", one(req))
    }

    /// Whether `username` likes the wallpaper. `None` if the server couldn't
    /// answer.
    pub fn check_if_liked(&self, username: &str, id: WallpaperId) -> Option<bool> {
        let req = self
            .guest_call(&self.api.likes(username))
            .query(&[("wallpaper_id", id)]);
        let liked: Option<Vec<Value>> = settle("liked status", one(req));
        liked.map(|l| !l.is_empty())
    }

    /// Whether the wallpaper is in `username`'s synced collection.
    pub fn check_if_synced(&self, username: &str, id: WallpaperId) -> Option<bool> {
        let req = self
            .guest_call(&self.api.user_wallpapers(username))
            .query(&[("wallpaper_id", id)]);
        let synced: Option<Counted> = settle("synced status", finalize(req));
        synced.map(|s| s.count > 0)
    }

    pub fn follow_user(&self, username: &str) -> Outcome {
        self.act("follow", self.api.follow(username, Method::POST), None)
    }

    pub fn unfollow_user(&self, username: &str) -> Outcome {
        self.act("unfollow", self.api.follow(username, Method::DELETE), None)
    }

    /// Liking an already liked wallpaper (422) counts as success.
    pub fn like_wallpaper(&self, id: WallpaperId) -> Outcome {
        self.act(
            "like",
            self.api.like(id, Method::POST),
            Some(StatusCode::UNPROCESSABLE_ENTITY),
        )
    }

    /// Unliking a wallpaper that isn't liked (404) counts as success.
    pub fn unlike_wallpaper(&self, id: WallpaperId) -> Outcome {
        self.act(
            "unlike",
            self.api.like(id, Method::DELETE),
            Some(StatusCode::NOT_FOUND),
        )
    }

    /// Asks the server to sync the wallpaper to the user's Dropbox. Already
    /// synced (422) counts as success.
    pub fn sync_wallpaper(&self, id: WallpaperId) -> Outcome {
        self.act(
            "sync",
            self.api.selection(id, Method::POST),
            Some(StatusCode::UNPROCESSABLE_ENTITY),
        )
    }

    /// Removes the wallpaper from the user's Dropbox. Absent (404) counts as
    /// success.
    pub fn unsync_wallpaper(&self, id: WallpaperId) -> Outcome {
        self.act(
            "unsync",
            self.api.selection(id, Method::DELETE),
            Some(StatusCode::NOT_FOUND),
        )
    }

    /// Flags a wallpaper. `flag` is a [`Flag`] or one of `flag_safe`,
    /// `flag_not_safe`, `flag_deletion`.
    pub fn flag_wallpaper<F>(&self, id: WallpaperId, flag: F) -> Outcome
    where
        F: TryInto<Flag>,
        F::Error: fmt::Display,
    {
        match checked::<Flag, _>(flag) {
            Some(flag) => self.act("flag", self.api.flag(id, flag), None),
            None => Outcome::InvalidInput,
        }
    }
}
