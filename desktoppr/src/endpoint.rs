use crate::api::Flag;
use crate::model::WallpaperId;
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use url::Url;

type Result<T> = std::result::Result<T, url::ParseError>;
pub(crate) type SimpleEndpoint = (Method, Url);

#[derive(Debug, Clone)]
struct Version {
    prefix: Url,
}

impl Version {
    fn new(prefix: &str) -> Result<Self> {
        let prefix = Url::parse(prefix.trim_end_matches('/'))?;
        if prefix.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(Self { prefix })
    }

    // Segments are percent-encoded, so usernames can't escape their slot.
    fn req(&self, method: Method, segments: &[&str]) -> SimpleEndpoint {
        let mut url = self.prefix.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        (method, url)
    }

    fn get(&self, segments: &[&str]) -> SimpleEndpoint {
        self.req(Method::GET, segments)
    }

    fn post(&self, segments: &[&str]) -> SimpleEndpoint {
        self.req(Method::POST, segments)
    }
}

pub trait Endpoint {
    fn request(&self, client: &Client) -> RequestBuilder;
}

impl Endpoint for SimpleEndpoint {
    fn request(&self, client: &Client) -> RequestBuilder {
        client.request(self.0.clone(), self.1.clone())
    }
}

#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    v1: Version,
}

impl ApiEndpoint {
    pub fn with_base(base: &str) -> Result<Self> {
        Ok(Self {
            v1: Version::new(base)?,
        })
    }

    pub fn whoami(&self) -> SimpleEndpoint {
        self.v1.get(&["user", "whoami"])
    }

    pub fn user(&self, username: &str) -> SimpleEndpoint {
        self.v1.get(&["users", username])
    }

    pub fn user_wallpapers(&self, username: &str) -> SimpleEndpoint {
        self.v1.get(&["users", username, "wallpapers"])
    }

    pub fn user_random_wallpaper(&self, username: &str) -> SimpleEndpoint {
        self.v1.get(&["users", username, "wallpapers", "random"])
    }

    pub fn followers(&self, username: &str) -> SimpleEndpoint {
        self.v1.get(&["users", username, "followers"])
    }

    pub fn following(&self, username: &str) -> SimpleEndpoint {
        self.v1.get(&["users", username, "following"])
    }

    pub fn likes(&self, username: &str) -> SimpleEndpoint {
        self.v1.get(&["users", username, "likes"])
    }

    /// POST follows, DELETE unfollows.
    pub fn follow(&self, username: &str, method: Method) -> SimpleEndpoint {
        self.v1.req(method, &["users", username, "follow"])
    }

    pub fn like(&self, id: WallpaperId, method: Method) -> SimpleEndpoint {
        self.v1
            .req(method, &["user", "wallpapers", &id.to_string(), "like"])
    }

    pub fn selection(&self, id: WallpaperId, method: Method) -> SimpleEndpoint {
        self.v1
            .req(method, &["user", "wallpapers", &id.to_string(), "selection"])
    }

    pub fn wallpapers(&self) -> SimpleEndpoint {
        self.v1.get(&["wallpapers"])
    }

    pub fn random_wallpaper(&self) -> SimpleEndpoint {
        self.v1.get(&["wallpapers", "random"])
    }

    pub fn flag(&self, id: WallpaperId, flag: Flag) -> SimpleEndpoint {
        self.v1
            .post(&["wallpapers", &id.to_string(), flag.into()])
    }
}
