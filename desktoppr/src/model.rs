use serde::de::value::MapDeserializer;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_json::{Map, Value};
use serde_with::{DefaultOnError, DefaultOnNull, serde_as};
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub type WallpaperId = u64;
pub type PageNum = u32;

/// A JSON object as returned by the API, before any typing.
pub type Response = Map<String, Value>;

pub fn from_response<'de, T: Deserialize<'de>>(resp: Response) -> Result<T, serde_json::Error> {
    T::deserialize(MapDeserializer::new(resp.into_iter()))
}

fn parse_created(created_at: Option<&str>) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(created_at?, &Rfc3339).ok()
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub uploaded_count: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub followers_count: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub following_count: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub wallpapers_count: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub lifetime_member: bool,
    /// Keys this version doesn't know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn created(&self) -> Option<OffsetDateTime> {
        parse_created(self.created_at.as_deref())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        write!(
            f,
            ": {} wallpapers, {} followers, {} following",
            self.wallpapers_count, self.followers_count, self.following_count
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Safe,
    Pending,
    NotSafe,
}

/// Thumbnail or preview rendition. These are the only images that report
/// their own dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScaledImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Full resolution image. Its dimensions live on the owning [`Wallpaper`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FullImage {
    pub url: String,
    pub thumb: ScaledImage,
    pub preview: ScaledImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Image {
    Full(FullImage),
    Scaled(ScaledImage),
}

impl Image {
    pub fn url(&self) -> &str {
        match self {
            Image::Full(full) => &full.url,
            Image::Scaled(scaled) => &scaled.url,
        }
    }

    pub fn width(&self) -> Option<u32> {
        match self {
            Image::Full(_) => None,
            Image::Scaled(scaled) => Some(scaled.width),
        }
    }

    pub fn height(&self) -> Option<u32> {
        match self {
            Image::Full(_) => None,
            Image::Scaled(scaled) => Some(scaled.height),
        }
    }

    pub fn thumb(&self) -> Option<&ScaledImage> {
        match self {
            Image::Full(full) => Some(&full.thumb),
            Image::Scaled(_) => None,
        }
    }

    pub fn preview(&self) -> Option<&ScaledImage> {
        match self {
            Image::Full(full) => Some(&full.preview),
            Image::Scaled(_) => None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Image::Full(_))
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Image::Full(full) => write!(f, "full image {}", full.url),
            Image::Scaled(s) => write!(f, "{}x{} image {}", s.width, s.height, s.url),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Wallpaper {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub id: WallpaperId,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub width: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub height: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub review_state: Option<ReviewState>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub likes_count: u32,
    /// How many users hold this wallpaper in their collection.
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub user_count: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    // None once the uploading account has been deleted.
    #[serde(default)]
    pub uploader: Option<String>,
    // A null or partial image leaves the rest of the wallpaper readable.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Wallpaper {
    pub fn created(&self) -> Option<OffsetDateTime> {
        parse_created(self.created_at.as_deref())
    }

    pub fn is_safe(&self) -> bool {
        self.review_state == Some(ReviewState::Safe)
    }
}

impl fmt::Display for Wallpaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wallpaper {} ({}x{})", self.id, self.width, self.height)?;
        match &self.uploader {
            Some(uploader) => write!(f, " by {uploader}"),
            None => write!(f, " by a deleted account"),
        }
    }
}
