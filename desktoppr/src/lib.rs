#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Blocking client for the Desktoppr wallpaper API.
//!
//! Network-facing calls never return errors: lookups give `None` and
//! privileged calls give an [`Outcome`], with the details going to the `log`
//! facade.

pub mod api;
pub mod client;
pub mod config;
mod endpoint;
mod error;
pub mod model;
pub mod page;

pub use api::{Flag, Outcome, SafeFilter};
pub use client::{AuthedState, Client};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{
    FullImage, Image, PageNum, Response, ReviewState, ScaledImage, User, Wallpaper, WallpaperId,
};
pub use page::{Page, Pagination, UserPage, WallpaperPage};
pub use reqwest;
