#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("reqwest error")]
    Request(#[from] reqwest::Error),
    #[error("json deserialization failed")]
    Json(#[from] serde_json::Error),
    #[error("url parse failed")]
    Url(#[from] url::ParseError),
    #[error("failed to read config")]
    Io(#[from] std::io::Error),
    #[error("not found")]
    NotFound,
    #[error("api error {0}: {1}")]
    Desktoppr(u16, String),
    #[error("not authenticated")]
    Unauthed,
    #[error("unknown safe filter {0:?}, expected safe, include_pending or all")]
    InvalidFilter(String),
    #[error("unknown flag {0:?}, expected flag_safe, flag_not_safe or flag_deletion")]
    InvalidFlag(String),
}

pub type Result<T> = std::result::Result<T, Error>;
