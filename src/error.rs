use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Decode(serde_json::Error),
    Auth(String),
    RemoteStatus(StatusCode),
    NotLoggedIn,
    ConfigurationTooShort { len: usize },
    InvalidTemperature(f64),
    InvalidInterval,
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::Auth(msg) => write!(f, "login rejected: {msg}"),
            Error::RemoteStatus(status) => write!(f, "portal returned status {status}"),
            Error::NotLoggedIn => write!(f, "not logged in"),
            Error::ConfigurationTooShort { len } => write!(
                f,
                "configuration has {len} entries, need at least {}",
                crate::types::MIN_CONFIGURATION_LEN
            ),
            Error::InvalidTemperature(c) => write!(
                f,
                "target temperature {c} outside {}..={}",
                crate::bridge::MIN_TARGET_TEMPERATURE,
                crate::bridge::MAX_TARGET_TEMPERATURE
            ),
            Error::InvalidInterval => write!(f, "refresh interval must be non-zero"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
