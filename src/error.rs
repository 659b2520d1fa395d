use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Malformed weather data: {0}")]
    MalformedSnapshot(String),

    #[error("City list unavailable: {0}")]
    CityList(String),

    #[error("Location could not be determined")]
    LocationUnavailable,

    #[error("No Visual Crossing API key configured (use --api-key or set api_key in {0})")]
    MissingApiKey(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl Error {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            // a body that failed to decode will fail again
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let status = |status| Error::Status {
            url: "/timeline/Berlin".to_string(),
            status,
        };
        assert!(status(reqwest::StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(status(reqwest::StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(!status(reqwest::StatusCode::BAD_REQUEST).is_transient());
        assert!(!Error::MalformedSnapshot("temp".to_string()).is_transient());
        assert!(!Error::CityList("country not found".to_string()).is_transient());
    }

    #[test]
    fn test_builder_error_is_not_transient() {
        let err = reqwest::blocking::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        assert!(!Error::Http(err).is_transient());
    }
}
