use thiserror::Error;

/// The one message users see for any catalog failure.
pub const USER_MESSAGE: &str = "Error searching for books. Please try again.";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid URL {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Failures are not categorised for the user.
    pub fn user_message(&self) -> &'static str {
        USER_MESSAGE
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
