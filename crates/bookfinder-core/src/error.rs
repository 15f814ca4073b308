use thiserror::Error;

/// All errors that can occur in bookfinder-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Reading list not found: {0}")]
    ListNotFound(String),

    #[error("Invalid rating {0}: ratings must be between 1 and 5")]
    InvalidRating(u8),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Account error: {0}")]
    Account(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Exit codes used by the `bookfinder` binary.
#[repr(i32)]
pub enum ExitCode {
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    NetworkError = 6,
}

impl CoreError {
    /// Exit code the CLI should use when this error ends a command.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ListNotFound(_) => ExitCode::NotFound,
            Self::InvalidRating(_) | Self::ValidationError(_) | Self::Account(_) => {
                ExitCode::InvalidArgs
            }
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
