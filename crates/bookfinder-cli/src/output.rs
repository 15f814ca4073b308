use std::time::Instant;

use anyhow::Result;
use bookfinder_catalog::CatalogError;
use bookfinder_core::{CoreError, ExitCode, LoginError, SignupError};
use serde_json::{Value, json};

/// Errors raised by the binary itself.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgs(String),
}

/// Where command results go: plain text, or `{status, data, meta}` envelopes.
pub struct Output {
    pub json: bool,
    start: Instant,
}

impl Output {
    pub fn new(json: bool, start: Instant) -> Self {
        Self { json, start }
    }

    pub fn duration_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    pub fn ok(&self, data: Value) -> Result<()> {
        print_json(&json!({
            "status": "ok",
            "data": data,
            "meta": { "duration_ms": self.duration_ms() }
        }))
    }

    /// Report a failed command on stdout (JSON) or stderr (text).
    pub fn error(&self, failure: &Failure) {
        if self.json {
            let mut body = json!({
                "status": "error",
                "error": failure.kind,
                "message": failure.message,
                "meta": { "duration_ms": self.duration_ms() }
            });
            if let Some(fields) = &failure.fields {
                body["fields"] = fields.clone();
            }
            if let Ok(text) = serde_json::to_string_pretty(&body) {
                println!("{text}");
            }
        } else {
            eprintln!("Error: {}", failure.message);
        }
    }
}

pub fn print_json(val: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

/// A command error reduced to what the user sees.
#[derive(Debug)]
pub struct Failure {
    pub code: i32,
    pub kind: &'static str,
    pub message: String,
    pub fields: Option<Value>,
}

impl Failure {
    fn new(code: ExitCode, kind: &'static str, message: String) -> Self {
        Self {
            code: code as i32,
            kind,
            message,
            fields: None,
        }
    }
}

pub fn classify(err: &anyhow::Error) -> Failure {
    if let Some(e) = err.downcast_ref::<CliError>() {
        return match e {
            CliError::NotFound(m) => Failure::new(ExitCode::NotFound, "not_found", m.clone()),
            CliError::InvalidArgs(m) => Failure::new(ExitCode::InvalidArgs, "invalid_args", m.clone()),
        };
    }
    if let Some(e) = err.downcast_ref::<CatalogError>() {
        return match e {
            CatalogError::InvalidUrl(_) => Failure::new(ExitCode::GeneralError, "config", e.to_string()),
            _ => Failure::new(ExitCode::NetworkError, "network", e.user_message().to_string()),
        };
    }
    if let Some(e) = err.downcast_ref::<CoreError>() {
        let kind = match e {
            CoreError::ListNotFound(_) => "not_found",
            CoreError::InvalidRating(_) | CoreError::ValidationError(_) | CoreError::Account(_) => {
                "invalid_args"
            }
            _ => "error",
        };
        return Failure::new(e.exit_code(), kind, e.to_string());
    }
    if let Some(e) = err.downcast_ref::<LoginError>() {
        return Failure::new(ExitCode::InvalidArgs, "login_failed", e.to_string());
    }
    if let Some(e) = err.downcast_ref::<SignupError>() {
        return match e {
            SignupError::Invalid(errors) => {
                let mut f = Failure::new(ExitCode::InvalidArgs, "invalid_args", errors.to_string());
                f.fields = serde_json::to_value(errors).ok();
                f
            }
            SignupError::Core(core) => Failure::new(core.exit_code(), "error", core.to_string()),
        };
    }
    Failure::new(ExitCode::GeneralError, "error", format!("{err:#}"))
}
