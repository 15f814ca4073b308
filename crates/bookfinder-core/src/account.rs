//! Local accounts.
//!
//! Accounts live on this device only; there is no server and no session
//! token. Passwords are stored as salted argon2 PHC strings, never as text.

use std::collections::BTreeMap;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;
use rand_core::OsRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::error::{CoreError, Result};
use crate::models::{ProfileUpdate, UserProfile};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo: String,
    /// argon2 PHC string.
    pub password_hash: String,
}

impl Account {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            email: self.email.clone(),
            photo: self.photo.clone(),
        }
    }

    pub fn profile_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            photo: Some(self.photo.clone()),
        }
    }
}

/// Signup form input.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Field name → message for every field that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignupErrors(pub BTreeMap<&'static str, String>);

impl SignupErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    fn add(&mut self, field: &'static str, message: &str) {
        self.0.insert(field, message.to_string());
    }
}

impl std::fmt::Display for SignupErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

impl SignupForm {
    pub fn validate(&self) -> SignupErrors {
        let mut errors = SignupErrors::default();

        if self.full_name.trim().is_empty() {
            errors.add("fullName", "Full name is required");
        }

        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.add("email", "Email is invalid");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 6 characters");
        }

        if self.password != self.confirm_password {
            errors.add("confirmPassword", "Passwords do not match");
        }

        errors
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("No account found with this email")]
    NotFound,

    #[error("Invalid password")]
    InvalidPassword,
}

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("{0}")]
    Invalid(SignupErrors),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// All accounts on this device, keyed by email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accounts {
    by_email: BTreeMap<String, Account>,
}

impl Accounts {
    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    pub fn get(&self, email: &str) -> Option<&Account> {
        self.by_email.get(&email_key(email))
    }

    /// Validate the form and register a new account.
    pub fn signup(&mut self, form: &SignupForm) -> std::result::Result<Account, SignupError> {
        let mut errors = form.validate();
        let email = form.email.trim().to_string();
        let key = email_key(&email);
        if errors.get("email").is_none() && self.by_email.contains_key(&key) {
            errors.add("email", "An account with this email already exists");
        }
        if !errors.is_empty() {
            return Err(SignupError::Invalid(errors));
        }

        let account = Account {
            name: form.full_name.trim().to_string(),
            email,
            photo: String::new(),
            password_hash: hash_password(&form.password)?,
        };
        self.by_email.insert(key, account.clone());
        info!(email = %account.email, "account created");
        Ok(account)
    }

    /// Check credentials against the stored hash.
    pub fn login(&self, email: &str, password: &str) -> std::result::Result<&Account, LoginError> {
        let account = self.get(email).ok_or(LoginError::NotFound)?;
        if !verify_password(password, &account.password_hash) {
            return Err(LoginError::InvalidPassword);
        }
        info!(email = %account.email, "signed in");
        Ok(account)
    }
}

/// Emails match case-insensitively.
fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash a password into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| CoreError::Account(format!("argon2 error: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, pw: &str, confirm: &str) -> SignupForm {
        SignupForm {
            full_name: name.into(),
            email: email.into(),
            password: pw.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn test_validation_reports_each_field() {
        let errors = form("", "not-an-email", "abc", "abd").validate();
        assert_eq!(errors.get("fullName"), Some("Full name is required"));
        assert_eq!(errors.get("email"), Some("Email is invalid"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
    }

    #[test]
    fn test_missing_fields() {
        let errors = form(" ", "", "", "").validate();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert!(errors.get("confirmPassword").is_none());
    }

    #[test]
    fn test_signup_then_login() {
        let mut accounts = Accounts::default();
        let account = accounts
            .signup(&form("Alex Reader", "alex@example.com", "secret1", "secret1"))
            .unwrap();
        assert_ne!(account.password_hash, "secret1");
        assert!(account.password_hash.starts_with("$argon2"));

        let logged_in = accounts.login("alex@example.com", "secret1").unwrap();
        assert_eq!(logged_in.name, "Alex Reader");
        assert_eq!(logged_in.profile().email, "alex@example.com");
    }

    #[test]
    fn test_login_errors() {
        let mut accounts = Accounts::default();
        accounts
            .signup(&form("Alex", "alex@example.com", "secret1", "secret1"))
            .unwrap();

        assert_eq!(
            accounts.login("sam@example.com", "secret1").unwrap_err(),
            LoginError::NotFound
        );
        assert_eq!(
            accounts.login("alex@example.com", "wrong-pass").unwrap_err(),
            LoginError::InvalidPassword
        );
        assert_eq!(
            LoginError::NotFound.to_string(),
            "No account found with this email"
        );
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut accounts = Accounts::default();
        accounts
            .signup(&form("Alex", "alex@example.com", "secret1", "secret1"))
            .unwrap();
        let err = accounts
            .signup(&form("Other", "alex@example.com", "secret2", "secret2"))
            .unwrap_err();
        assert!(matches!(err, SignupError::Invalid(e) if e.get("email").is_some()));
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn test_email_case_is_ignored() {
        let mut accounts = Accounts::default();
        accounts
            .signup(&form("Alex", "Alex@Example.com", "secret1", "secret1"))
            .unwrap();
        let err = accounts
            .signup(&form("Other", "alex@example.com", "secret2", "secret2"))
            .unwrap_err();
        assert!(matches!(err, SignupError::Invalid(e) if e.get("email").is_some()));
        assert_eq!(accounts.len(), 1);

        let account = accounts.login(" ALEX@example.COM ", "secret1").unwrap();
        assert_eq!(account.email, "Alex@Example.com");
        assert!(accounts.get("alex@example.com").is_some());
    }

    #[test]
    fn test_accounts_serialize_without_plaintext() {
        let mut accounts = Accounts::default();
        accounts
            .signup(&form("Alex", "alex@example.com", "hunter22", "hunter22"))
            .unwrap();
        let json = serde_json::to_string(&accounts).unwrap();
        assert!(!json.contains("hunter22"));
        let back: Accounts = serde_json::from_str(&json).unwrap();
        assert!(back.login("alex@example.com", "hunter22").is_ok());
    }
}
