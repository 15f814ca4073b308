use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};

/// The single local user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    /// Profile picture as a `data:` URL; empty when unset.
    #[serde(default)]
    pub photo: String,
}

/// Fields to change on the profile; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
}

impl UserProfile {
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(photo) = update.photo {
            self.photo = photo;
        }
    }

    /// Name to attribute comments to.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Anonymous"
        } else {
            &self.name
        }
    }

    pub fn is_signed_in(&self) -> bool {
        !self.email.is_empty()
    }
}

/// Encode image bytes as a `data:` URL.
pub fn photo_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", B64.encode(bytes))
}

/// Guess an image MIME type from a file extension.
pub fn image_mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}
