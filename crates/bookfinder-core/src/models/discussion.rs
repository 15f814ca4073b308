use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment in a book's discussion thread. Threads are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionComment {
    pub comment: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

impl DiscussionComment {
    pub fn new(comment: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            user: user.into(),
            timestamp: Utc::now(),
        }
    }
}
