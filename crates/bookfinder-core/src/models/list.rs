use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::models::book::BookRecord;

/// A saved book: the catalog snapshot plus the time it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBook {
    #[serde(flatten)]
    pub book: BookRecord,
    pub saved_at: DateTime<Utc>,
}

/// A named, user-ordered collection of book snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub books: Vec<BookRecord>,
    pub created_at: DateTime<Utc>,
}

impl ReadingList {
    /// Create an empty list with a fresh ULID id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            name: name.into(),
            books: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn contains(&self, book_key: &str) -> bool {
        self.books.iter().any(|b| b.key == book_key)
    }

    /// Insert or replace `book`; a replaced book moves to the end.
    pub fn insert(&mut self, book: BookRecord) {
        self.books.retain(|b| b.key != book.key);
        self.books.push(book);
    }

    pub fn remove(&mut self, book_key: &str) {
        self.books.retain(|b| b.key != book_key);
    }
}
