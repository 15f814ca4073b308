//! Client-side filtering and sorting of catalog results.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::BookRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Keep the catalog's order.
    #[default]
    Relevance,
    Newest,
    Oldest,
    Title,
    /// Highest user rating first; unrated books last.
    Rating,
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relevance => write!(f, "relevance"),
            Self::Newest => write!(f, "newest"),
            Self::Oldest => write!(f, "oldest"),
            Self::Title => write!(f, "title"),
            Self::Rating => write!(f, "rating"),
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "newest" | "new" => Ok(Self::Newest),
            "oldest" | "old" => Ok(Self::Oldest),
            "title" => Ok(Self::Title),
            "rating" => Ok(Self::Rating),
            _ => Err(format!("Invalid SortBy: {s}")),
        }
    }
}

/// Filters applied to a result set. `None` (or a blank string) disables a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// Language code such as `eng`.
    pub language: Option<String>,
    /// Case-insensitive substring matched against subject tags.
    pub subject_contains: Option<String>,
    pub sort_by: SortBy,
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.year_from.is_none()
            && self.year_to.is_none()
            && non_blank(&self.language).is_none()
            && non_blank(&self.subject_contains).is_none()
            && self.sort_by == SortBy::Relevance
    }

    /// Whether `book` passes every active filter.
    pub fn matches(&self, book: &BookRecord) -> bool {
        if let Some(from) = self.year_from {
            if !book.first_publish_year.is_some_and(|y| y >= from) {
                return false;
            }
        }
        if let Some(to) = self.year_to {
            if !book.first_publish_year.is_some_and(|y| y <= to) {
                return false;
            }
        }
        if let Some(lang) = non_blank(&self.language) {
            if !book.language.iter().any(|l| l == lang) {
                return false;
            }
        }
        if let Some(needle) = non_blank(&self.subject_contains) {
            let needle = needle.to_lowercase();
            if !book
                .subject
                .iter()
                .any(|s| s.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }

    /// Filter then sort `books`. `ratings` feeds [`SortBy::Rating`].
    pub fn apply(&self, books: &[BookRecord], ratings: &BTreeMap<String, u8>) -> Vec<BookRecord> {
        let mut out: Vec<BookRecord> = books.iter().filter(|b| self.matches(b)).cloned().collect();
        match self.sort_by {
            SortBy::Relevance => {}
            SortBy::Newest => out.sort_by(|a, b| newest_first(a, b)),
            SortBy::Oldest => out.sort_by(|a, b| oldest_first(a, b)),
            SortBy::Title => out.sort_by(|a, b| by_title(a, b)),
            SortBy::Rating => out.sort_by(|a, b| {
                let ra = ratings.get(&a.key).copied().unwrap_or(0);
                let rb = ratings.get(&b.key).copied().unwrap_or(0);
                rb.cmp(&ra)
            }),
        }
        out
    }
}

// Missing years sort after every known year.
fn newest_first(a: &BookRecord, b: &BookRecord) -> Ordering {
    match (a.first_publish_year, b.first_publish_year) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// Missing years sort before every known year.
fn oldest_first(a: &BookRecord, b: &BookRecord) -> Ordering {
    a.first_publish_year.cmp(&b.first_publish_year)
}

fn by_title(a: &BookRecord, b: &BookRecord) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}
