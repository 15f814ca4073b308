//! Type-ahead suggestions with a debounce.
//!
//! Each call to [`Suggester::suggest`] supersedes the previous one. A call
//! only fetches after the quiet period if nothing newer arrived, and only
//! publishes if it is still the latest when the response lands.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bookfinder_core::config::CatalogConfig;
use bookfinder_core::{BookRecord, SearchKind};
use tracing::{debug, warn};

use crate::source::{CatalogQuery, CatalogSource};

pub struct Suggester {
    source: Arc<dyn CatalogSource>,
    token: AtomicU64,
    debounce: Duration,
    min_chars: usize,
    limit: u32,
}

impl Suggester {
    pub fn new(source: Arc<dyn CatalogSource>, config: &CatalogConfig) -> Self {
        Self {
            source,
            token: AtomicU64::new(0),
            debounce: Duration::from_millis(config.suggestion_debounce_ms),
            min_chars: config.suggestion_min_chars,
            limit: config.suggestion_limit,
        }
    }

    /// Suggestions for `input`, or `None` if a newer call superseded this one.
    ///
    /// Input shorter than the minimum yields an empty list without a fetch.
    /// Catalog failures are logged and yield an empty list.
    pub async fn suggest(&self, input: &str, kind: SearchKind) -> Option<Vec<String>> {
        let token = self.token.fetch_add(1, Ordering::SeqCst) + 1;
        let input = input.trim();
        if input.chars().count() < self.min_chars {
            return Some(Vec::new());
        }

        tokio::time::sleep(self.debounce).await;
        if !self.is_current(token) {
            debug!(token, input, "suggestion superseded before fetch");
            return None;
        }

        let query = CatalogQuery::new(suggestion_kind(kind), input, self.limit);
        let result = self.source.search(&query).await;
        if !self.is_current(token) {
            debug!(token, input, "suggestion superseded after fetch");
            return None;
        }

        match result {
            Ok(books) => Some(suggestion_texts(&books, kind, self.limit as usize)),
            Err(e) => {
                warn!(error = %e, input, "suggestion fetch failed");
                Some(Vec::new())
            }
        }
    }

    fn is_current(&self, token: u64) -> bool {
        self.token.load(Ordering::SeqCst) == token
    }
}

/// Field searches keep their field; everything else goes through `q`.
fn suggestion_kind(kind: SearchKind) -> SearchKind {
    match kind {
        SearchKind::Title | SearchKind::Author | SearchKind::Subject => kind,
        SearchKind::Isbn | SearchKind::General => SearchKind::General,
    }
}

fn suggestion_text(book: &BookRecord, kind: SearchKind) -> &str {
    let fallback = book.title.as_str();
    match kind {
        SearchKind::Author => book.primary_author().unwrap_or(fallback),
        SearchKind::Subject => book.subject.first().map(String::as_str).unwrap_or(fallback),
        _ => fallback,
    }
}

pub fn suggestion_texts(books: &[BookRecord], kind: SearchKind, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for book in books {
        let text = suggestion_text(book, kind);
        if text.is_empty() || out.iter().any(|s| s == text) {
            continue;
        }
        out.push(text.to_string());
        if out.len() == limit {
            break;
        }
    }
    out
}
