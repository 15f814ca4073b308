//! Search results as the user sees them.
//!
//! Every search takes a ticket from a generation counter. When a response
//! arrives after a newer search has started, it is discarded instead of
//! overwriting the newer results.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bookfinder_core::{BookRecord, FilterOptions, SearchKind};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::source::{CatalogQuery, CatalogSource};

/// Visible state of the search view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchState {
    pub query: Option<String>,
    pub kind: SearchKind,
    pub loading: bool,
    /// Everything the catalog returned for the current query.
    pub all_books: Vec<BookRecord>,
    /// `all_books` after filters and sorting.
    pub books: Vec<BookRecord>,
    pub filters: FilterOptions,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank query; nothing was sent.
    Skipped,
    /// A newer search started while this one was in flight.
    Stale,
    /// Results were stored.
    Fresh { total: usize, shown: usize },
}

pub struct SearchSession {
    source: Arc<dyn CatalogSource>,
    limit: u32,
    generation: AtomicU64,
    state: Mutex<SearchState>,
}

impl SearchSession {
    pub fn new(source: Arc<dyn CatalogSource>, limit: u32) -> Self {
        Self {
            source,
            limit,
            generation: AtomicU64::new(0),
            state: Mutex::new(SearchState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SearchState {
        self.lock().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Run a search. `ratings` feeds the rating sort.
    ///
    /// A failed search that is still current records the generic error
    /// message in the state and returns the error.
    pub async fn search(
        &self,
        term: &str,
        kind: SearchKind,
        ratings: &BTreeMap<String, u8>,
    ) -> Result<SearchOutcome> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(SearchOutcome::Skipped);
        }

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock();
            state.query = Some(term.to_string());
            state.kind = kind;
            state.loading = true;
            state.error = None;
            state.all_books.clear();
            state.books.clear();
        }

        let query = CatalogQuery::new(kind, term, self.limit);
        let result = self.source.search(&query).await;

        if self.generation() != ticket {
            debug!(ticket, current = self.generation(), term, "discarding stale search response");
            return Ok(SearchOutcome::Stale);
        }

        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(books) => {
                state.books = state.filters.apply(&books, ratings);
                state.all_books = books;
                Ok(SearchOutcome::Fresh {
                    total: state.all_books.len(),
                    shown: state.books.len(),
                })
            }
            Err(e) => {
                warn!(error = %e, source = self.source.name(), "search failed");
                state.error = Some(e.user_message().to_string());
                Err(e)
            }
        }
    }

    /// Replace the filters and re-apply them to the stored results.
    pub fn set_filters(&self, filters: FilterOptions, ratings: &BTreeMap<String, u8>) -> usize {
        let mut state = self.lock();
        state.books = filters.apply(&state.all_books, ratings);
        state.filters = filters;
        state.books.len()
    }

    pub fn clear_filters(&self, ratings: &BTreeMap<String, u8>) -> usize {
        self.set_filters(FilterOptions::default(), ratings)
    }
}
