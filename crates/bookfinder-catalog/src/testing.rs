//! In-memory catalog for driving sessions, suggestions and recommendations in tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bookfinder_core::BookRecord;

use crate::error::{CatalogError, Result};
use crate::source::{CatalogQuery, CatalogSource};

#[derive(Default)]
pub struct FakeCatalog {
    responses: HashMap<String, Vec<BookRecord>>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    pub calls: Mutex<Vec<CatalogQuery>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, term: &str, books: Vec<BookRecord>) -> Self {
        self.responses.insert(term.to_string(), books);
        self
    }

    pub fn delay(mut self, term: &str, delay: Duration) -> Self {
        self.delays.insert(term.to_string(), delay);
        self
    }

    pub fn fail(mut self, term: &str) -> Self {
        self.failing.push(term.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn terms(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.term.clone())
            .collect()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, query: &CatalogQuery) -> Result<Vec<BookRecord>> {
        self.calls.lock().unwrap().push(query.clone());
        if let Some(delay) = self.delays.get(&query.term) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&query.term) {
            return Err(CatalogError::Status {
                url: format!("fake://{}", query.term),
                status: 500,
            });
        }
        let mut books = self.responses.get(&query.term).cloned().unwrap_or_default();
        books.truncate(query.limit as usize);
        Ok(books)
    }
}
