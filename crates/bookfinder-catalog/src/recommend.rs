use std::collections::HashSet;
use std::sync::Arc;

use bookfinder_core::config::RecommendationConfig;
use bookfinder_core::{BookRecord, SearchKind, UserData};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::Result;
use crate::source::{CatalogQuery, CatalogSource};

/// Subject-based recommendations drawn from the user's saved and listed books.
pub struct Recommender {
    source: Arc<dyn CatalogSource>,
    config: RecommendationConfig,
}

impl Recommender {
    pub fn new(source: Arc<dyn CatalogSource>, config: RecommendationConfig) -> Self {
        Self { source, config }
    }

    pub async fn recommend(&self, data: &UserData) -> Result<Vec<BookRecord>> {
        let owned = data.collected_books();
        if owned.is_empty() {
            return self.popular().await;
        }

        let owned_keys: HashSet<&str> = owned.iter().map(|b| b.key.as_str()).collect();
        let subjects = distinct_subjects(&owned, self.config.max_subjects);
        debug!(subjects = subjects.len(), "querying recommendation subjects");

        let queries: Vec<CatalogQuery> = subjects
            .iter()
            .map(|s| CatalogQuery::new(SearchKind::Subject, s.as_str(), self.config.per_subject_limit))
            .collect();
        let responses = join_all(queries.iter().map(|q| self.source.search(q))).await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for (query, response) in queries.iter().zip(responses) {
            let books = match response {
                Ok(books) => books,
                Err(e) => {
                    warn!(error = %e, subject = %query.term, "skipping recommendation subject");
                    continue;
                }
            };
            for book in books {
                if owned_keys.contains(book.key.as_str()) || !seen.insert(book.key.clone()) {
                    continue;
                }
                out.push(book);
            }
        }
        out.truncate(self.config.max_results);
        Ok(out)
    }

    async fn popular(&self) -> Result<Vec<BookRecord>> {
        let query = CatalogQuery::new(
            SearchKind::General,
            self.config.fallback_query.as_str(),
            self.config.max_results as u32,
        );
        self.source.search(&query).await
    }
}

/// Subjects in first-seen order across the given books.
fn distinct_subjects(books: &[&BookRecord], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    books
        .iter()
        .flat_map(|b| b.subject.iter())
        .filter(|s| seen.insert(s.as_str()))
        .take(max)
        .cloned()
        .collect()
}
