use async_trait::async_trait;
use bookfinder_core::{BookRecord, SearchKind};

use crate::error::Result;

/// One catalog query: which field, what term, how many results at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub kind: SearchKind,
    pub term: String,
    pub limit: u32,
}

impl CatalogQuery {
    pub fn new(kind: SearchKind, term: impl Into<String>, limit: u32) -> Self {
        Self {
            kind,
            term: term.into(),
            limit,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.term.trim().is_empty()
    }
}

/// A read-only book catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run a query and return the records verbatim, in catalog order.
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<BookRecord>>;

    /// Find a single record by its key.
    async fn lookup(&self, key: &str) -> Result<Option<BookRecord>> {
        let query = CatalogQuery::new(SearchKind::General, format!("key:{key}"), 1);
        let found = self.search(&query).await?;
        Ok(found.into_iter().find(|b| b.key == key))
    }
}
