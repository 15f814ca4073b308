use async_trait::async_trait;
use bookfinder_core::BookRecord;
use bookfinder_core::config::CatalogConfig;
use reqwest::Url;
use serde::Deserialize;
use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::http::{HttpClient, parse_base_url};
use crate::source::{CatalogQuery, CatalogSource};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<BookRecord>,
}

/// Client for the Open Library search endpoint.
pub struct OpenLibraryCatalog {
    client: HttpClient,
    base_url: String,
}

impl OpenLibraryCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        Self::with_base_url(&config.base_url, &config.user_agent)
    }

    pub fn with_base_url(base_url: &str, user_agent: &str) -> Result<Self> {
        parse_base_url(base_url)?;
        Ok(Self {
            client: HttpClient::new(user_agent)?,
            base_url: base_url.to_string(),
        })
    }

    /// `<base>/search.json?<param>=<term>&limit=<N>`
    pub fn search_url(&self, query: &CatalogQuery) -> Result<Url> {
        let mut url = parse_base_url(&self.base_url)?;
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| CatalogError::InvalidUrl(self.base_url.clone()))?;
            segs.pop_if_empty();
            segs.push("search.json");
        }
        url.query_pairs_mut()
            .append_pair(query.kind.query_param(), query.term.trim())
            .append_pair("limit", &query.limit.to_string());
        Ok(url)
    }
}

#[async_trait]
impl CatalogSource for OpenLibraryCatalog {
    fn name(&self) -> &'static str {
        "openlibrary"
    }

    async fn search(&self, query: &CatalogQuery) -> Result<Vec<BookRecord>> {
        if query.is_blank() {
            return Ok(Vec::new());
        }
        let url = self.search_url(query)?;
        match self.client.get_json::<SearchResponse>(&url).await {
            Ok(resp) => Ok(resp.docs),
            Err(e) => {
                warn!(error = %e, kind = %query.kind, term = %query.term, "catalog search failed");
                Err(e)
            }
        }
    }
}
