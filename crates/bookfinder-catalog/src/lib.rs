//! Catalog side of bookfinder: the Open Library client and everything that
//! drives it (search session, suggestions, recommendations).

pub mod error;
pub mod http;
pub mod openlibrary;
pub mod recommend;
pub mod session;
pub mod source;
pub mod suggest;

#[cfg(test)]
mod testing;

pub use error::{CatalogError, Result, USER_MESSAGE};
pub use openlibrary::OpenLibraryCatalog;
pub use recommend::Recommender;
pub use session::{SearchOutcome, SearchSession, SearchState};
pub use source::{CatalogQuery, CatalogSource};
pub use suggest::Suggester;
