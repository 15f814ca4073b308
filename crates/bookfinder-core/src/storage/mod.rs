pub mod documents;
pub mod prefs;

pub use documents::{DocumentStore, Persisted, names};
pub use prefs::{SEARCH_HISTORY_CAP, SearchHistory, Theme};
