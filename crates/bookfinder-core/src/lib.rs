pub mod account;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod models;
pub mod share;
pub mod stats;
pub mod storage;
pub mod store;

pub use account::{Account, Accounts, LoginError, SignupError, SignupErrors, SignupForm};
pub use config::AppConfig;
pub use error::{CoreError, ExitCode, Result};
pub use export::ExportSnapshot;
pub use filter::{FilterOptions, SortBy};
pub use models::*;
pub use share::{SharePlatform, share_text, share_url};
pub use stats::ReadingStats;
pub use storage::{DocumentStore, Persisted, SearchHistory, Theme, names};
pub use store::{RECENTLY_VIEWED_CAP, UserData, UserDataStore};
