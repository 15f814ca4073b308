use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;

/// Fixed names of the persisted documents.
pub mod names {
    pub const USER_DATA: &str = "user-data";
    pub const THEME: &str = "theme";
    pub const SEARCH_HISTORY: &str = "search-history";
    pub const SIDEBAR: &str = "sidebar";
    pub const PROFILE: &str = "profile";
    pub const ACCOUNTS: &str = "accounts";
}

/// A directory holding one JSON document per logical store: `{dir}/{name}.json`.
///
/// Documents are read whole and written whole; there are no partial writes
/// and no migrations.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).exists()
    }

    /// Load a document, falling back to `T::default()` if it was never written.
    ///
    /// A document that exists but does not parse is an error.
    pub fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.path_of(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let contents = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Serialize and write a whole document.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_of(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        debug!(document = name, path = %path.display(), "document written");
        Ok(path)
    }

    /// Delete a document if present.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Open a document as a [`Persisted`] value.
    pub fn open<T>(&self, name: &'static str) -> Result<Persisted<T>>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let value = self.load(name)?;
        Ok(Persisted {
            docs: self.clone(),
            name,
            value,
        })
    }
}

/// An in-memory value mirrored to its document after every change.
#[derive(Debug)]
pub struct Persisted<T> {
    docs: DocumentStore,
    name: &'static str,
    value: T,
}

impl<T> Persisted<T> {
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: Serialize + Clone> Persisted<T> {
    /// Apply `f` and write the full document.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.try_update(|value| Ok(f(value)))
    }

    /// Apply a fallible `f` to a copy of the value. The copy replaces the
    /// value only once it has been written; on any error both stay as they were.
    pub fn try_update<R>(&mut self, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        let mut next = self.value.clone();
        let out = f(&mut next)?;
        self.docs.save(self.name, &next)?;
        self.value = next;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_document_loads_default() {
        let dir = TempDir::new().unwrap();
        let docs = DocumentStore::new(dir.path());
        let value: Vec<String> = docs.load("nothing").unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let docs = DocumentStore::new(dir.path().join("nested"));
        docs.save(names::SIDEBAR, &true).unwrap();
        assert!(docs.exists(names::SIDEBAR));
        let open: bool = docs.load(names::SIDEBAR).unwrap();
        assert!(open);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let docs = DocumentStore::new(dir.path());
        fs::write(docs.path_of(names::USER_DATA), "{ not json").unwrap();
        let err = docs.load::<Vec<u32>>(names::USER_DATA).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }

    #[test]
    fn test_persisted_writes_on_every_update() {
        let dir = TempDir::new().unwrap();
        let docs = DocumentStore::new(dir.path());

        let mut counter = docs.open::<u32>("counter").unwrap();
        counter.update(|n| *n += 1).unwrap();
        counter.update(|n| *n += 1).unwrap();

        let reloaded: u32 = docs.load("counter").unwrap();
        assert_eq!(reloaded, 2);
    }

    #[test]
    fn test_failed_try_update_does_not_write() {
        let dir = TempDir::new().unwrap();
        let docs = DocumentStore::new(dir.path());

        let mut value = docs.open::<u32>("value").unwrap();
        let res: Result<()> = value.try_update(|_| Err(CoreError::ValidationError("no".into())));
        assert!(res.is_err());
        assert!(!docs.exists("value"));
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let docs = DocumentStore::new(&blocker);

        let mut counter = docs.open::<u32>("counter").unwrap();
        assert!(counter.update(|n| *n += 1).is_err());
        assert_eq!(*counter.get(), 0);
    }
}
