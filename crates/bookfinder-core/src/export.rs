use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ReadingList, SavedBook};
use crate::store::UserData;

/// Point-in-time dump of the user's lists and saved books.
///
/// There is no import counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub reading_lists: BTreeMap<String, ReadingList>,
    pub saved_books: Vec<SavedBook>,
    pub export_date: DateTime<Utc>,
}

impl ExportSnapshot {
    /// `reading-lists-YYYY-MM-DD.json`, dated by the export time.
    pub fn file_name(&self) -> String {
        format!("reading-lists-{}.json", self.export_date.format("%Y-%m-%d"))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot into `dir` under [`file_name`](Self::file_name).
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_json_pretty()?)?;
        Ok(path)
    }
}

impl UserData {
    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            reading_lists: self.reading_lists.clone(),
            saved_books: self.saved_books.clone(),
            export_date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookRecord;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_export_contains_lists_and_saved_books() {
        let mut data = UserData::default();
        let id = data.create_list("To read").unwrap();
        data.add_to_list(&id, BookRecord::new("/works/1", "Dune")).unwrap();
        data.add_to_list(&id, BookRecord::new("/works/2", "Emma")).unwrap();
        data.save(BookRecord::new("/works/3", "Ulysses"));
        data.rate("/works/3", 5).unwrap();

        let snapshot = data.export_snapshot();
        assert_eq!(snapshot.reading_lists.len(), 1);
        assert_eq!(snapshot.reading_lists[&id].books.len(), 2);
        assert_eq!(snapshot.saved_books.len(), 1);

        let v = serde_json::to_value(&snapshot).unwrap();
        assert!(v.get("exportDate").is_some());
        assert!(v.get("ratings").is_none());
    }

    #[test]
    fn test_file_name_uses_export_date() {
        let snapshot = ExportSnapshot {
            reading_lists: BTreeMap::new(),
            saved_books: Vec::new(),
            export_date: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
        };
        assert_eq!(snapshot.file_name(), "reading-lists-2024-03-09.json");
    }

    #[test]
    fn test_write_to_dir() {
        let dir = TempDir::new().unwrap();
        let snapshot = UserData::default().export_snapshot();
        let path = snapshot.write_to_dir(dir.path()).unwrap();
        let back: ExportSnapshot =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back.export_date, snapshot.export_date);
    }
}
