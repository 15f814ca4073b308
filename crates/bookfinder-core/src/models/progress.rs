use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    #[default]
    WantToRead,
    Reading,
    Paused,
    Completed,
}

impl ReadingStatus {
    /// Label shown next to a book's progress bar.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WantToRead => "Want to Read",
            Self::Reading => "Currently Reading",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WantToRead => write!(f, "want-to-read"),
            Self::Reading => write!(f, "reading"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want-to-read" => Ok(Self::WantToRead),
            "reading" => Ok(Self::Reading),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid ReadingStatus: {s}")),
        }
    }
}

/// Reading progress for one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    #[serde(default)]
    pub current_page: u32,

    #[serde(default)]
    pub total_pages: u32,

    #[serde(default)]
    pub percentage: u32,

    #[serde(default)]
    pub status: ReadingStatus,

    pub last_updated: DateTime<Utc>,
}

impl ReadingProgress {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            current_page: 0,
            total_pages: 0,
            percentage: 0,
            status: ReadingStatus::default(),
            last_updated: now,
        }
    }

    /// Merge `update` into `previous` (or a fresh record), recompute the
    /// percentage and stamp `now`.
    pub fn merged(previous: Option<&Self>, update: &ProgressUpdate, now: DateTime<Utc>) -> Self {
        let mut next = previous.cloned().unwrap_or_else(|| Self::empty(now));
        if let Some(page) = update.current_page {
            next.current_page = page;
        }
        if let Some(total) = update.total_pages {
            next.total_pages = total;
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        next.percentage = percentage(next.current_page, next.total_pages);
        next.last_updated = now;
        next
    }
}

/// Partial progress fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub status: Option<ReadingStatus>,
}

impl ProgressUpdate {
    pub fn pages(current_page: u32, total_pages: u32) -> Self {
        Self {
            current_page: Some(current_page),
            total_pages: Some(total_pages),
            status: None,
        }
    }

    pub fn status(status: ReadingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// `round(current / total × 100)`, or 0 when `total` is 0.
pub fn percentage(current: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(current) / f64::from(total) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(50, 100), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(10, 0), 0);
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let now = Utc::now();
        let first = ReadingProgress::merged(None, &ProgressUpdate::pages(50, 200), now);
        assert_eq!(first.percentage, 25);
        assert_eq!(first.status, ReadingStatus::WantToRead);

        let second =
            ReadingProgress::merged(Some(&first), &ProgressUpdate::status(ReadingStatus::Reading), now);
        assert_eq!(second.current_page, 50);
        assert_eq!(second.total_pages, 200);
        assert_eq!(second.percentage, 25);
        assert_eq!(second.status, ReadingStatus::Reading);
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&ReadingStatus::WantToRead).unwrap();
        assert_eq!(json, "\"want-to-read\"");
        assert_eq!("paused".parse::<ReadingStatus>().unwrap(), ReadingStatus::Paused);
        assert!("done".parse::<ReadingStatus>().is_err());
    }
}
