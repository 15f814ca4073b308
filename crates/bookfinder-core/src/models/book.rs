use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── BookRecord ─────────────────────────────────────────────

/// A catalog search document, as returned by the Open Library search API.
///
/// Records are immutable snapshots: user collections copy them by value and
/// never edit their fields. Fields the catalog sends that are not modelled
/// here are kept in `extra` so a snapshot round-trips verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub key: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author_name: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publisher: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub language: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_i: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub isbn: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookRecord {
    /// Create a record with just a key and a title.
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.author_name = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.first_publish_year = Some(year);
        self
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subject = subjects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cover(mut self, cover_id: i64) -> Self {
        self.cover_i = Some(cover_id);
        self
    }

    /// First listed author, if any.
    pub fn primary_author(&self) -> Option<&str> {
        self.author_name.first().map(String::as_str)
    }

    /// Author line for listings: at most two names, ellipsis when truncated.
    pub fn display_authors(&self) -> String {
        match self.author_name.len() {
            0 => "Unknown Author".to_string(),
            1 | 2 => self.author_name.join(", "),
            _ => format!("{}...", self.author_name[..2].join(", ")),
        }
    }

    /// Cover image URL under `covers_base`, or `None` when the record has no cover.
    pub fn cover_url(&self, covers_base: &str, size: CoverSize) -> Option<String> {
        self.cover_i.map(|id| {
            format!(
                "{}/{id}-{}.jpg",
                covers_base.trim_end_matches('/'),
                size.as_str()
            )
        })
    }
}

// ─── CoverSize ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverSize {
    S,
    #[default]
    M,
    L,
}

impl CoverSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
        }
    }
}

impl std::fmt::Display for CoverSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CoverSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S" => Ok(Self::S),
            "M" => Ok(Self::M),
            "L" => Ok(Self::L),
            _ => Err(format!("Invalid cover size: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COVERS: &str = "https://covers.openlibrary.org/b/id";

    #[test]
    fn test_cover_url_sizes() {
        let book = BookRecord::new("/works/OL1W", "Dune").with_cover(240727);
        assert_eq!(
            book.cover_url(COVERS, CoverSize::M).as_deref(),
            Some("https://covers.openlibrary.org/b/id/240727-M.jpg")
        );
        assert_eq!(
            book.cover_url(&format!("{COVERS}/"), CoverSize::L).as_deref(),
            Some("https://covers.openlibrary.org/b/id/240727-L.jpg")
        );
    }

    #[test]
    fn test_no_cover_id_means_no_url() {
        let book = BookRecord::new("/works/OL1W", "Dune");
        assert!(book.cover_url(COVERS, CoverSize::S).is_none());
    }

    #[test]
    fn test_display_authors() {
        let none = BookRecord::new("k", "t");
        assert_eq!(none.display_authors(), "Unknown Author");

        let two = BookRecord::new("k", "t").with_authors(["A", "B"]);
        assert_eq!(two.display_authors(), "A, B");

        let three = BookRecord::new("k", "t").with_authors(["A", "B", "C"]);
        assert_eq!(three.display_authors(), "A, B...");
    }

    #[test]
    fn test_parses_search_doc_and_keeps_unknown_fields() {
        let doc = json!({
            "key": "/works/OL45804W",
            "title": "Fantastic Mr Fox",
            "author_name": ["Roald Dahl"],
            "first_publish_year": 1970,
            "cover_i": 6498519,
            "language": ["eng", "spa"],
            "edition_count": 42
        });

        let book: BookRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(book.title, "Fantastic Mr Fox");
        assert_eq!(book.primary_author(), Some("Roald Dahl"));
        assert_eq!(book.first_publish_year, Some(1970));
        assert_eq!(book.extra.get("edition_count"), Some(&json!(42)));

        let back = serde_json::to_value(&book).unwrap();
        assert_eq!(back["edition_count"], json!(42));
        assert!(back.get("isbn").is_none());
    }

    #[test]
    fn test_cover_size_from_str() {
        assert_eq!("l".parse::<CoverSize>().unwrap(), CoverSize::L);
        assert!("xl".parse::<CoverSize>().is_err());
    }
}
