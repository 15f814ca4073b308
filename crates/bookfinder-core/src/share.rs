use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::models::BookRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePlatform {
    Twitter,
    Facebook,
    Linkedin,
    Reddit,
}

impl SharePlatform {
    pub const ALL: [SharePlatform; 4] = [Self::Twitter, Self::Facebook, Self::Linkedin, Self::Reddit];
}

impl std::fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Twitter => write!(f, "twitter"),
            Self::Facebook => write!(f, "facebook"),
            Self::Linkedin => write!(f, "linkedin"),
            Self::Reddit => write!(f, "reddit"),
        }
    }
}

impl std::str::FromStr for SharePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "twitter" => Ok(Self::Twitter),
            "facebook" => Ok(Self::Facebook),
            "linkedin" => Ok(Self::Linkedin),
            "reddit" => Ok(Self::Reddit),
            _ => Err(format!("Invalid SharePlatform: {s}")),
        }
    }
}

/// `Currently reading "<title>" by <first author>`.
pub fn share_text(book: &BookRecord) -> String {
    match book.primary_author() {
        Some(author) => format!("Currently reading \"{}\" by {author}", book.title),
        None => format!("Currently reading \"{}\"", book.title),
    }
}

/// Share link for `platform` pointing at `url`.
pub fn share_url(platform: SharePlatform, book: &BookRecord, url: &str) -> String {
    let text = share_text(book);
    let (text, url) = (encode(&text), encode(url));
    match platform {
        SharePlatform::Twitter => {
            format!("https://twitter.com/intent/tweet?text={text}&url={url}")
        }
        SharePlatform::Facebook => {
            format!("https://www.facebook.com/sharer/sharer.php?u={url}&quote={text}")
        }
        SharePlatform::Linkedin => {
            format!("https://www.linkedin.com/sharing/share-offsite/?url={url}&title={text}")
        }
        SharePlatform::Reddit => format!("https://reddit.com/submit?url={url}&title={text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_text() {
        let with_author = BookRecord::new("/works/1", "Dune").with_authors(["Frank Herbert"]);
        assert_eq!(share_text(&with_author), "Currently reading \"Dune\" by Frank Herbert");
        let anon = BookRecord::new("/works/2", "Beowulf");
        assert_eq!(share_text(&anon), "Currently reading \"Beowulf\"");
    }

    #[test]
    fn test_share_urls_are_encoded() {
        let book = BookRecord::new("/works/1", "Dune").with_authors(["Frank Herbert"]);
        let url = share_url(SharePlatform::Reddit, &book, "https://openlibrary.org/works/1");
        assert!(url.starts_with("https://reddit.com/submit?url=https%3A%2F%2Fopenlibrary.org"));
        assert!(url.contains("title=Currently%20reading"));
        assert!(!url.contains(' '));
    }
}
