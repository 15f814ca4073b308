//! The user data store: every piece of user-authored state and the only
//! place it may be changed.
//!
//! [`UserData`] is the plain serializable state with the mutation rules.
//! [`UserDataStore`] owns a `UserData` and writes the whole document after
//! every successful mutation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::models::{
    BookRecord, DiscussionComment, ProgressUpdate, ReadingGoal, ReadingList, ReadingProgress,
    SavedBook,
};
use crate::storage::{DocumentStore, Persisted, names};

/// Maximum number of recently viewed books kept.
pub const RECENTLY_VIEWED_CAP: usize = 20;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

// ─── UserData ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserData {
    pub ratings: BTreeMap<String, u8>,
    pub saved_books: Vec<SavedBook>,
    pub reading_lists: BTreeMap<String, ReadingList>,
    pub reading_progress: BTreeMap<String, ReadingProgress>,
    pub recently_viewed: Vec<BookRecord>,
    pub reading_goals: BTreeMap<i32, ReadingGoal>,
    pub discussions: BTreeMap<String, Vec<DiscussionComment>>,
}

impl UserData {
    // ─── Ratings ───────────────────────────────────────────

    /// Set the rating for a book, replacing any previous one.
    pub fn rate(&mut self, book_key: &str, rating: u8) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(CoreError::InvalidRating(rating));
        }
        self.ratings.insert(book_key.to_string(), rating);
        Ok(())
    }

    /// The book's rating, or 0 when unrated.
    pub fn rating(&self, book_key: &str) -> u8 {
        self.ratings.get(book_key).copied().unwrap_or(0)
    }

    // ─── Saved books ───────────────────────────────────────

    pub fn save(&mut self, book: BookRecord) {
        self.save_at(book, Utc::now());
    }

    /// Save a snapshot; an existing entry with the same key is replaced.
    pub fn save_at(&mut self, book: BookRecord, saved_at: DateTime<Utc>) {
        self.saved_books.retain(|s| s.book.key != book.key);
        self.saved_books.push(SavedBook { book, saved_at });
    }

    pub fn unsave(&mut self, book_key: &str) {
        self.saved_books.retain(|s| s.book.key != book_key);
    }

    pub fn is_saved(&self, book_key: &str) -> bool {
        self.saved_books.iter().any(|s| s.book.key == book_key)
    }

    pub fn saved_book(&self, book_key: &str) -> Option<&SavedBook> {
        self.saved_books.iter().find(|s| s.book.key == book_key)
    }

    /// Saved books in the order they were (last) saved.
    pub fn saved_books(&self) -> &[SavedBook] {
        &self.saved_books
    }

    // ─── Reading lists ─────────────────────────────────────

    /// Create an empty list and return its id.
    pub fn create_list(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "reading list name must not be empty".to_string(),
            ));
        }
        let list = ReadingList::new(name);
        let id = list.id.clone();
        self.reading_lists.insert(id.clone(), list);
        Ok(id)
    }

    pub fn list(&self, list_id: &str) -> Option<&ReadingList> {
        self.reading_lists.get(list_id)
    }

    pub fn reading_lists(&self) -> &BTreeMap<String, ReadingList> {
        &self.reading_lists
    }

    fn list_mut(&mut self, list_id: &str) -> Result<&mut ReadingList> {
        self.reading_lists
            .get_mut(list_id)
            .ok_or_else(|| CoreError::ListNotFound(list_id.to_string()))
    }

    pub fn add_to_list(&mut self, list_id: &str, book: BookRecord) -> Result<()> {
        self.list_mut(list_id)?.insert(book);
        Ok(())
    }

    pub fn remove_from_list(&mut self, list_id: &str, book_key: &str) -> Result<()> {
        self.list_mut(list_id)?.remove(book_key);
        Ok(())
    }

    pub fn delete_list(&mut self, list_id: &str) -> Result<ReadingList> {
        self.reading_lists
            .remove(list_id)
            .ok_or_else(|| CoreError::ListNotFound(list_id.to_string()))
    }

    /// Lists in creation order.
    pub fn lists_by_creation(&self) -> Vec<&ReadingList> {
        let mut lists: Vec<_> = self.reading_lists.values().collect();
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        lists
    }

    // ─── Progress ──────────────────────────────────────────

    pub fn update_progress(&mut self, book_key: &str, update: ProgressUpdate) -> &ReadingProgress {
        self.update_progress_at(book_key, update, Utc::now())
    }

    pub fn update_progress_at(
        &mut self,
        book_key: &str,
        update: ProgressUpdate,
        now: DateTime<Utc>,
    ) -> &ReadingProgress {
        let next = ReadingProgress::merged(self.reading_progress.get(book_key), &update, now);
        self.reading_progress.insert(book_key.to_string(), next);
        &self.reading_progress[book_key]
    }

    pub fn progress(&self, book_key: &str) -> Option<&ReadingProgress> {
        self.reading_progress.get(book_key)
    }

    // ─── Recently viewed ───────────────────────────────────

    /// Put `book` at the front, removing an older copy and trimming to the cap.
    pub fn add_to_recently_viewed(&mut self, book: BookRecord) {
        self.recently_viewed.retain(|b| b.key != book.key);
        self.recently_viewed.insert(0, book);
        self.recently_viewed.truncate(RECENTLY_VIEWED_CAP);
    }

    pub fn recently_viewed(&self) -> &[BookRecord] {
        &self.recently_viewed
    }

    // ─── Goals ─────────────────────────────────────────────

    pub fn set_goal(&mut self, goal: ReadingGoal) {
        self.reading_goals.insert(goal.year, goal);
    }

    pub fn goal(&self, year: i32) -> Option<&ReadingGoal> {
        self.reading_goals.get(&year)
    }

    pub fn goals(&self) -> &BTreeMap<i32, ReadingGoal> {
        &self.reading_goals
    }

    // ─── Discussions ───────────────────────────────────────

    pub fn add_discussion_comment(&mut self, book_key: &str, comment: DiscussionComment) {
        self.discussions
            .entry(book_key.to_string())
            .or_default()
            .push(comment);
    }

    pub fn discussions(&self, book_key: &str) -> &[DiscussionComment] {
        self.discussions
            .get(book_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // ─── Derived ───────────────────────────────────────────

    /// Every book the user has saved or put on a list, unique by key.
    pub fn collected_books(&self) -> Vec<&BookRecord> {
        let mut seen = std::collections::HashSet::new();
        self.saved_books
            .iter()
            .map(|s| &s.book)
            .chain(self.reading_lists.values().flat_map(|l| l.books.iter()))
            .filter(|b| seen.insert(b.key.as_str()))
            .collect()
    }
}

// ─── UserDataStore ─────────────────────────────────────────

/// [`UserData`] bound to its document; every mutation is written through.
#[derive(Debug)]
pub struct UserDataStore {
    inner: Persisted<UserData>,
}

impl UserDataStore {
    pub fn open(docs: &DocumentStore) -> Result<Self> {
        let inner = docs.open::<UserData>(names::USER_DATA)?;
        debug!(
            saved = inner.get().saved_books.len(),
            lists = inner.get().reading_lists.len(),
            "user data loaded"
        );
        Ok(Self { inner })
    }

    pub fn data(&self) -> &UserData {
        self.inner.get()
    }

    pub fn rate(&mut self, book_key: &str, rating: u8) -> Result<()> {
        self.inner.try_update(|d| d.rate(book_key, rating))
    }

    pub fn save(&mut self, book: BookRecord) -> Result<()> {
        self.inner.update(|d| d.save(book))
    }

    pub fn unsave(&mut self, book_key: &str) -> Result<()> {
        self.inner.update(|d| d.unsave(book_key))
    }

    pub fn create_list(&mut self, name: &str) -> Result<String> {
        self.inner.try_update(|d| d.create_list(name))
    }

    pub fn add_to_list(&mut self, list_id: &str, book: BookRecord) -> Result<()> {
        self.inner.try_update(|d| d.add_to_list(list_id, book))
    }

    pub fn remove_from_list(&mut self, list_id: &str, book_key: &str) -> Result<()> {
        self.inner.try_update(|d| d.remove_from_list(list_id, book_key))
    }

    pub fn delete_list(&mut self, list_id: &str) -> Result<ReadingList> {
        self.inner.try_update(|d| d.delete_list(list_id))
    }

    pub fn update_progress(
        &mut self,
        book_key: &str,
        update: ProgressUpdate,
    ) -> Result<ReadingProgress> {
        self.inner
            .update(|d| d.update_progress(book_key, update).clone())
    }

    pub fn add_to_recently_viewed(&mut self, book: BookRecord) -> Result<()> {
        self.inner.update(|d| d.add_to_recently_viewed(book))
    }

    pub fn set_goal(&mut self, goal: ReadingGoal) -> Result<()> {
        self.inner.update(|d| d.set_goal(goal))
    }

    pub fn add_discussion_comment(
        &mut self,
        book_key: &str,
        comment: DiscussionComment,
    ) -> Result<()> {
        self.inner
            .update(|d| d.add_discussion_comment(book_key, comment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalKind, ReadingStatus};
    use chrono::Duration;
    use tempfile::TempDir;

    fn book(key: &str) -> BookRecord {
        BookRecord::new(key, format!("Book {key}"))
    }

    #[test]
    fn test_save_then_unsave() {
        let mut data = UserData::default();
        data.save(book("/works/1"));
        assert!(data.is_saved("/works/1"));
        data.unsave("/works/1");
        assert!(!data.is_saved("/works/1"));
    }

    #[test]
    fn test_resave_replaces_and_later_saved_at_wins() {
        let mut data = UserData::default();
        let first = Utc::now();
        let second = first + Duration::seconds(5);

        data.save_at(book("/works/1"), first);
        data.save_at(book("/works/1"), second);

        assert_eq!(data.saved_books.len(), 1);
        assert_eq!(data.saved_book("/works/1").unwrap().saved_at, second);
    }

    #[test]
    fn test_rating_roundtrip_and_unrated_is_zero() {
        let mut data = UserData::default();
        for r in 1..=5 {
            data.rate("/works/1", r).unwrap();
            assert_eq!(data.rating("/works/1"), r);
        }
        assert_eq!(data.rating("/works/unrated"), 0);
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let mut data = UserData::default();
        assert!(matches!(data.rate("/works/1", 0), Err(CoreError::InvalidRating(0))));
        assert!(matches!(data.rate("/works/1", 6), Err(CoreError::InvalidRating(6))));
        assert_eq!(data.rating("/works/1"), 0);
    }

    #[test]
    fn test_progress_percentage() {
        let mut data = UserData::default();
        data.update_progress("/works/1", ProgressUpdate::pages(50, 100));
        assert_eq!(data.progress("/works/1").unwrap().percentage, 50);
        assert!(data.progress("/works/2").is_none());
    }

    #[test]
    fn test_progress_merge_stamps_last_updated() {
        let mut data = UserData::default();
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(1);
        data.update_progress_at("/works/1", ProgressUpdate::pages(10, 40), t0);
        let p = data.update_progress_at("/works/1", ProgressUpdate::status(ReadingStatus::Reading), t1);
        assert_eq!(p.percentage, 25);
        assert_eq!(p.last_updated, t1);
        assert_eq!(p.status, ReadingStatus::Reading);
    }

    #[test]
    fn test_recently_viewed_cap_and_move_to_front() {
        let mut data = UserData::default();
        for i in 0..25 {
            data.add_to_recently_viewed(book(&format!("/works/{i}")));
        }
        assert_eq!(data.recently_viewed().len(), RECENTLY_VIEWED_CAP);
        assert_eq!(data.recently_viewed()[0].key, "/works/24");
        assert_eq!(data.recently_viewed()[19].key, "/works/5");

        data.add_to_recently_viewed(book("/works/10"));
        assert_eq!(data.recently_viewed().len(), RECENTLY_VIEWED_CAP);
        assert_eq!(data.recently_viewed()[0].key, "/works/10");
        assert_eq!(
            data.recently_viewed().iter().filter(|b| b.key == "/works/10").count(),
            1
        );
    }

    #[test]
    fn test_lists_are_set_like_and_unknown_id_errors() {
        let mut data = UserData::default();
        let id = data.create_list("  Summer  ").unwrap();
        assert_eq!(data.list(&id).unwrap().name, "Summer");

        data.add_to_list(&id, book("/works/1")).unwrap();
        data.add_to_list(&id, book("/works/1")).unwrap();
        assert_eq!(data.list(&id).unwrap().books.len(), 1);

        data.remove_from_list(&id, "/works/1").unwrap();
        assert!(data.list(&id).unwrap().books.is_empty());

        assert!(matches!(
            data.add_to_list("missing", book("/works/1")),
            Err(CoreError::ListNotFound(_))
        ));
        assert!(matches!(
            data.remove_from_list("missing", "/works/1"),
            Err(CoreError::ListNotFound(_))
        ));
        assert!(data.list("missing").is_none());
    }

    #[test]
    fn test_empty_list_name_rejected() {
        let mut data = UserData::default();
        assert!(matches!(data.create_list("   "), Err(CoreError::ValidationError(_))));
        assert!(data.reading_lists().is_empty());
    }

    #[test]
    fn test_goal_replaced_per_year() {
        let mut data = UserData::default();
        let mut goal = ReadingGoal::for_current_year(GoalKind::Yearly, 10, 0);
        goal.year = 2025;
        data.set_goal(goal.clone());
        goal.target_books = 30;
        data.set_goal(goal);

        assert_eq!(data.goals().len(), 1);
        assert_eq!(data.goal(2025).unwrap().target_books, 30);
    }

    #[test]
    fn test_discussions_append_in_order() {
        let mut data = UserData::default();
        data.add_discussion_comment("/works/1", DiscussionComment::new("first", "Alex"));
        data.add_discussion_comment("/works/1", DiscussionComment::new("second", "Sam"));

        let thread = data.discussions("/works/1");
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].comment, "first");
        assert_eq!(thread[1].user, "Sam");
        assert!(data.discussions("/works/2").is_empty());
    }

    #[test]
    fn test_collected_books_dedups() {
        let mut data = UserData::default();
        data.save(book("/works/1"));
        let id = data.create_list("L").unwrap();
        data.add_to_list(&id, book("/works/1")).unwrap();
        data.add_to_list(&id, book("/works/2")).unwrap();
        assert_eq!(data.collected_books().len(), 2);
    }

    #[test]
    fn test_store_persists_every_mutation() {
        let dir = TempDir::new().unwrap();
        let docs = DocumentStore::new(dir.path());

        let list_id = {
            let mut store = UserDataStore::open(&docs).unwrap();
            store.save(book("/works/1")).unwrap();
            store.rate("/works/1", 4).unwrap();
            let id = store.create_list("Favourites").unwrap();
            store.add_to_list(&id, book("/works/2")).unwrap();
            store
                .update_progress("/works/1", ProgressUpdate::pages(30, 60))
                .unwrap();
            id
        };

        let reopened = UserDataStore::open(&docs).unwrap();
        let data = reopened.data();
        assert!(data.is_saved("/works/1"));
        assert_eq!(data.rating("/works/1"), 4);
        assert_eq!(data.list(&list_id).unwrap().books.len(), 1);
        assert_eq!(data.progress("/works/1").unwrap().percentage, 50);
    }

    #[test]
    fn test_store_rejected_mutation_leaves_document_alone() {
        let dir = TempDir::new().unwrap();
        let docs = DocumentStore::new(dir.path());
        let mut store = UserDataStore::open(&docs).unwrap();

        assert!(store.add_to_list("nope", book("/works/1")).is_err());
        assert!(!docs.exists(names::USER_DATA));
    }

    #[test]
    fn test_store_unchanged_when_write_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "").unwrap();
        let docs = DocumentStore::new(&blocker);
        let mut store = UserDataStore::open(&docs).unwrap();

        assert!(store.save(book("/works/1")).is_err());
        assert!(!store.data().is_saved("/works/1"));

        assert!(store.rate("/works/1", 4).is_err());
        assert_eq!(store.data().rating("/works/1"), 0);
        assert_eq!(store.data(), &UserData::default());
    }

    #[test]
    fn test_document_uses_camel_case_keys() {
        let mut data = UserData::default();
        data.save(book("/works/1"));
        let v = serde_json::to_value(&data).unwrap();
        assert!(v.get("savedBooks").is_some());
        assert!(v.get("readingLists").is_some());
        assert!(v.get("recentlyViewed").is_some());
    }
}
