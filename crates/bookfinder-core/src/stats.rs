use serde::Serialize;

use crate::models::{GoalProgress, ReadingStatus, goal_percent};
use crate::store::UserData;

/// Aggregates derived from progress records and ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingStats {
    pub books_completed: u32,
    pub books_reading: u32,
    /// `currentPage` summed over every progress record, whatever its status.
    pub pages_read: u64,
    /// `currentPage` summed over completed books only.
    pub pages_completed: u64,
    /// Mean of the non-zero ratings, 0 when nothing is rated.
    pub average_rating: f64,
}

impl UserData {
    /// Recompute reading statistics from the current state.
    pub fn reading_stats(&self) -> ReadingStats {
        let records = self.reading_progress.values();

        let mut books_completed = 0;
        let mut books_reading = 0;
        let mut pages_read = 0u64;
        let mut pages_completed = 0u64;
        for p in records {
            pages_read += u64::from(p.current_page);
            match p.status {
                ReadingStatus::Completed => {
                    books_completed += 1;
                    pages_completed += u64::from(p.current_page);
                }
                ReadingStatus::Reading => books_reading += 1,
                ReadingStatus::WantToRead | ReadingStatus::Paused => {}
            }
        }

        let rated: Vec<u8> = self.ratings.values().copied().filter(|r| *r > 0).collect();
        let average_rating = if rated.is_empty() {
            0.0
        } else {
            rated.iter().map(|r| f64::from(*r)).sum::<f64>() / rated.len() as f64
        };

        ReadingStats {
            books_completed,
            books_reading,
            pages_read,
            pages_completed,
            average_rating,
        }
    }

    /// Progress towards the goal for `year`, if one is set.
    pub fn goal_progress(&self, year: i32) -> Option<GoalProgress> {
        let goal = self.goal(year)?;
        let stats = self.reading_stats();
        Some(GoalProgress {
            year,
            books_done: stats.books_completed,
            target_books: goal.target_books,
            books_percent: goal_percent(
                u64::from(goal.target_books),
                u64::from(stats.books_completed),
            ),
            pages_done: stats.pages_read,
            target_pages: goal.target_pages,
            pages_percent: goal_percent(u64::from(goal.target_pages), stats.pages_read),
        })
    }
}
