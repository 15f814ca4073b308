use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    #[default]
    Yearly,
    Monthly,
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yearly => write!(f, "yearly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for GoalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yearly" => Ok(Self::Yearly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Invalid GoalKind: {s}")),
        }
    }
}

/// A reading goal; there is at most one per calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingGoal {
    #[serde(rename = "type", default)]
    pub kind: GoalKind,
    #[serde(default)]
    pub target_books: u32,
    #[serde(default)]
    pub target_pages: u32,
    pub start_date: DateTime<Utc>,
    pub year: i32,
}

impl ReadingGoal {
    /// A goal starting now, for the current year.
    pub fn for_current_year(kind: GoalKind, target_books: u32, target_pages: u32) -> Self {
        let now = Utc::now();
        Self {
            kind,
            target_books,
            target_pages,
            start_date: now,
            year: now.year(),
        }
    }
}

/// How far the reading stats are towards a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub year: i32,
    pub books_done: u32,
    pub target_books: u32,
    pub books_percent: u32,
    pub pages_done: u64,
    pub target_pages: u32,
    pub pages_percent: u32,
}

/// `min(round(current / target × 100), 100)`; 0 when there is no target.
pub fn goal_percent(target: u64, current: u64) -> u32 {
    if target == 0 {
        return 0;
    }
    let pct = (current as f64 / target as f64 * 100.0).round();
    pct.min(100.0) as u32
}
