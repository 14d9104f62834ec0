use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Year/month selection carried from the caller into every dashboard call.
/// Absent fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl PeriodFilter {
    pub fn new(year: Option<i32>, month: Option<u32>) -> Self {
        Self { year, month }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none()
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.year.is_none_or(|y| date.year() == y) && self.month.is_none_or(|m| date.month() == m)
    }
}

impl std::fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.year, self.month) {
            (Some(y), Some(m)) => write!(f, "{:04}-{:02}", y, m),
            (Some(y), None) => write!(f, "{:04}", y),
            (None, Some(m)) => write!(f, "month {:02} of every year", m),
            (None, None) => write!(f, "all time"),
        }
    }
}

/// A `(year, month)` grouping for the monthly series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bucket {
    pub year: i32,
    pub month: u32,
}

impl Bucket {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
