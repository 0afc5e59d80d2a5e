//! Canonical calendar month used by the dues ledger
//!
//! Clients send months as `MM-YYYY`, the ledger stores `YYYY-MM`.
//! Both forms are parsed into [`DuesMonth`] at the boundary; everything
//! past that point works with the typed value and only formats it back to
//! `YYYY-MM` when talking to the database.

use crate::error::{AppError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;

/// A year + month pair, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DuesMonth {
    year: i32,
    month: u32,
}

impl DuesMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::validation(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(AppError::validation(format!(
                "Year must be between {} and {}, got {}",
                MIN_YEAR, MAX_YEAR, year
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// All twelve months of `year`, January first
    pub fn months_of_year(year: i32) -> Result<Vec<Self>> {
        (1..=12).map(|month| Self::new(year, month)).collect()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };

        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// A month has elapsed once its last day is strictly before `today`
    pub fn is_elapsed(&self, today: NaiveDate) -> bool {
        self.last_day() < today
    }

    /// The month `count` months before this one
    pub fn minus_months(&self, count: u32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) - count as i32;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for DuesMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for DuesMonth {
    type Err = AppError;

    /// Accepts `YYYY-MM` (storage form) as well as `MM-YYYY` / `M-YYYY`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::validation(format!("Invalid month '{}', expected MM-YYYY", s));

        let trimmed = s.trim();
        let (left, right) = trimmed.split_once('-').ok_or_else(invalid)?;

        let (year_part, month_part) = match (left.len(), right.len()) {
            (4, 1..=2) => (left, right),
            (1..=2, 4) => (right, left),
            _ => return Err(invalid()),
        };

        if !year_part.chars().all(|c| c.is_ascii_digit())
            || !month_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year_part.parse().map_err(|_| invalid())?;
        let month: u32 = month_part.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

impl TryFrom<String> for DuesMonth {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DuesMonth> for String {
    fn from(value: DuesMonth) -> Self {
        value.to_string()
    }
}
