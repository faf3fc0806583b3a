//! Core domain types for Quantifying reports.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::QuantifyingError;

// ---------------------------------------------------------------------------
// Quarter
// ---------------------------------------------------------------------------

/// A calendar quarter, the reporting period that namespaces data and reports.
///
/// Rendered and parsed as `YYYYQn` (e.g. `2024Q1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Build a quarter, rejecting quarter numbers outside `1..=4`.
    pub fn new(year: i32, quarter: u8) -> Result<Self, QuantifyingError> {
        if !(1..=4).contains(&quarter) {
            return Err(QuantifyingError::parse(format!(
                "quarter must be between 1 and 4, got {quarter}"
            )));
        }
        Ok(Self { year, quarter })
    }

    /// The quarter containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }

    /// The quarter containing today's date in UTC.
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// The quarter immediately before this one.
    pub fn previous(self) -> Self {
        if self.quarter == 1 {
            Self {
                year: self.year - 1,
                quarter: 4,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter - 1,
            }
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn quarter(self) -> u8 {
        self.quarter
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl std::str::FromStr for Quarter {
    type Err = QuantifyingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        static QUARTER_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^(\d{4})Q([1-4])$").expect("valid regex"));

        let caps = QUARTER_RE.captures(s.trim()).ok_or_else(|| {
            QuantifyingError::parse(format!("invalid quarter '{s}': expected YYYYQn"))
        })?;

        let year = caps[1]
            .parse()
            .map_err(|e| QuantifyingError::parse(format!("invalid year in '{s}': {e}")))?;
        let quarter = caps[2]
            .parse()
            .map_err(|e| QuantifyingError::parse(format!("invalid quarter in '{s}': {e}")))?;

        Self::new(year, quarter)
    }
}

impl TryFrom<String> for Quarter {
    type Error = QuantifyingError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quarter> for String {
    fn from(value: Quarter) -> Self {
        value.to_string()
    }
}
