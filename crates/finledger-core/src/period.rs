//! Month/year period the ledger is viewing

use chrono::{Datelike, Month, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A calendar month of a given year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Month number, 1..=12
    pub month: u32,
    pub year: i32,
}

impl Period {
    /// Create a period, rejecting months outside 1..=12
    pub fn new(month: u32, year: i32) -> LedgerResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidPeriod { month, year });
        }
        Ok(Self { month, year })
    }

    /// The period a timestamp falls in
    pub fn containing(date: &NaiveDateTime) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// Period of today's local date
    pub fn current() -> Self {
        Self::containing(&chrono::Local::now().naive_local())
    }

    pub fn from_month(month: Month, year: i32) -> Self {
        Self {
            month: month.number_from_month(),
            year,
        }
    }

    /// Check if a timestamp falls within this period
    pub fn contains(&self, date: &NaiveDateTime) -> bool {
        date.month() == self.month && date.year() == self.year
    }

    pub fn month_name(&self) -> &'static str {
        Month::try_from(self.month as u8)
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

/// Holds the period the user is viewing.
///
/// The year is part of the key even though nothing in the view changes it yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSelector {
    period: Period,
}

impl PeriodSelector {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Switch month within the current year. Returns true when the period changed.
    pub fn set_month(&mut self, month: Month) -> bool {
        self.set_period(Period::from_month(month, self.period.year))
    }

    /// Returns true when the period changed
    pub fn set_period(&mut self, period: Period) -> bool {
        if self.period == period {
            return false;
        }
        log::debug!("period {} -> {}", self.period, period);
        self.period = period;
        true
    }
}

impl Default for PeriodSelector {
    fn default() -> Self {
        Self::new(Period::current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_validates_month() {
        assert!(Period::new(1, 2025).is_ok());
        assert!(Period::new(12, 2025).is_ok());
        assert_eq!(
            Period::new(0, 2025),
            Err(LedgerError::InvalidPeriod { month: 0, year: 2025 })
        );
        assert!(Period::new(13, 2025).is_err());
    }

    #[test]
    fn test_contains_checks_year() {
        let period = Period::new(10, 2025).unwrap();
        assert!(period.contains(&at(2025, 10, 31)));
        assert!(!period.contains(&at(2024, 10, 15)));
        assert!(!period.contains(&at(2025, 11, 1)));
        assert_eq!(Period::containing(&at(2024, 2, 29)), Period::new(2, 2024).unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::new(10, 2025).unwrap().to_string(), "October 2025");
    }

    #[test]
    fn test_selector_set_month_keeps_year() {
        let mut selector = PeriodSelector::new(Period::new(10, 2025).unwrap());
        assert!(selector.set_month(Month::March));
        assert_eq!(selector.period(), Period::new(3, 2025).unwrap());
        assert!(!selector.set_month(Month::March));
    }

    #[test]
    fn test_selector_year_is_part_of_key() {
        let mut selector = PeriodSelector::new(Period::new(10, 2025).unwrap());
        assert!(selector.set_period(Period::new(10, 2024).unwrap()));
        assert_eq!(selector.period().year, 2024);
    }
}
