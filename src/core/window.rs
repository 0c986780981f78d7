use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;

/// A closed date range [start, end] over which costs are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Rolling window of `days` days ending at `today` (inclusive).
    pub fn last_days(days: i64, today: NaiveDate) -> Result<Self, ValidationError> {
        if !(1..=365).contains(&days) {
            return Err(ValidationError::InvalidDays(days));
        }
        let start = today - Duration::days(days - 1);
        Ok(Self { start, end: today })
    }

    /// Calendar month window: first through last day of `year`-`month`.
    pub fn calendar_month(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonth(month));
        }
        // Unwraps are safe: day 1 of a validated month always exists.
        let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
        };
        Ok(Self {
            start,
            end: first_of_next - Duration::days(1),
        })
    }

    /// Parse a "YYYY-MM" label into a calendar month window.
    pub fn parse_month(label: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidMonthLabel(label.to_string());
        let (y, m) = label.split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        Self::calendar_month(year, month)
    }

    /// Number of distinct days covered by this closed range. Always >= 1.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The window of equal length immediately before this one.
    pub fn preceding(&self) -> Self {
        let len = self.days();
        let end = self.start - Duration::days(1);
        Self {
            start: end - Duration::days(len - 1),
            end,
        }
    }

    /// For a calendar-month window, the previous calendar month. For any
    /// other shape this falls back to the equal-length preceding window.
    pub fn preceding_month(&self) -> Self {
        let is_month = self.start.day() == 1
            && *self == Self::calendar_month(self.start.year(), self.start.month()).unwrap();
        if !is_month {
            return self.preceding();
        }
        let (year, month) = if self.start.month() == 1 {
            (self.start.year() - 1, 12)
        } else {
            (self.start.year(), self.start.month() - 1)
        };
        Self::calendar_month(year, month).unwrap()
    }

    pub fn label(&self) -> String {
        format!("{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_rejects_inverted_range() {
        let err = Window::new(date(2026, 3, 10), date(2026, 3, 1)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidWindow { .. }));
    }

    #[test]
    fn last_days_covers_exactly_n_days() {
        let w = Window::last_days(30, date(2026, 8, 30)).unwrap();
        assert_eq!(w.days(), 30);
        assert_eq!(w.start, date(2026, 8, 1));
        assert_eq!(w.end, date(2026, 8, 30));
    }

    #[test]
    fn last_days_validates_range() {
        let today = date(2026, 8, 30);
        assert!(matches!(
            Window::last_days(0, today),
            Err(ValidationError::InvalidDays(0))
        ));
        assert!(matches!(
            Window::last_days(366, today),
            Err(ValidationError::InvalidDays(366))
        ));
        assert!(Window::last_days(1, today).is_ok());
        assert!(Window::last_days(365, today).is_ok());
    }

    #[test]
    fn calendar_month_handles_leap_february() {
        let w = Window::calendar_month(2024, 2).unwrap();
        assert_eq!(w.days(), 29);
        assert_eq!(w.end, date(2024, 2, 29));

        let w = Window::calendar_month(2026, 2).unwrap();
        assert_eq!(w.days(), 28);
    }

    #[test]
    fn calendar_month_december_rolls_year() {
        let w = Window::calendar_month(2025, 12).unwrap();
        assert_eq!(w.end, date(2025, 12, 31));
    }

    #[test]
    fn calendar_month_rejects_bad_month() {
        assert!(matches!(
            Window::calendar_month(2026, 13),
            Err(ValidationError::InvalidMonth(13))
        ));
    }

    #[test]
    fn parse_month_label() {
        let w = Window::parse_month("2026-07").unwrap();
        assert_eq!(w.start, date(2026, 7, 1));
        assert_eq!(w.end, date(2026, 7, 31));
        assert!(Window::parse_month("202607").is_err());
        assert!(Window::parse_month("2026-xx").is_err());
    }

    #[test]
    fn preceding_is_contiguous_and_equal_length() {
        let w = Window::last_days(30, date(2026, 8, 30)).unwrap();
        let prev = w.preceding();
        assert_eq!(prev.days(), 30);
        assert_eq!(prev.end + Duration::days(1), w.start);
    }

    #[test]
    fn preceding_month_of_january() {
        let jan = Window::calendar_month(2026, 1).unwrap();
        let prev = jan.preceding_month();
        assert_eq!(prev, Window::calendar_month(2025, 12).unwrap());
    }

    #[test]
    fn preceding_month_of_rolling_window_keeps_length() {
        let w = Window::last_days(7, date(2026, 8, 30)).unwrap();
        assert_eq!(w.preceding_month(), w.preceding());
    }
}
