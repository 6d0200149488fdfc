//! Wall-clock access and the `DD.MM.YYYY HH:MM:SS` date format used in every data file.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;
use std::sync::Mutex;

/// Format of every persisted timestamp.
pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Date-only form accepted for range bounds.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Source of "now" - enables deterministic tests.
pub trait Clock: Send + Sync {
    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Returns the current time formatted as `DD.MM.YYYY HH:MM:SS`.
    fn now_string(&self) -> String {
        format_date_time(self.now())
    }
}

/// Clock backed by the operating system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Creates a clock from a `DD.MM.YYYY HH:MM:SS` string.
    pub fn at(text: &str) -> Option<Self> {
        parse_date_time(text).map(Self::new)
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.lock().map(|guard| *guard).unwrap_or_default()
    }
}

/// Formats a timestamp as `DD.MM.YYYY HH:MM:SS`.
pub fn format_date_time(value: NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

/// Parses `DD.MM.YYYY HH:MM:SS`, or a bare `DD.MM.YYYY` as midnight.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, DATE_FORMAT).ok().map(|d| d.and_time(NaiveTime::MIN)))
}

/// Parses an inclusive upper bound; a bare date covers the whole day.
pub fn parse_upper_bound(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(value) = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT) {
        return Some(value);
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
}

/// Orders two stored timestamps chronologically.
///
/// Falls back to plain string order when either side does not parse, which
/// keeps legacy or hand-edited records comparable.
pub fn compare_date_times(a: &str, b: &str) -> Ordering {
    match (parse_date_time(a), parse_date_time(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Inclusive date window used by discount validity and report filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    start: String,
    end: String,
    bounds: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl DateWindow {
    /// Creates a window from two stored date strings.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        let start = start.into();
        let end = end.into();
        let bounds = parse_date_time(&start).zip(parse_upper_bound(&end));
        Self { start, end, bounds }
    }

    /// Returns true if `moment` lies within `[start, end]`.
    pub fn contains(&self, moment: &str) -> bool {
        match (self.bounds, parse_date_time(moment)) {
            (Some((start, end)), Some(moment)) => start <= moment && moment <= end,
            _ => self.start.as_str() <= moment && moment <= self.end.as_str(),
        }
    }

    /// Returns true if `moment` lies within the window.
    pub fn contains_time(&self, moment: NaiveDateTime) -> bool {
        match self.bounds {
            Some((start, end)) => start <= moment && moment <= end,
            None => self.contains(&format_date_time(moment)),
        }
    }

    /// Returns true if the window is well-formed and `start < end`.
    pub fn is_ordered(&self) -> bool {
        match self.bounds {
            Some((start, end)) => start < end,
            None => self.start < self.end,
        }
    }

    /// Human-readable `start - end` label.
    pub fn label(&self) -> String {
        format!("{} - {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> NaiveDateTime {
        parse_date_time(text).unwrap()
    }

    #[test]
    fn test_format_round_trip() {
        let value = at("05.03.2024 07:08:09");
        assert_eq!(format_date_time(value), "05.03.2024 07:08:09");
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        assert_eq!(at("05.03.2024"), at("05.03.2024 00:00:00"));
    }

    #[test]
    fn test_parse_upper_bound_covers_day() {
        assert_eq!(parse_upper_bound("05.03.2024"), Some(at("05.03.2024 23:59:59")));
        assert_eq!(parse_upper_bound("05.03.2024 10:00:00"), Some(at("05.03.2024 10:00:00")));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_date_time("yesterday").is_none());
        assert!(parse_date_time("32.01.2024 00:00:00").is_none());
    }

    #[test]
    fn test_compare_is_chronological_across_months() {
        // Lexicographically "31.01" > "01.02", chronologically it is earlier
        assert_eq!(
            compare_date_times("31.01.2024 12:00:00", "01.02.2024 12:00:00"),
            Ordering::Less
        );
        assert_eq!(
            compare_date_times("01.01.2025 00:00:00", "31.12.2024 23:59:59"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_falls_back_to_strings() {
        assert_eq!(compare_date_times("abc", "abd"), Ordering::Less);
    }

    #[test]
    fn test_window_contains_inclusive() {
        let window = DateWindow::new("01.01.2024 00:00:00", "31.01.2024 23:59:59");
        assert!(window.contains("01.01.2024 00:00:00"));
        assert!(window.contains("15.01.2024 12:00:00"));
        assert!(window.contains("31.01.2024 23:59:59"));
        assert!(!window.contains("01.02.2024 00:00:00"));
        assert!(!window.contains("31.12.2023 23:59:59"));
    }

    #[test]
    fn test_window_spanning_year_boundary() {
        let window = DateWindow::new("20.12.2024", "10.01.2025");
        assert!(window.contains("31.12.2024 10:00:00"));
        assert!(window.contains("05.01.2025 10:00:00"));
        assert!(window.contains("10.01.2025 18:30:00"));
        assert!(!window.contains("11.01.2025 00:00:00"));
    }

    #[test]
    fn test_window_is_ordered() {
        assert!(DateWindow::new("01.01.2024", "02.01.2024").is_ordered());
        assert!(!DateWindow::new("02.01.2024", "01.01.2024").is_ordered());
        assert!(!DateWindow::new("01.01.2024 10:00:00", "01.01.2024 10:00:00").is_ordered());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::at("10.06.2024 12:00:00").unwrap();
        assert_eq!(clock.now_string(), "10.06.2024 12:00:00");

        clock.advance(Duration::days(1));
        assert_eq!(clock.now_string(), "11.06.2024 12:00:00");

        clock.set(at("01.01.2030 00:00:00"));
        assert_eq!(clock.now_string(), "01.01.2030 00:00:00");
    }
}
