use chrono::NaiveDate;

use crate::errors::AppError;

/// The time-bound fields of an education or experience record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

/// Which date fields a write touched. `end_date: Some(None)` is an explicit clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateWrite {
    pub is_current: Option<bool>,
    pub end_date: Option<Option<NaiveDate>>,
}

impl DateWrite {
    /// A create writes every field.
    pub fn full(is_current: bool, end_date: Option<NaiveDate>) -> Self {
        DateWrite {
            is_current: Some(is_current),
            end_date: Some(end_date),
        }
    }
}

/// Reconciles `is_current` and `end_date` on an already-merged span, then
/// checks ordering of the bounds.
///
/// - writing `is_current = true` clears `end_date`
/// - writing a non-null `end_date` (without `is_current = true`) clears `is_current`
/// - `start_date > end_date` is rejected
pub fn enforce(mut span: DateSpan, write: &DateWrite) -> Result<DateSpan, AppError> {
    if write.is_current == Some(true) {
        span.is_current = true;
        span.end_date = None;
    } else if matches!(write.end_date, Some(Some(_))) {
        span.is_current = false;
    }

    // A stored record can only be current without an end date.
    if span.is_current {
        span.end_date = None;
    }

    if let Some(end) = span.end_date {
        if span.start_date > end {
            return Err(AppError::InvalidDateRange(format!(
                "start_date {} is after end_date {}",
                span.start_date, end
            )));
        }
    }

    Ok(span)
}

/// Inclusive bounds check used by in-process date filters.
pub fn within(value: Option<NaiveDate>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    match value {
        None => false,
        Some(v) => from.map_or(true, |f| v >= f) && to.map_or(true, |t| v <= t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn span(end: Option<NaiveDate>, is_current: bool) -> DateSpan {
        DateSpan {
            start_date: d(2020, 1, 1),
            end_date: end,
            is_current,
        }
    }

    #[test]
    fn test_current_clears_end_date_on_create() {
        let out = enforce(
            span(Some(d(2021, 1, 1)), true),
            &DateWrite::full(true, Some(d(2021, 1, 1))),
        )
        .unwrap();
        assert!(out.is_current);
        assert_eq!(out.end_date, None);
    }

    #[test]
    fn test_end_date_write_clears_current() {
        // stored as current, patch only sets an end date
        let merged = span(Some(d(2022, 6, 30)), true);
        let write = DateWrite {
            is_current: None,
            end_date: Some(Some(d(2022, 6, 30))),
        };
        let out = enforce(merged, &write).unwrap();
        assert!(!out.is_current);
        assert_eq!(out.end_date, Some(d(2022, 6, 30)));
    }

    #[test]
    fn test_setting_current_on_update_clears_stored_end() {
        let merged = span(Some(d(2022, 6, 30)), true);
        let write = DateWrite {
            is_current: Some(true),
            end_date: None,
        };
        assert_eq!(enforce(merged, &write).unwrap().end_date, None);
    }

    #[test]
    fn test_start_after_end_rejected() {
        let bad = DateSpan {
            start_date: d(2023, 1, 1),
            end_date: Some(d(2022, 1, 1)),
            is_current: false,
        };
        let err = enforce(bad, &DateWrite::full(false, Some(d(2022, 1, 1)))).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange(_)));
    }

    #[test]
    fn test_same_day_range_allowed() {
        let ok = DateSpan {
            start_date: d(2023, 1, 1),
            end_date: Some(d(2023, 1, 1)),
            is_current: false,
        };
        assert!(enforce(ok, &DateWrite::default()).is_ok());
    }

    #[test]
    fn test_inverted_range_ignored_when_current() {
        // end date is dropped before the range check
        let out = enforce(
            DateSpan {
                start_date: d(2023, 1, 1),
                end_date: Some(d(2020, 1, 1)),
                is_current: true,
            },
            &DateWrite::full(true, Some(d(2020, 1, 1))),
        )
        .unwrap();
        assert_eq!(out.end_date, None);
    }

    #[test]
    fn test_within_bounds() {
        assert!(within(None, None, None));
        assert!(!within(None, Some(d(2020, 1, 1)), None));
        assert!(within(Some(d(2020, 1, 1)), Some(d(2020, 1, 1)), Some(d(2020, 1, 1))));
        assert!(!within(Some(d(2019, 12, 31)), Some(d(2020, 1, 1)), None));
        assert!(!within(Some(d(2021, 1, 2)), None, Some(d(2021, 1, 1))));
    }
}
