//! The reporting periods accepted by the dashboard and summary endpoints.

use serde::Deserialize;
use time::Date;

use crate::{Error, calendar::YearMonth, transaction::TransactionFilter};

/// The most months a single report request will materialize.
pub(super) const MAX_MATERIALIZED_MONTHS: u32 = 24;

/// A named window of the ledger, relative to today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The whole of the current month.
    #[default]
    Current,
    /// From the first day of the month three months ago to the end of this month.
    Last3,
    /// From the first day of the month six months ago to the end of this month.
    Last6,
    /// From the first day of the month twelve months ago to the end of this month.
    Last12,
    /// An explicit inclusive date range.
    Custom,
}

/// The query string for endpoints that report over a period.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl PeriodQuery {
    /// The dates covered by this query when today is `today`.
    ///
    /// # Errors
    /// See [resolve_period].
    pub fn date_range(&self, today: Date) -> Result<DateRange, Error> {
        resolve_period(self.period, self.start_date, self.end_date, today)
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day of the range.
    pub start: Date,
    /// The last day of the range.
    pub end: Date,
}

impl DateRange {
    /// The range cut off at `today`.
    pub fn until(self, today: Date) -> Self {
        Self {
            start: self.start,
            end: self.end.min(today),
        }
    }

    /// A transaction filter that matches the dates in this range.
    pub fn filter(self) -> TransactionFilter {
        TransactionFilter {
            start_date: Some(self.start),
            end_date: Some(self.end),
            ..Default::default()
        }
    }

    /// The months this range touches, oldest first.
    ///
    /// Only the latest [MAX_MATERIALIZED_MONTHS] months are returned.
    pub fn months(self) -> Vec<YearMonth> {
        let first = YearMonth::of(self.start);
        let last = YearMonth::of(self.end);
        let Ok(span) = u32::try_from(first.months_until(last)) else {
            return Vec::new();
        };
        let span = span.min(MAX_MATERIALIZED_MONTHS - 1);

        (0..=span).rev().map(|offset| last.sub_months(offset)).collect()
    }
}

/// Turn a period into the dates it covers when today is `today`.
///
/// # Errors
/// Returns:
/// - [Error::InvalidInput] if a custom period is missing either date,
/// - [Error::InvalidDateRange] if a custom period ends before it starts,
/// - [Error::InvalidDate] if the period starts outside the supported date range.
pub fn resolve_period(
    period: Period,
    start_date: Option<Date>,
    end_date: Option<Date>,
    today: Date,
) -> Result<DateRange, Error> {
    let this_month = YearMonth::of(today);

    let months_back = match period {
        Period::Current => {
            return Ok(DateRange {
                start: this_month.first_day()?,
                end: this_month.last_day()?,
            });
        }
        Period::Last3 => 3,
        Period::Last6 => 6,
        Period::Last12 => 12,
        Period::Custom => {
            let (Some(start), Some(end)) = (start_date, end_date) else {
                return Err(Error::InvalidInput(
                    "a custom period needs both startDate and endDate".to_owned(),
                ));
            };

            if end < start {
                return Err(Error::InvalidDateRange { start, end });
            }

            return Ok(DateRange { start, end });
        }
    };

    Ok(DateRange {
        start: this_month.sub_months(months_back).first_day()?,
        end: this_month.last_day()?,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Error, calendar::YearMonth};

    use super::{DateRange, MAX_MATERIALIZED_MONTHS, Period, resolve_period};

    const TODAY: time::Date = date!(2025 - 03 - 15);

    #[test]
    fn current_period_is_whole_month() {
        let range = resolve_period(Period::Current, None, None, TODAY).unwrap();

        assert_eq!(
            range,
            DateRange {
                start: date!(2025 - 03 - 01),
                end: date!(2025 - 03 - 31),
            }
        );
    }

    #[test]
    fn last_periods_start_on_first_of_earlier_month() {
        let last3 = resolve_period(Period::Last3, None, None, TODAY).unwrap();
        let last12 = resolve_period(Period::Last12, None, None, TODAY).unwrap();

        assert_eq!(last3.start, date!(2024 - 12 - 01));
        assert_eq!(last3.end, date!(2025 - 03 - 31));
        assert_eq!(last12.start, date!(2024 - 03 - 01));
    }

    #[test]
    fn custom_period_needs_both_dates() {
        let result = resolve_period(Period::Custom, Some(date!(2025 - 01 - 01)), None, TODAY);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn custom_period_ending_before_start_is_rejected() {
        let result = resolve_period(
            Period::Custom,
            Some(date!(2025 - 02 - 01)),
            Some(date!(2025 - 01 - 01)),
            TODAY,
        );

        assert!(matches!(result, Err(Error::InvalidDateRange { .. })));
    }

    #[test]
    fn until_caps_end_at_today() {
        let current = resolve_period(Period::Current, None, None, TODAY).unwrap();
        let past = DateRange {
            start: date!(2024 - 01 - 01),
            end: date!(2024 - 06 - 30),
        };

        assert_eq!(current.until(TODAY).end, TODAY);
        assert_eq!(past.until(TODAY).end, date!(2024 - 06 - 30));
    }

    #[test]
    fn months_runs_from_start_to_end() {
        let range = resolve_period(Period::Last3, None, None, TODAY).unwrap();

        let months = range.months();

        assert_eq!(
            months,
            [
                YearMonth::new(2024, 12).unwrap(),
                YearMonth::new(2025, 1).unwrap(),
                YearMonth::new(2025, 2).unwrap(),
                YearMonth::new(2025, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn months_keeps_only_the_latest() {
        let range = DateRange {
            start: date!(2000 - 01 - 01),
            end: date!(2024 - 12 - 31),
        };

        let months = range.months();

        assert_eq!(months.len(), MAX_MATERIALIZED_MONTHS as usize);
        assert_eq!(months.last(), Some(&YearMonth::new(2024, 12).unwrap()));
        assert_eq!(months.first(), Some(&YearMonth::new(2023, 1).unwrap()));
    }
}
