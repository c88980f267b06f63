//! Calendar arithmetic shared by the month materializer and the forward seeder.
//!
//! Everything here works on whole calendar months in the proleptic Gregorian
//! calendar. A [YearMonth] is the unit that obligations are scheduled in, and
//! [YearMonth::clamped_date] turns a preferred day of the month into a real date.

use std::fmt::Display;

use serde::Serialize;
use time::{Date, Month};

use crate::Error;

/// A calendar month in a specific year, e.g. April 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

impl YearMonth {
    /// Create a year-month pair.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `month` is not in 1..=12, or
    /// [Error::InvalidDate] if `year` is outside the supported date range.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let calendar_month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;

        Date::from_calendar_date(year, calendar_month, 1)
            .map_err(|error| Error::InvalidDate(error.to_string()))?;

        Ok(Self { year, month })
    }

    /// The month that contains `date`.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// The calendar year.
    pub fn year(self) -> i32 {
        self.year
    }

    /// The month number, 1 for January through 12 for December.
    pub fn month(self) -> u8 {
        self.month
    }

    /// The number of whole months from `self` to `other`.
    ///
    /// The result is zero for the same month and negative when `other` comes
    /// before `self`.
    pub fn months_until(self, other: YearMonth) -> i64 {
        (i64::from(other.year) - i64::from(self.year)) * 12
            + (i64::from(other.month) - i64::from(self.month))
    }

    /// The month `months` months after `self`.
    pub fn add_months(self, months: u32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 + i64::from(months);

        Self {
            year: index.div_euclid(12) as i32,
            month: (index.rem_euclid(12) + 1) as u8,
        }
    }

    /// The month `months` months before `self`.
    pub fn sub_months(self, months: u32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 - i64::from(months);

        Self {
            year: index.div_euclid(12) as i32,
            month: (index.rem_euclid(12) + 1) as u8,
        }
    }

    /// The number of days in this month, accounting for leap years.
    pub fn days_in_month(self) -> u8 {
        last_day_of_month(self.year, self.month)
    }

    /// The date in this month for `preferred_day`.
    ///
    /// Days past the end of the month clamp to the last day, so day 31 lands on
    /// the 30th of April and the 28th (or 29th) of February. Day 0 is treated
    /// as day 1.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if the month lies outside the supported
    /// date range, e.g. after adding months to the year 9999.
    pub fn clamped_date(self, preferred_day: u8) -> Result<Date, Error> {
        let day = preferred_day.clamp(1, self.days_in_month());
        let month = Month::try_from(self.month).map_err(|_| Error::InvalidMonth(self.month))?;

        Date::from_calendar_date(self.year, month, day)
            .map_err(|error| Error::InvalidDate(error.to_string()))
    }

    /// The first day of this month.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if the month lies outside the supported date range.
    pub fn first_day(self) -> Result<Date, Error> {
        self.clamped_date(1)
    }

    /// The last day of this month.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if the month lies outside the supported date range.
    pub fn last_day(self) -> Result<Date, Error> {
        self.clamped_date(self.days_in_month())
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn last_day_of_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
