use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::format::month_label;

/// A calendar month, stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a month as YYYY-MM, got {0:?}")]
pub struct InvalidMonth(pub String);

impl Month {
    pub fn containing(date: NaiveDate) -> Self {
        Month(date - Days::new(u64::from(date.day0())))
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn number(self) -> u32 {
        self.0.month()
    }

    /// Months strictly after the month containing `today` are predicted.
    pub fn is_future(self, today: NaiveDate) -> bool {
        self.0 > Month::containing(today).0
    }

    pub fn shifted(self, months: i32) -> Option<Month> {
        let delta = Months::new(months.unsigned_abs());
        let day = if months >= 0 {
            self.0.checked_add_months(delta)
        } else {
            self.0.checked_sub_months(delta)
        };
        day.map(Month)
    }

    /// `YYYY-MM-01`, the form the upstream expects in `month` parameters.
    pub fn query_date(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.number())
    }
}

impl FromStr for Month {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Month)
            .ok_or_else(invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthOption {
    pub month: Month,
    pub label: String,
    pub predicted: bool,
}

pub const PAST_MONTH_OPTIONS: i32 = 12;
pub const FUTURE_MONTH_OPTIONS: i32 = 24;

/// Picker entries: the current month and the eleven before it, newest first,
/// followed by the next 24 months marked as predicted.
pub fn month_options(today: NaiveDate) -> Vec<MonthOption> {
    let current = Month::containing(today);
    let past = (0..PAST_MONTH_OPTIONS).filter_map(|back| current.shifted(-back));
    let future = (1..=FUTURE_MONTH_OPTIONS).filter_map(|ahead| current.shifted(ahead));

    past.chain(future)
        .map(|month| {
            let predicted = month.is_future(today);
            let mut label = month_label(month);
            if predicted {
                label.push_str(" (previsto)");
            }
            MonthOption { month, label, predicted }
        })
        .collect()
}
