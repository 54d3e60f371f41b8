//! Date ranges used at the signal and history boundaries.
//!
//! Signal scans use an inclusive `[earliest, latest]` range. Price history
//! requests use an inclusive start and an exclusive end.

use chrono::{Duration, NaiveDate};

use crate::domain::error::SigtraderError;

/// Step `days` calendar days back from `date`, failing past the calendar edge.
pub(crate) fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate, SigtraderError> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_sub_signed(delta))
        .ok_or_else(|| {
            SigtraderError::invalid_configuration(format!(
                "{days} days before {date} is outside the supported calendar"
            ))
        })
}

/// Step `days` calendar days forward from `date`, failing past the calendar edge.
pub(crate) fn days_after(date: NaiveDate, days: i64) -> Result<NaiveDate, SigtraderError> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| {
            SigtraderError::invalid_configuration(format!(
                "{days} days after {date} is outside the supported calendar"
            ))
        })
}

/// Inclusive range of dates in which signals are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl DateRange {
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Result<Self, SigtraderError> {
        if earliest > latest {
            return Err(SigtraderError::invalid_configuration(format!(
                "date range start {earliest} is after end {latest}"
            )));
        }
        Ok(Self { earliest, latest })
    }

    /// A range covering exactly one day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            earliest: date,
            latest: date,
        }
    }

    /// `days` calendar days ending on, and including, `latest`.
    pub fn trailing(latest: NaiveDate, days: u32) -> Result<Self, SigtraderError> {
        let span = i64::from(days.max(1)) - 1;
        Ok(Self {
            earliest: days_before(latest, span)?,
            latest,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }

    /// Extend the start of the range backwards by `days` calendar days.
    pub fn widen_back(&self, days: u32) -> Result<Self, SigtraderError> {
        Ok(Self {
            earliest: days_before(self.earliest, i64::from(days))?,
            latest: self.latest,
        })
    }
}

/// Inclusive-start, exclusive-end range used when requesting price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SigtraderError> {
        if start >= end {
            return Err(SigtraderError::invalid_configuration(format!(
                "history range start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Move the start back far enough to cover `trading_days` bars before it,
    /// allowing for weekends and market holidays.
    pub fn with_lead_in(&self, trading_days: usize) -> Result<Self, SigtraderError> {
        let calendar_days = i64::try_from(trading_days)
            .ok()
            .and_then(|n| n.checked_mul(3))
            .map(|n| n / 2 + 10)
            .ok_or_else(|| {
                SigtraderError::invalid_configuration(format!(
                    "lead-in of {trading_days} trading days is too large"
                ))
            })?;
        Ok(Self {
            start: days_before(self.start, calendar_days)?,
            end: self.end,
        })
    }
}
