//! Anchor plus confirmation filter.
//!
//! For every anchor signal on date A, look for a confirmation signal dated in
//! `[A + delay, A + delay + range]` (calendar days, inclusive). A match emits a
//! buy signal on the confirmation's date.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::date_range::days_after;
use crate::domain::error::SigtraderError;
use crate::domain::filter::{bucket, dates_of, BuySignal, SignalFilter, SignalMap};
use crate::domain::signal::IndicatorId;

/// Longest delay, range, or rolling window accepted, in calendar days.
pub const MAX_WINDOW_DAYS: u32 = 3_660;

/// Calendar-day offset window following an anchor signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationWindow {
    delay: u32,
    range: u32,
}

impl ConfirmationWindow {
    pub fn new(delay: i64, range: i64) -> Result<Self, SigtraderError> {
        let delay = u32::try_from(delay).map_err(|_| {
            SigtraderError::invalid_configuration(format!(
                "confirmation delay must be a non-negative day count, got {delay}"
            ))
        })?;
        let range = u32::try_from(range).map_err(|_| {
            SigtraderError::invalid_configuration(format!(
                "confirmation range must be a non-negative day count, got {range}"
            ))
        })?;
        if delay > MAX_WINDOW_DAYS || range > MAX_WINDOW_DAYS {
            return Err(SigtraderError::invalid_configuration(format!(
                "confirmation delay {delay} and range {range} must each be at most {MAX_WINDOW_DAYS} days"
            )));
        }
        Ok(Self { delay, range })
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    /// Total span from an anchor to the last acceptable confirmation day.
    pub fn span(&self) -> u32 {
        self.delay.saturating_add(self.range)
    }

    /// First and last acceptable confirmation dates for an anchor.
    pub fn bounds(&self, anchor: NaiveDate) -> Result<(NaiveDate, NaiveDate), SigtraderError> {
        let first = days_after(anchor, i64::from(self.delay))?;
        let last = days_after(first, i64::from(self.range))?;
        Ok((first, last))
    }
}

/// Which confirmation wins when several fall inside one anchor's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    #[default]
    Earliest,
    Latest,
}

impl MatchPolicy {
    /// Pick the matching confirmation date for one anchor.
    pub fn select(
        &self,
        window: &ConfirmationWindow,
        anchor: NaiveDate,
        confirmations: &BTreeSet<NaiveDate>,
    ) -> Result<Option<NaiveDate>, SigtraderError> {
        let (first, last) = window.bounds(anchor)?;
        let mut candidates = confirmations.range(first..=last);
        Ok(match self {
            MatchPolicy::Earliest => candidates.next().copied(),
            MatchPolicy::Latest => candidates.next_back().copied(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmationFilter {
    anchor: IndicatorId,
    confirmation: IndicatorId,
    window: ConfirmationWindow,
    policy: MatchPolicy,
}

impl ConfirmationFilter {
    pub fn new(
        anchor: IndicatorId,
        confirmation: IndicatorId,
        window: ConfirmationWindow,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            anchor,
            confirmation,
            window,
            policy,
        }
    }

    pub fn window(&self) -> ConfirmationWindow {
        self.window
    }
}

impl SignalFilter for ConfirmationFilter {
    fn indicators(&self) -> Vec<IndicatorId> {
        vec![self.anchor.clone(), self.confirmation.clone()]
    }

    fn lookback_days(&self) -> u32 {
        self.window.span()
    }

    fn apply(
        &self,
        signals: &SignalMap,
        _latest_trading_date: NaiveDate,
    ) -> Result<BTreeSet<BuySignal>, SigtraderError> {
        let anchors = dates_of(bucket(signals, &self.anchor)?);
        let confirmations = dates_of(bucket(signals, &self.confirmation)?);

        let mut buys = BTreeSet::new();
        for anchor in &anchors {
            if let Some(date) = self.policy.select(&self.window, *anchor, &confirmations)? {
                buys.insert(BuySignal { date });
            }
        }
        Ok(buys)
    }
}
