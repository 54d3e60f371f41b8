//! Rule tree evaluation.
//!
//! `analyse` returns the trading dates inside an inclusive range on which a
//! rule fires.
//!
//! # Evaluation Semantics
//!
//! - Indicator leaf: the dates of its generator's signals
//! - Periodic leaf: bar dates matching the calendar trigger
//! - `AND`: dates on which both children fire
//! - `OR`: dates on which either child fires
//! - `CONFIRM(anchor, follower, delay, range)`: follower dates lying in
//!   `[A + delay, A + delay + range]` for some anchor date A. Anchors are
//!   searched over the range widened backwards by `delay + range` days, and
//!   each anchor claims its earliest qualifying follower.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::filter::MatchPolicy;
use crate::domain::price::TradingDayPrice;
use crate::domain::rule::{Operator, Rule};

pub fn analyse(
    rule: &Rule,
    prices: &[TradingDayPrice],
    range: DateRange,
) -> Result<BTreeSet<NaiveDate>, SigtraderError> {
    match rule {
        Rule::Indicator(generator) => Ok(generator
            .generate(prices, range)?
            .into_iter()
            .map(|signal| signal.date)
            .collect()),
        Rule::Periodic(periodic) => {
            if prices.is_empty() {
                return Err(SigtraderError::InsufficientData {
                    indicator: periodic.to_string(),
                    required: 1,
                    available: 0,
                });
            }
            Ok(prices
                .iter()
                .map(|p| p.date)
                .filter(|d| range.contains(*d) && periodic.fires_on(*d))
                .collect())
        }
        Rule::Operator {
            operator,
            left,
            right,
        } => {
            let left = analyse(left, prices, range)?;
            let right = analyse(right, prices, range)?;
            Ok(match operator {
                Operator::And => left.intersection(&right).copied().collect(),
                Operator::Or => left.union(&right).copied().collect(),
            })
        }
        Rule::Confirmation {
            anchor,
            follower,
            window,
        } => {
            let anchors = analyse(anchor, prices, range.widen_back(window.span())?)?;
            let followers = analyse(follower, prices, range)?;
            let mut confirmed = BTreeSet::new();
            for a in &anchors {
                if let Some(date) = MatchPolicy::Earliest.select(window, *a, &followers)? {
                    confirmed.insert(date);
                }
            }
            Ok(confirmed)
        }
    }
}
