//! Entry/exit rule tree.
//!
//! Leaves are signal generators or calendar-driven periodic triggers; interior
//! nodes combine two sub-rules with AND/OR or require a follower rule to fire
//! within a day window after an anchor rule. Trees are built once per strategy
//! and hold no per-run state.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::error::SigtraderError;
use crate::domain::filter::ConfirmationWindow;
use crate::domain::signal::{IndicatorId, SignalGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => f.write_str("AND"),
            Operator::Or => f.write_str("OR"),
        }
    }
}

/// Calendar trigger that ignores indicator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Periodic {
    Daily,
    Weekly(Weekday),
    /// First weekday on or after this day of each month.
    Monthly(u32),
}

pub const MAX_MONTHLY_DAY: u32 = 28;

impl Periodic {
    pub fn monthly(day: u32) -> Result<Self, SigtraderError> {
        if day == 0 || day > MAX_MONTHLY_DAY {
            return Err(SigtraderError::invalid_configuration(format!(
                "MONTHLY day must be between 1 and {MAX_MONTHLY_DAY}, got {day}"
            )));
        }
        Ok(Periodic::Monthly(day))
    }

    pub fn weekly(day: Weekday) -> Result<Self, SigtraderError> {
        if is_weekend(day) {
            return Err(SigtraderError::invalid_configuration(format!(
                "WEEKLY day must be a weekday, got {}",
                weekday_name(day)
            )));
        }
        Ok(Periodic::Weekly(day))
    }

    /// Whether a bar dated `date` triggers this rule.
    pub fn fires_on(&self, date: NaiveDate) -> bool {
        match *self {
            Periodic::Daily => true,
            Periodic::Weekly(day) => date.weekday() == day,
            Periodic::Monthly(day) => {
                let this_month = monthly_target(date.year(), date.month(), day);
                let previous = date.with_day(1).and_then(|first| first.pred_opt());
                let last_month =
                    previous.and_then(|p| monthly_target(p.year(), p.month(), day));
                this_month == Some(date) || last_month == Some(date)
            }
        }
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

fn monthly_target(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let mut date = NaiveDate::from_ymd_opt(year, month, day)?;
    while is_weekend(date.weekday()) {
        date = date.succ_opt()?;
    }
    Some(date)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

impl fmt::Display for Periodic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Periodic::Daily => f.write_str("DAILY"),
            Periodic::Weekly(day) => write!(f, "WEEKLY({})", weekday_name(*day)),
            Periodic::Monthly(day) => write!(f, "MONTHLY({day})"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Rule {
    Indicator(Arc<dyn SignalGenerator>),
    Periodic(Periodic),
    Operator {
        operator: Operator,
        left: Box<Rule>,
        right: Box<Rule>,
    },
    Confirmation {
        anchor: Box<Rule>,
        follower: Box<Rule>,
        window: ConfirmationWindow,
    },
}

impl Rule {
    pub fn indicator(id: &IndicatorId) -> Result<Self, SigtraderError> {
        Ok(Rule::Indicator(id.build()?))
    }

    pub fn and(left: Rule, right: Rule) -> Self {
        Rule::Operator {
            operator: Operator::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Rule, right: Rule) -> Self {
        Rule::Operator {
            operator: Operator::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn confirm(anchor: Rule, follower: Rule, window: ConfirmationWindow) -> Self {
        Rule::Confirmation {
            anchor: Box::new(anchor),
            follower: Box::new(follower),
            window,
        }
    }

    /// Trading prices needed before this rule can be evaluated.
    pub fn required_trading_prices(&self) -> usize {
        match self {
            Rule::Indicator(generator) => generator.required_trading_days(),
            Rule::Periodic(_) => 1,
            Rule::Operator { left, right, .. } => left
                .required_trading_prices()
                .max(right.required_trading_prices()),
            Rule::Confirmation {
                anchor,
                follower,
                window,
            } => anchor
                .required_trading_prices()
                .saturating_add(window.span() as usize)
                .saturating_add(follower.required_trading_prices()),
        }
    }

    /// Every generator identity referenced by the tree, without repeats.
    pub fn indicators(&self) -> Vec<IndicatorId> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        self.collect_indicators(&mut seen, &mut ids);
        ids
    }

    fn collect_indicators(&self, seen: &mut HashSet<IndicatorId>, ids: &mut Vec<IndicatorId>) {
        match self {
            Rule::Indicator(generator) => {
                let id = generator.id();
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            Rule::Periodic(_) => {}
            Rule::Operator { left, right, .. } => {
                left.collect_indicators(seen, ids);
                right.collect_indicators(seen, ids);
            }
            Rule::Confirmation {
                anchor, follower, ..
            } => {
                anchor.collect_indicators(seen, ids);
                follower.collect_indicators(seen, ids);
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Indicator(generator) => write!(f, "{}", generator.id()),
            Rule::Periodic(periodic) => write!(f, "{periodic}"),
            Rule::Operator {
                operator,
                left,
                right,
            } => write!(f, "{operator}({left}, {right})"),
            Rule::Confirmation {
                anchor,
                follower,
                window,
            } => write!(
                f,
                "CONFIRM({anchor}, {follower}, {}, {})",
                window.delay(),
                window.range()
            ),
        }
    }
}
