//! Strategy DSL parser.
//!
//! Recursive descent parser for entry/exit rules and live-analysis filters.
//! Syntax errors carry the character offset of the offending token; parameter
//! errors (a fast period above the slow one, a negative window) surface as
//! invalid configuration once the text itself is well formed.
//!
//! ```text
//! rule      := AND(rule, rule, ...) | OR(rule, rule, ...)
//!            | CONFIRM(rule, rule, delay, range)
//!            | DAILY | WEEKLY(MONDAY..FRIDAY) | MONTHLY(day)
//!            | generator
//! filter    := ANY(generator, ...) | SAME_DAY(generator, ...)
//!            | CONFIRM(generator, generator, delay, range[, EARLIEST|LATEST])
//! ```

use std::str::FromStr;
use std::sync::Arc;

use chrono::Weekday;
use rust_decimal::Decimal;

use crate::domain::error::{ParseError, SigtraderError};
use crate::domain::filter::{
    AnyIndicatorFilter, ConfirmationFilter, ConfirmationWindow, MatchPolicy, SameDayFilter,
    SignalFilter,
};
use crate::domain::rule::{Periodic, Rule};
use crate::domain::signal::{GradientType, IndicatorId};

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position,
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error_at(
                self.pos,
                format!("expected '{}', found '{}'", expected, ch),
            )),
            None => Err(self.error_at(
                self.pos,
                format!("expected '{}', found end of input", expected),
            )),
        }
    }

    /// Consume `,` and return true, or consume `)` and return false.
    fn list_continues(&mut self) -> Result<bool, ParseError> {
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(false);
        }
        self.expect_char(',')?;
        Ok(true)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        self.skip_whitespace();
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> String {
        let word: String = self
            .remaining()
            .chars()
            .take_while(|ch| ch.is_alphanumeric() || *ch == '_')
            .collect();
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn take_word(&mut self) -> String {
        self.skip_whitespace();
        let word: String = self
            .remaining()
            .chars()
            .take_while(|ch| ch.is_alphanumeric() || *ch == '_')
            .collect();
        self.pos += word.len();
        word
    }

    fn scan_digits(&mut self, allow_sign: bool, allow_dot: bool) -> Result<&'a str, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if allow_sign && self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if allow_dot && ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            let expected = if allow_dot { "number" } else { "integer" };
            return Err(self.error_at(start, format!("expected {expected}")));
        }
        Ok(&self.input[start..self.pos])
    }

    fn parse_number(&mut self) -> Result<Decimal, ParseError> {
        let start = self.pos;
        let text = self.scan_digits(true, true)?;
        Decimal::from_str(text)
            .map_err(|_| self.error_at(start, format!("invalid number: {}", text)))
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        let text = self.scan_digits(false, false)?;
        text.parse::<usize>()
            .map_err(|_| self.error_at(self.pos - text.len(), format!("invalid integer: {}", text)))
    }

    fn parse_signed_integer(&mut self) -> Result<i64, ParseError> {
        let text = self.scan_digits(true, false)?;
        text.parse::<i64>()
            .map_err(|_| self.error_at(self.pos - text.len(), format!("invalid integer: {}", text)))
    }

    fn parse_integer_list<const N: usize>(&mut self) -> Result<[usize; N], ParseError> {
        let mut values = [0; N];
        for (i, value) in values.iter_mut().enumerate() {
            if i > 0 {
                self.expect_char(',')?;
            }
            *value = self.parse_integer()?;
        }
        Ok(values)
    }

    fn parse_gradient(&mut self) -> Result<GradientType, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        match self.take_word().as_str() {
            "POSITIVE" => Ok(GradientType::Positive),
            "FLAT" => Ok(GradientType::Flat),
            "NEGATIVE" => Ok(GradientType::Negative),
            other => Err(self.error_at(
                start,
                format!("expected gradient (POSITIVE, FLAT, NEGATIVE), found '{}'", other),
            )),
        }
    }

    fn parse_weekday(&mut self) -> Result<Weekday, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        match self.take_word().as_str() {
            "MONDAY" => Ok(Weekday::Mon),
            "TUESDAY" => Ok(Weekday::Tue),
            "WEDNESDAY" => Ok(Weekday::Wed),
            "THURSDAY" => Ok(Weekday::Thu),
            "FRIDAY" => Ok(Weekday::Fri),
            other => Err(self.error_at(
                start,
                format!("expected weekday (MONDAY..FRIDAY), found '{}'", other),
            )),
        }
    }

    fn parse_generator(&mut self) -> Result<IndicatorId, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let keyword = self.peek_word();

        let parse_gradient_args = |p: &mut Self| -> Result<(usize, GradientType), ParseError> {
            let lookback = p.parse_integer()?;
            p.expect_char(',')?;
            let gradient = p.parse_gradient()?;
            Ok((lookback, gradient))
        };

        let id = match keyword.as_str() {
            "SMA_GRADIENT" | "EMA_GRADIENT" => {
                self.pos += keyword.len();
                self.expect_char('(')?;
                let (lookback, gradient) = parse_gradient_args(self)?;
                if keyword == "SMA_GRADIENT" {
                    IndicatorId::SmaGradient { lookback, gradient }
                } else {
                    IndicatorId::EmaGradient { lookback, gradient }
                }
            }
            "MA_CROSS_ABOVE" | "MA_CROSS_BELOW" => {
                self.pos += keyword.len();
                self.expect_char('(')?;
                let [fast, slow] = self.parse_integer_list::<2>()?;
                if keyword == "MA_CROSS_ABOVE" {
                    IndicatorId::MaCrossAbove { fast, slow }
                } else {
                    IndicatorId::MaCrossBelow { fast, slow }
                }
            }
            "MACD_BULLISH" | "MACD_BEARISH" | "MACD_ZERO_BULLISH" | "MACD_ZERO_BEARISH" => {
                self.pos += keyword.len();
                self.expect_char('(')?;
                let [fast, slow, signal] = self.parse_integer_list::<3>()?;
                match keyword.as_str() {
                    "MACD_BULLISH" => IndicatorId::MacdBullish { fast, slow, signal },
                    "MACD_BEARISH" => IndicatorId::MacdBearish { fast, slow, signal },
                    "MACD_ZERO_BULLISH" => IndicatorId::MacdZeroBullish { fast, slow, signal },
                    _ => IndicatorId::MacdZeroBearish { fast, slow, signal },
                }
            }
            "RSI_OVERSOLD" | "RSI_OVERBOUGHT" => {
                self.pos += keyword.len();
                self.expect_char('(')?;
                let lookback = self.parse_integer()?;
                self.expect_char(',')?;
                let threshold = self.parse_number()?;
                if keyword == "RSI_OVERSOLD" {
                    IndicatorId::RsiOversold {
                        lookback,
                        threshold,
                    }
                } else {
                    IndicatorId::RsiOverbought {
                        lookback,
                        threshold,
                    }
                }
            }
            "STOCHASTIC_OVERSOLD" | "STOCHASTIC_OVERBOUGHT" => {
                self.pos += keyword.len();
                self.expect_char('(')?;
                let [k, d] = self.parse_integer_list::<2>()?;
                self.expect_char(',')?;
                let threshold = self.parse_number()?;
                if keyword == "STOCHASTIC_OVERSOLD" {
                    IndicatorId::StochasticOversold { k, d, threshold }
                } else {
                    IndicatorId::StochasticOverbought { k, d, threshold }
                }
            }
            _ => {
                return Err(self.error_at(
                    start,
                    format!("expected signal generator, found '{}'", keyword),
                ));
            }
        };
        self.expect_char(')')?;
        Ok(id)
    }

    fn parse_window(&mut self) -> Result<(i64, i64), ParseError> {
        self.expect_char(',')?;
        let delay = self.parse_signed_integer()?;
        self.expect_char(',')?;
        let range = self.parse_signed_integer()?;
        Ok((delay, range))
    }

    fn parse_rule(&mut self) -> Result<Rule, SigtraderError> {
        self.skip_whitespace();

        if self.consume_keyword("AND") {
            return self.parse_operator("AND", Rule::and);
        }
        if self.consume_keyword("OR") {
            return self.parse_operator("OR", Rule::or);
        }
        if self.consume_keyword("CONFIRM") {
            self.expect_char('(')?;
            let anchor = self.parse_rule()?;
            self.expect_char(',')?;
            let follower = self.parse_rule()?;
            let (delay, range) = self.parse_window()?;
            self.expect_char(')')?;
            let window = ConfirmationWindow::new(delay, range)?;
            return Ok(Rule::confirm(anchor, follower, window));
        }
        if self.consume_keyword("DAILY") {
            return Ok(Rule::Periodic(Periodic::Daily));
        }
        if self.consume_keyword("WEEKLY") {
            self.expect_char('(')?;
            let day = self.parse_weekday()?;
            self.expect_char(')')?;
            return Ok(Rule::Periodic(Periodic::weekly(day)?));
        }
        if self.consume_keyword("MONTHLY") {
            self.expect_char('(')?;
            let day = self.parse_integer()?;
            self.expect_char(')')?;
            let day = u32::try_from(day).unwrap_or(u32::MAX);
            return Ok(Rule::Periodic(Periodic::monthly(day)?));
        }

        let start = self.pos;
        let id = self.parse_generator().map_err(|err| {
            if err.position == start {
                self.error_at(start, format!("expected rule, found '{}'", self.peek_word()))
            } else {
                err
            }
        })?;
        Rule::indicator(&id)
    }

    /// Variadic operator, folded left into binary nodes.
    fn parse_operator(
        &mut self,
        name: &str,
        combine: fn(Rule, Rule) -> Rule,
    ) -> Result<Rule, SigtraderError> {
        self.expect_char('(')?;
        let mut rule = self.parse_rule()?;
        let mut count = 1;
        while self.list_continues()? {
            let next = self.parse_rule()?;
            rule = combine(rule, next);
            count += 1;
        }
        if count < 2 {
            return Err(self
                .error_at(self.pos, format!("{} requires at least 2 rules", name))
                .into());
        }
        Ok(rule)
    }

    fn parse_generator_list(&mut self) -> Result<Vec<IndicatorId>, ParseError> {
        self.expect_char('(')?;
        let mut ids = vec![self.parse_generator()?];
        while self.list_continues()? {
            ids.push(self.parse_generator()?);
        }
        Ok(ids)
    }

    fn parse_filter(&mut self) -> Result<Arc<dyn SignalFilter>, SigtraderError> {
        self.skip_whitespace();

        if self.consume_keyword("ANY") {
            let ids = self.parse_generator_list()?;
            validate_generators(&ids)?;
            return Ok(Arc::new(AnyIndicatorFilter::new(ids)?));
        }
        if self.consume_keyword("SAME_DAY") {
            let ids = self.parse_generator_list()?;
            validate_generators(&ids)?;
            return Ok(Arc::new(SameDayFilter::new(ids)?));
        }
        if self.consume_keyword("CONFIRM") {
            self.expect_char('(')?;
            let anchor = self.parse_generator()?;
            self.expect_char(',')?;
            let confirmation = self.parse_generator()?;
            let (delay, range) = self.parse_window()?;

            let mut policy = MatchPolicy::default();
            if self.list_continues()? {
                let start = self.pos;
                policy = match self.take_word().as_str() {
                    "EARLIEST" => MatchPolicy::Earliest,
                    "LATEST" => MatchPolicy::Latest,
                    other => {
                        return Err(self
                            .error_at(
                                start,
                                format!("expected EARLIEST or LATEST, found '{}'", other),
                            )
                            .into());
                    }
                };
                self.expect_char(')')?;
            }

            validate_generators(&[anchor.clone(), confirmation.clone()])?;
            let window = ConfirmationWindow::new(delay, range)?;
            return Ok(Arc::new(ConfirmationFilter::new(
                anchor,
                confirmation,
                window,
                policy,
            )));
        }

        let word = self.peek_word();
        Err(self
            .error_at(
                self.pos,
                format!("expected filter (ANY, SAME_DAY, CONFIRM), found '{}'", word),
            )
            .into())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error_at(
                self.pos,
                format!("unexpected input after expression: '{}'", self.remaining()),
            ));
        }
        Ok(())
    }
}

fn validate_generators(ids: &[IndicatorId]) -> Result<(), SigtraderError> {
    for id in ids {
        id.build()?;
    }
    Ok(())
}

/// Parse an entry or exit rule, building every generator it names.
pub fn parse_rule(input: &str) -> Result<Rule, SigtraderError> {
    let mut parser = Parser::new(input);
    let rule = parser.parse_rule()?;
    parser.finish()?;
    Ok(rule)
}

/// Parse a live-analysis filter.
pub fn parse_filter(input: &str) -> Result<Arc<dyn SignalFilter>, SigtraderError> {
    let mut parser = Parser::new(input);
    let filter = parser.parse_filter()?;
    parser.finish()?;
    Ok(filter)
}

/// Parse a single generator expression such as `RSI_OVERSOLD(14,30)`.
pub fn parse_indicator(input: &str) -> Result<IndicatorId, SigtraderError> {
    let mut parser = Parser::new(input);
    let id = parser.parse_generator()?;
    parser.finish()?;
    Ok(id)
}
