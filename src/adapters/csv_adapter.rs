//! CSV file price history adapter.
//!
//! Each ticker lives in `<directory>/<TICKER>.csv` with a header row and the
//! columns `date,open,high,low,close`. Further columns are ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use log::debug;
use rust_decimal::Decimal;

use crate::domain::date_range::HistoryRange;
use crate::domain::error::SigtraderError;
use crate::domain::price::{sort_by_date, TradingDayPrice};
use crate::ports::data_port::PriceHistoryPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn column<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<&'r str, SigtraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| SigtraderError::Data {
            reason: format!("line {}: missing {} column", line, name),
        })
}

fn price(record: &StringRecord, index: usize, name: &str, line: u64) -> Result<Decimal, SigtraderError> {
    let raw = column(record, index, name, line)?;
    Decimal::from_str(raw).map_err(|e| SigtraderError::Data {
        reason: format!("line {}: invalid {} value '{}': {}", line, name, raw, e),
    })
}

impl PriceHistoryPort for CsvAdapter {
    fn fetch(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> Result<Vec<TradingDayPrice>, SigtraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SigtraderError::NoData {
                ticker: ticker.to_string(),
            },
            _ => SigtraderError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let date_str = column(&record, 0, "date", line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                SigtraderError::Data {
                    reason: format!("line {}: invalid date '{}': {}", line, date_str, e),
                }
            })?;

            if !range.contains(date) {
                continue;
            }

            bars.push(TradingDayPrice::new(
                date,
                price(&record, 1, "open", line)?,
                price(&record, 2, "high", line)?,
                price(&record, 3, "low", line)?,
                price(&record, 4, "close", line)?,
            ));
        }

        debug!(
            "read {} bars for {} from {}",
            bars.len(),
            ticker,
            path.display()
        );
        Ok(sort_by_date(bars))
    }
}
