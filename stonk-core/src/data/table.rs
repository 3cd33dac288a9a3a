//! Normalized price history for one ticker.

use super::interval::Interval;
use polars::prelude::*;

/// Column order of daily, weekly and monthly tables.
pub const PERIOD_COLUMNS: [&str; 7] = ["day", "open", "high", "low", "close", "adjclose", "volume"];

/// Column order of minute tables. No adjusted close exists intraday.
pub const INTRADAY_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Name of the row index carried by minute tables.
pub const INDEX_NAME: &str = "timestamp";

/// One ticker's price rows in fixed column order.
///
/// Period tables carry their date in the `day` column. Minute tables keep the
/// untruncated timestamp beside the frame as a row index.
#[derive(Debug, Clone)]
pub struct PriceTable {
    symbol: String,
    interval: Interval,
    frame: DataFrame,
    index: Option<Series>,
}

impl PriceTable {
    pub(crate) fn period(symbol: &str, interval: Interval, frame: DataFrame) -> Self {
        Self {
            symbol: symbol.to_string(),
            interval,
            frame,
            index: None,
        }
    }

    pub(crate) fn intraday(symbol: &str, frame: DataFrame, index: Series) -> Self {
        Self {
            symbol: symbol.to_string(),
            interval: Interval::Minute,
            frame,
            index: Some(index),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Row keys of a minute table (`Datetime(ms)`), `None` for period tables.
    pub fn index(&self) -> Option<&Series> {
        self.index.as_ref()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect()
    }

    /// The frame with the row index, if any, prepended as a `timestamp` column.
    pub fn to_indexed_frame(&self) -> PolarsResult<DataFrame> {
        match &self.index {
            None => Ok(self.frame.clone()),
            Some(index) => {
                let mut columns: Vec<Column> = Vec::with_capacity(self.frame.width() + 1);
                columns.push(index.clone().into());
                columns.extend(self.frame.get_columns().iter().cloned());
                DataFrame::new(columns)
            }
        }
    }
}
