//! Chart endpoint URL and query parameters.
//!
//! No I/O happens here. "Now" comes from the injected [`Clock`].

use super::date_like::{truncated_seconds, DateLike};
use super::error::QueryError;
use super::interval::Interval;
use crate::clock::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Yahoo Finance v8 chart endpoint; the ticker is appended verbatim.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";

/// `period1` used when the caller gives no start date (1970-03-25 14:30 UTC).
pub const DEFAULT_START_SECONDS: i64 = 7_223_400;

/// Corporate events always requested alongside prices.
pub const EVENTS: &str = "div,splits";

/// Query-string parameters of one chart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub period1: i64,
    pub period2: i64,
    pub interval: String,
    pub events: String,
}

/// A fully resolved chart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub endpoint: String,
    pub params: QueryParams,
}

impl QuerySpec {
    /// Parameters in wire order: period1, period2, interval, events.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("period1", self.params.period1.to_string()),
            ("period2", self.params.period2.to_string()),
            ("interval", self.params.interval.clone()),
            ("events", self.params.events.clone()),
        ]
    }

    /// Requested span in seconds.
    pub fn span_seconds(&self) -> i64 {
        self.params.period2.saturating_sub(self.params.period1)
    }
}

/// Builds [`QuerySpec`]s against a base URL.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            clock,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a ticker and optional range into a request.
    ///
    /// `interval` is lower-cased but not validated; the fetcher checks it
    /// before calling this.
    pub fn build(
        &self,
        ticker: &str,
        start: Option<DateLike>,
        end: Option<DateLike>,
        interval: &str,
    ) -> Result<QuerySpec, QueryError> {
        let period2 = match end {
            Some(end) => end.epoch_seconds()?,
            None => truncated_seconds(self.clock.now()),
        };
        let period1 = match start {
            Some(start) => start.epoch_seconds()?,
            None => DEFAULT_START_SECONDS,
        };

        Ok(QuerySpec {
            endpoint: format!("{}{ticker}", self.base_url),
            params: QueryParams {
                period1,
                period2,
                interval: interval.to_lowercase(),
                events: EVENTS.to_string(),
            },
        })
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// [`QueryBuilder::build`] against the default endpoint and the system clock.
/// An omitted interval means daily bars.
pub fn build_query(
    ticker: &str,
    start: Option<DateLike>,
    end: Option<DateLike>,
    interval: Option<&str>,
) -> Result<QuerySpec, QueryError> {
    let interval = interval.unwrap_or(Interval::default().as_str());
    QueryBuilder::new().build(ticker, start, end, interval)
}
