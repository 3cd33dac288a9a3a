//! Price history fetcher.
//!
//! One GET per call against the chart endpoint, no retries. Provider failures
//! and empty histories come back as [`FetchOutcome`] variants; only bad
//! arguments and payloads that break the expected shape are errors.

use super::chart::{ChartResponse, QuoteColumns};
use super::config::FetchConfig;
use super::date_like::DateLike;
use super::error::{FetchError, TransportError};
use super::interval::Interval;
use super::query::QueryBuilder;
use super::table::{PriceTable, INDEX_NAME, INTRADAY_COLUMNS, PERIOD_COLUMNS};
use super::transport::{ReqwestTransport, Transport};
use chrono::DateTime;
use log::{debug, warn};
use polars::prelude::*;

const SECONDS_PER_DAY: i64 = 86_400;

/// The provider serves at most this many days of minute bars.
pub const INTRADAY_WINDOW_DAYS: i64 = 7;

/// Why a well-formed response produced no table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoRows,
    MissingTimestamps,
}

/// Why no response body was examined.
#[derive(Debug)]
pub enum TransportFailure {
    Status(u16),
    Unreachable(TransportError),
}

/// Result of a fetch that was allowed to reach the network.
#[derive(Debug)]
pub enum FetchOutcome {
    Table(PriceTable),
    Empty(EmptyReason),
    TransportFailed(TransportFailure),
}

impl FetchOutcome {
    /// True for every outcome that carries no table.
    pub fn is_no_data(&self) -> bool {
        !matches!(self, FetchOutcome::Table(_))
    }

    pub fn table(&self) -> Option<&PriceTable> {
        match self {
            FetchOutcome::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_table(self) -> Option<PriceTable> {
        match self {
            FetchOutcome::Table(table) => Some(table),
            _ => None,
        }
    }
}

/// Fetches and normalizes one ticker's history per call.
pub struct SeriesFetcher {
    transport: Box<dyn Transport>,
    query: QueryBuilder,
}

impl SeriesFetcher {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            query: QueryBuilder::new(),
        }
    }

    /// Fetcher over a reqwest client configured from `config`.
    pub fn from_config(config: &FetchConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(Box::new(transport))
            .with_query_builder(QueryBuilder::new().with_base_url(config.base_url.as_str())))
    }

    pub fn with_query_builder(mut self, query: QueryBuilder) -> Self {
        self.query = query;
        self
    }

    /// Fetch `ticker` over `[start, end]` at `interval` (`1d`, `1wk`, `1mo` or `1m`).
    ///
    /// The interval is checked before anything touches the network.
    pub fn fetch(
        &self,
        ticker: &str,
        start: Option<DateLike>,
        end: Option<DateLike>,
        interval: &str,
    ) -> Result<FetchOutcome, FetchError> {
        let parsed: Interval = interval.parse()?;
        let spec = self.query.build(ticker, start, end, interval)?;

        if parsed.is_intraday() && spec.span_seconds() > INTRADAY_WINDOW_DAYS * SECONDS_PER_DAY {
            warn!(
                "{ticker}: minute data is limited to {INTRADAY_WINDOW_DAYS} days, requested {} days",
                spec.span_seconds() / SECONDS_PER_DAY
            );
        }

        debug!("GET {} {:?}", spec.endpoint, spec.params);
        let resp = match self.transport.get(&spec.endpoint, &spec.query_pairs()) {
            Ok(resp) => resp,
            Err(e) => {
                warn!("{ticker}: request failed: {e}");
                return Ok(FetchOutcome::TransportFailed(TransportFailure::Unreachable(e)));
            }
        };
        if !resp.is_success() {
            warn!("{ticker}: HTTP {}", resp.status);
            return Ok(FetchOutcome::TransportFailed(TransportFailure::Status(
                resp.status,
            )));
        }

        let outcome = shape_response(ticker, parsed, &resp.body)?;
        if let FetchOutcome::Table(table) = &outcome {
            debug!("{ticker}: {} rows at {parsed}", table.height());
        }
        Ok(outcome)
    }
}

/// [`SeriesFetcher::fetch`] with the default reqwest client and system clock.
/// An omitted interval means daily bars.
pub fn fetch(
    ticker: &str,
    start: Option<DateLike>,
    end: Option<DateLike>,
    interval: Option<&str>,
) -> Result<FetchOutcome, FetchError> {
    let interval = interval.unwrap_or(Interval::default().as_str());
    // validate before building a client so bad arguments never cost a connection
    interval.parse::<Interval>()?;
    let fetcher = match SeriesFetcher::from_config(&FetchConfig::default()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            warn!("{ticker}: {e}");
            return Ok(FetchOutcome::TransportFailed(TransportFailure::Unreachable(e)));
        }
    };
    fetcher.fetch(ticker, start, end, interval)
}

/// Decode a chart body and shape it into a table.
pub(crate) fn shape_response(
    symbol: &str,
    interval: Interval,
    body: &[u8],
) -> Result<FetchOutcome, FetchError> {
    let malformed = |detail: String| FetchError::MalformedResponse {
        symbol: symbol.to_string(),
        detail,
    };

    let chart: ChartResponse =
        serde_json::from_slice(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let mut data = chart.chart.into_first_result().map_err(malformed)?;

    let quote = std::mem::take(&mut data.indicators.quote)
        .into_iter()
        .next()
        .ok_or_else(|| malformed("no quote data".into()))?;

    let rows = quote.row_count().map_err(malformed)?;
    if rows == 0 {
        return Ok(FetchOutcome::Empty(EmptyReason::NoRows));
    }

    let Some(timestamps) = data.timestamp.take() else {
        return Ok(FetchOutcome::Empty(EmptyReason::MissingTimestamps));
    };
    if timestamps.len() != rows {
        return Err(malformed(format!(
            "{} timestamps for {rows} quote rows",
            timestamps.len()
        )));
    }
    let millis = timestamps
        .iter()
        .map(|&ts| {
            DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.timestamp_millis())
                .ok_or_else(|| malformed(format!("invalid timestamp: {ts}")))
        })
        .collect::<Result<Vec<i64>, _>>()?;

    let quote = quote.into_columns().map_err(malformed)?;
    let mut frame = quote_frame(quote)?;

    if interval.is_intraday() {
        let index = datetime_series(INDEX_NAME, millis)?;
        let frame = frame.select(INTRADAY_COLUMNS)?;
        return Ok(FetchOutcome::Table(PriceTable::intraday(symbol, frame, index)));
    }

    let adjclose = data
        .indicators
        .take_adjclose()
        .ok_or_else(|| malformed("no adjclose data".into()))?;
    if adjclose.len() != rows {
        return Err(malformed(format!(
            "{} adjclose values for {rows} quote rows",
            adjclose.len()
        )));
    }
    frame.with_column(Series::new("adjclose".into(), adjclose))?;

    let days = millis
        .iter()
        .map(|ms| ms.div_euclid(SECONDS_PER_DAY * 1000) * SECONDS_PER_DAY * 1000)
        .collect();
    frame.with_column(datetime_series("day", days)?)?;

    let frame = frame.select(PERIOD_COLUMNS)?;
    Ok(FetchOutcome::Table(PriceTable::period(symbol, interval, frame)))
}

fn quote_frame(quote: QuoteColumns) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new("open".into(), quote.open).into(),
        Series::new("high".into(), quote.high).into(),
        Series::new("low".into(), quote.low).into(),
        Series::new("close".into(), quote.close).into(),
        Series::new("volume".into(), quote.volume).into(),
    ])
}

fn datetime_series(name: &str, millis: Vec<i64>) -> PolarsResult<Series> {
    Series::new(name.into(), millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_DAYS: &str = r#"{"chart":{"result":[{
        "timestamp":[1577975400,1578061800,1578321000],
        "indicators":{
            "quote":[{"open":[74.06,74.29,73.45],"high":[75.15,75.14,74.99],
                      "low":[73.8,74.13,73.19],"close":[75.09,74.36,74.95],
                      "volume":[135480400,146322800,118387200]}],
            "adjclose":[{"adjclose":[73.06,72.35,72.93]}]}}],"error":null}}"#;

    #[test]
    fn period_table_has_fixed_columns() {
        let outcome = shape_response("AAPL", Interval::Daily, THREE_DAYS.as_bytes()).unwrap();
        let table = outcome.into_table().unwrap();
        assert_eq!(table.height(), 3);
        assert_eq!(table.column_names(), PERIOD_COLUMNS);
        assert_eq!(table.symbol(), "AAPL");
    }

    #[test]
    fn intraday_drops_adjclose_even_if_sent() {
        let outcome = shape_response("AAPL", Interval::Minute, THREE_DAYS.as_bytes()).unwrap();
        let table = outcome.into_table().unwrap();
        assert_eq!(table.column_names(), INTRADAY_COLUMNS);
        assert_eq!(table.index().map(|s| s.len()), Some(3));
    }

    #[test]
    fn empty_quote_is_no_rows() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}],"adjclose":[{}]}}]}}"#;
        let outcome = shape_response("X", Interval::Daily, body.as_bytes()).unwrap();
        assert!(matches!(outcome, FetchOutcome::Empty(EmptyReason::NoRows)));
        assert!(outcome.is_no_data());
    }

    #[test]
    fn not_json_is_malformed() {
        let err = shape_response("X", Interval::Daily, b"<html>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { symbol, .. } if symbol == "X"));
    }

    #[test]
    fn empty_result_array_is_malformed() {
        let err = shape_response("X", Interval::Daily, br#"{"chart":{"result":[]}}"#).unwrap_err();
        assert!(err.to_string().contains("result array is empty"));
    }

    #[test]
    fn free_fetch_rejects_bad_interval_before_any_client() {
        let err = fetch("X", None, None, Some("1h")).unwrap_err();
        assert!(matches!(err, FetchError::InvalidInterval { interval } if interval == "1h"));
    }
}
