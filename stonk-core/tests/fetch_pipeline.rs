//! Integration tests for the fetch pipeline against a canned transport.

use polars::prelude::*;
use std::sync::{Arc, Mutex};
use stonk_core::data::{
    EmptyReason, FetchError, FetchOutcome, HttpResponse, QueryBuilder, SeriesFetcher, Transport,
    TransportError, TransportFailure, DEFAULT_START_SECONDS, INTRADAY_COLUMNS, PERIOD_COLUMNS,
};
use stonk_core::FixedClock;

const NOW: i64 = 1_700_000_000;

// ── Canned transport ─────────────────────────────────────────────────

type Call = (String, Vec<(String, String)>);

struct Canned {
    reply: Mutex<Option<Result<HttpResponse, TransportError>>>,
    calls: Mutex<Vec<Call>>,
}

/// Shared handle so the test can inspect calls after boxing the transport.
struct Handle(Arc<Canned>);

impl Transport for Handle {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        self.0.calls.lock().unwrap().push((
            url.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));
        self.0
            .reply
            .lock()
            .unwrap()
            .take()
            .expect("transport called more than once")
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fetcher_with(reply: Result<HttpResponse, TransportError>) -> (SeriesFetcher, Arc<Canned>) {
    init_logging();
    let canned = Arc::new(Canned {
        reply: Mutex::new(Some(reply)),
        calls: Mutex::new(Vec::new()),
    });
    let clock = FixedClock::at_epoch_seconds(NOW).unwrap();
    let query = QueryBuilder::with_clock(Arc::new(clock))
        .with_base_url("http://quotes.test/v8/finance/chart/");
    let fetcher =
        SeriesFetcher::new(Box::new(Handle(Arc::clone(&canned)))).with_query_builder(query);
    (fetcher, canned)
}

fn ok_json(body: &str) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(200, body))
}

fn millis(column: &Column) -> Vec<Option<i64>> {
    column
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

const DAILY_BODY: &str = r#"{"chart":{"result":[{
    "meta":{"currency":"USD","symbol":"AAPL"},
    "timestamp":[1577975400,1578061800,1578321000],
    "events":{"dividends":{}},
    "indicators":{
        "quote":[{"volume":[135480400,146322800,null],
                  "open":[74.06,74.29,73.45],"high":[75.15,75.14,74.99],
                  "low":[73.8,74.13,73.19],"close":[75.09,74.36,null]}],
        "adjclose":[{"adjclose":[73.06,72.35,72.93]}]}}],"error":null}}"#;

const MINUTE_BODY: &str = r#"{"chart":{"result":[{
    "timestamp":[1700000040,1700000100],
    "indicators":{
        "quote":[{"open":[189.1,189.2],"high":[189.3,189.4],
                  "low":[189.0,189.1],"close":[189.2,189.3],
                  "volume":[1200,900]}]}}],"error":null}}"#;

// ── Contract violations ──────────────────────────────────────────────

#[test]
fn invalid_interval_never_reaches_transport() {
    for bad in ["1h", "5m", "1WK", "daily", ""] {
        let (fetcher, canned) = fetcher_with(ok_json(DAILY_BODY));
        let err = fetcher.fetch("AAPL", None, None, bad).unwrap_err();
        match err {
            FetchError::InvalidInterval { interval } => assert_eq!(interval, bad),
            other => panic!("expected InvalidInterval, got: {other:?}"),
        }
        assert!(canned.calls.lock().unwrap().is_empty(), "{bad:?} hit the network");
    }
}

#[test]
fn invalid_date_never_reaches_transport() {
    let (fetcher, canned) = fetcher_with(ok_json(DAILY_BODY));
    let err = fetcher
        .fetch("AAPL", Some("someday".into()), None, "1d")
        .unwrap_err();
    assert!(matches!(err, FetchError::Query(_)));
    assert!(canned.calls.lock().unwrap().is_empty());
}

// ── Request shape ────────────────────────────────────────────────────

#[test]
fn request_carries_endpoint_and_params() {
    let (fetcher, canned) = fetcher_with(ok_json(DAILY_BODY));
    fetcher.fetch("AAPL", None, None, "1mo").unwrap();

    let calls = canned.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (url, query) = &calls[0];
    assert_eq!(url, "http://quotes.test/v8/finance/chart/AAPL");
    assert_eq!(
        query,
        &vec![
            ("period1".to_string(), DEFAULT_START_SECONDS.to_string()),
            ("period2".to_string(), NOW.to_string()),
            ("interval".to_string(), "1mo".to_string()),
            ("events".to_string(), "div,splits".to_string()),
        ]
    );
}

// ── Period tables ────────────────────────────────────────────────────

#[test]
fn daily_table_has_three_rows_in_fixed_order() {
    let (fetcher, _) = fetcher_with(ok_json(DAILY_BODY));
    let outcome = fetcher
        .fetch("AAPL", Some("2020-01-01".into()), Some("2020-01-07".into()), "1d")
        .unwrap();
    assert!(!outcome.is_no_data());

    let table = outcome.into_table().unwrap();
    assert_eq!(table.height(), 3);
    assert_eq!(table.column_names(), PERIOD_COLUMNS);
    assert!(table.index().is_none());

    let frame = table.frame();
    assert_eq!(
        frame.column("day").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Milliseconds, None)
    );
    // 14:30 UTC trades truncate to midnight of the same date
    assert_eq!(
        millis(frame.column("day").unwrap()),
        vec![
            Some(1_577_923_200_000),
            Some(1_578_009_600_000),
            Some(1_578_268_800_000),
        ]
    );

    let adjclose = frame.column("adjclose").unwrap().f64().unwrap();
    assert_eq!(adjclose.get(1), Some(72.35));
}

#[test]
fn null_slots_survive_as_nulls() {
    let (fetcher, _) = fetcher_with(ok_json(DAILY_BODY));
    let table = fetcher
        .fetch("AAPL", None, None, "1wk")
        .unwrap()
        .into_table()
        .unwrap();

    let close = table.frame().column("close").unwrap().f64().unwrap();
    assert_eq!(close.get(2), None);
    let volume = table.frame().column("volume").unwrap().i64().unwrap();
    assert_eq!(volume.get(0), Some(135_480_400));
    assert_eq!(volume.get(2), None);
}

#[test]
fn missing_adjclose_on_period_interval_is_malformed() {
    let (fetcher, _) = fetcher_with(ok_json(MINUTE_BODY));
    let err = fetcher.fetch("AAPL", None, None, "1d").unwrap_err();
    assert!(
        matches!(err, FetchError::MalformedResponse { ref detail, .. } if detail.contains("adjclose"))
    );
}

// ── Minute tables ────────────────────────────────────────────────────

#[test]
fn minute_table_is_keyed_by_exact_timestamps() {
    let (fetcher, _) = fetcher_with(ok_json(MINUTE_BODY));
    let table = fetcher
        .fetch("AAPL", Some(1_699_999_000_i64.into()), None, "1m")
        .unwrap()
        .into_table()
        .unwrap();

    assert_eq!(table.column_names(), INTRADAY_COLUMNS);
    assert!(table.frame().column("adjclose").is_err());

    let index = table.index().unwrap();
    assert_eq!(index.name().as_str(), "timestamp");
    assert_eq!(
        millis(&index.clone().into()),
        vec![Some(1_700_000_040_000), Some(1_700_000_100_000)]
    );
}

#[test]
fn long_minute_range_still_issues_request() {
    let (fetcher, canned) = fetcher_with(ok_json(MINUTE_BODY));
    let outcome = fetcher.fetch("AAPL", None, None, "1m").unwrap();
    assert!(outcome.table().is_some());
    assert_eq!(canned.calls.lock().unwrap().len(), 1);
}

// ── No-data outcomes ─────────────────────────────────────────────────

#[test]
fn zero_quote_rows_is_no_data() {
    let body = r#"{"chart":{"result":[{"timestamp":[],"indicators":{"quote":[{"open":[],"high":[],"low":[],"close":[],"volume":[]}],"adjclose":[{"adjclose":[]}]}}],"error":null}}"#;
    let (fetcher, _) = fetcher_with(ok_json(body));
    let outcome = fetcher.fetch("AAPL", None, None, "1d").unwrap();
    assert!(matches!(outcome, FetchOutcome::Empty(EmptyReason::NoRows)));
    assert!(outcome.is_no_data());
}

#[test]
fn missing_timestamp_is_no_data() {
    let body = r#"{"chart":{"result":[{"indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[5]}],"adjclose":[{"adjclose":[1.0]}]}}],"error":null}}"#;
    let (fetcher, _) = fetcher_with(ok_json(body));
    let outcome = fetcher.fetch("AAPL", None, None, "1d").unwrap();
    assert!(matches!(
        outcome,
        FetchOutcome::Empty(EmptyReason::MissingTimestamps)
    ));
    assert!(outcome.into_table().is_none());
}

#[test]
fn http_error_status_is_no_data_not_error() {
    let (fetcher, _) = fetcher_with(Ok(HttpResponse::new(404, r#"{"chart":{"result":null}}"#)));
    let outcome = fetcher.fetch("NOPE", None, None, "1d").unwrap();
    assert!(matches!(
        outcome,
        FetchOutcome::TransportFailed(TransportFailure::Status(404))
    ));
    assert!(outcome.is_no_data());
}

#[test]
fn unreachable_provider_is_no_data_not_error() {
    let (fetcher, _) = fetcher_with(Err(TransportError::NetworkUnreachable(
        "connection refused".into(),
    )));
    let outcome = fetcher.fetch("AAPL", None, None, "1d").unwrap();
    assert!(matches!(
        outcome,
        FetchOutcome::TransportFailed(TransportFailure::Unreachable(_))
    ));
}

// ── Malformed payloads ───────────────────────────────────────────────

#[test]
fn timestamp_count_mismatch_is_malformed() {
    let body = r#"{"chart":{"result":[{"timestamp":[1,2],"indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[5]}],"adjclose":[{"adjclose":[1.0]}]}}]}}"#;
    let (fetcher, _) = fetcher_with(ok_json(body));
    let err = fetcher.fetch("AAPL", None, None, "1d").unwrap_err();
    assert!(err.to_string().contains("2 timestamps for 1 quote rows"));
}

#[test]
fn provider_error_envelope_is_malformed() {
    let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
    let (fetcher, _) = fetcher_with(ok_json(body));
    let err = fetcher.fetch("ZZZZ", None, None, "1d").unwrap_err();
    match err {
        FetchError::MalformedResponse { symbol, detail } => {
            assert_eq!(symbol, "ZZZZ");
            assert!(detail.starts_with("Not Found"));
        }
        other => panic!("expected MalformedResponse, got: {other:?}"),
    }
}
