//! Price history retrieval: query construction, transport, response shaping.

pub(crate) mod chart;
pub mod config;
pub mod date_like;
pub mod error;
pub mod fetcher;
pub mod interval;
pub mod query;
pub mod table;
pub mod transport;

pub use config::FetchConfig;
pub use date_like::DateLike;
pub use error::{ConfigError, FetchError, QueryError, TransportError};
pub use fetcher::{fetch, EmptyReason, FetchOutcome, SeriesFetcher, TransportFailure};
pub use interval::Interval;
pub use query::{
    build_query, QueryBuilder, QueryParams, QuerySpec, DEFAULT_BASE_URL, DEFAULT_START_SECONDS,
};
pub use table::{PriceTable, INTRADAY_COLUMNS, PERIOD_COLUMNS};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
