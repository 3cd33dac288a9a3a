//! Stonk Core: historical price retrieval and frame narrowing.
//!
//! - [`data`]: build a chart query, fetch it over HTTP, and shape the JSON
//!   into a [`PriceTable`] of OHLCV rows
//! - [`narrow`]: shrink a `polars` frame by casting numeric columns to the
//!   narrowest width that holds their observed range
//! - [`clock`]: injectable wall clock for query construction
//!
//! Provider failures are values, not errors: [`FetchOutcome::is_no_data`] is
//! true for every outcome without a table.

pub mod clock;
pub mod data;
pub mod narrow;

pub use clock::{Clock, FixedClock, SystemClock};
pub use data::{
    build_query, fetch, DateLike, EmptyReason, FetchConfig, FetchError, FetchOutcome, Interval,
    PriceTable, QueryBuilder, QuerySpec, SeriesFetcher, Transport, TransportFailure,
};
pub use narrow::{narrow, ColumnNarrower, NarrowOptions, NarrowReport, NumericWidth};
