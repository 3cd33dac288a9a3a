//! Yahoo Finance v8 chart API response.
//!
//! Every level is optional on the wire: the provider omits fields rather than
//! sending empty arrays when it has no data. Shape checks live in the fetcher.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartEnvelope {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartData {
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteData>,
    pub adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuoteData {
    pub open: Option<Vec<Option<f64>>>,
    pub high: Option<Vec<Option<f64>>>,
    pub low: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
    pub volume: Option<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdjCloseData {
    pub adjclose: Option<Vec<Option<f64>>>,
}

/// The five quote arrays, all present and of equal length.
#[derive(Debug)]
pub(crate) struct QuoteColumns {
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<i64>>,
}

impl ChartEnvelope {
    /// `chart.result[0]`, or a description of why it is missing.
    pub fn into_first_result(self) -> Result<ChartData, String> {
        match self.result {
            Some(results) => results
                .into_iter()
                .next()
                .ok_or_else(|| "result array is empty".to_string()),
            None => Err(match self.error {
                Some(err) => format!("{}: {}", err.code, err.description),
                None => "empty result with no error".to_string(),
            }),
        }
    }
}

impl QuoteData {
    fn lengths(&self) -> [(&'static str, Option<usize>); 5] {
        [
            ("open", self.open.as_ref().map(Vec::len)),
            ("high", self.high.as_ref().map(Vec::len)),
            ("low", self.low.as_ref().map(Vec::len)),
            ("close", self.close.as_ref().map(Vec::len)),
            ("volume", self.volume.as_ref().map(Vec::len)),
        ]
    }

    /// Row count implied by the fields that are present.
    ///
    /// An object with no fields has zero rows. Present fields must agree.
    pub fn row_count(&self) -> Result<usize, String> {
        let present: Vec<(&str, usize)> = self
            .lengths()
            .into_iter()
            .filter_map(|(name, len)| len.map(|len| (name, len)))
            .collect();

        let Some(&(first_name, rows)) = present.first() else {
            return Ok(0);
        };
        match present.iter().find(|(_, len)| *len != rows) {
            Some((name, len)) => Err(format!(
                "quote arrays differ in length: {first_name} has {rows}, {name} has {len}"
            )),
            None => Ok(rows),
        }
    }

    pub fn into_columns(self) -> Result<QuoteColumns, String> {
        let missing = |field: &str| format!("quote field '{field}' is missing");
        Ok(QuoteColumns {
            open: self.open.ok_or_else(|| missing("open"))?,
            high: self.high.ok_or_else(|| missing("high"))?,
            low: self.low.ok_or_else(|| missing("low"))?,
            close: self.close.ok_or_else(|| missing("close"))?,
            volume: self.volume.ok_or_else(|| missing("volume"))?,
        })
    }
}

impl Indicators {
    /// `indicators.adjclose[0].adjclose`, if the provider sent it.
    pub fn take_adjclose(&mut self) -> Option<Vec<Option<f64>>> {
        self.adjclose
            .take()
            .and_then(|v| v.into_iter().next())
            .and_then(|a| a.adjclose)
    }
}
