//! Column-width reduction.
//!
//! Each numeric column is cast to the narrowest width whose range strictly
//! contains the column's observed minimum and maximum. Non-numeric columns are
//! dropped unless [`NarrowOptions::drop_non_numeric`] is cleared.
//!
//! Integers climb a signed ladder (8, 16, 32, 64 bits). Floats climb 16, 32,
//! 64 bits; polars has no half-precision dtype, so a column that fits 16 bits
//! is stored as `Float32` and reported as [`NumericWidth::Float16`].

use log::debug;
use polars::prelude::*;

/// Largest finite half-precision value.
const F16_MAX: f64 = 65_504.0;

/// A target width on the narrowing ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericWidth {
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
}

impl NumericWidth {
    pub fn bits(self) -> u8 {
        match self {
            NumericWidth::Int8 => 8,
            NumericWidth::Int16 | NumericWidth::Float16 => 16,
            NumericWidth::Int32 | NumericWidth::Float32 => 32,
            NumericWidth::Int64 | NumericWidth::Float64 => 64,
        }
    }

    /// Physical dtype used to store this width.
    pub fn storage_dtype(self) -> DataType {
        match self {
            NumericWidth::Int8 => DataType::Int8,
            NumericWidth::Int16 => DataType::Int16,
            NumericWidth::Int32 => DataType::Int32,
            NumericWidth::Int64 => DataType::Int64,
            NumericWidth::Float16 | NumericWidth::Float32 => DataType::Float32,
            NumericWidth::Float64 => DataType::Float64,
        }
    }
}

const INT_LADDER: [(NumericWidth, i128, i128); 4] = [
    (NumericWidth::Int8, i8::MIN as i128, i8::MAX as i128),
    (NumericWidth::Int16, i16::MIN as i128, i16::MAX as i128),
    (NumericWidth::Int32, i32::MIN as i128, i32::MAX as i128),
    (NumericWidth::Int64, i64::MIN as i128, i64::MAX as i128),
];

/// Narrowest signed width with `lo < min` and `max < hi`, if any.
pub fn select_int_width(min: i128, max: i128) -> Option<NumericWidth> {
    INT_LADDER
        .iter()
        .find(|(_, lo, hi)| min > *lo && max < *hi)
        .map(|(width, _, _)| *width)
}

/// Narrowest float width with a strictly containing range; `Float64` otherwise.
pub fn select_float_width(min: f64, max: f64) -> NumericWidth {
    if min > -F16_MAX && max < F16_MAX {
        NumericWidth::Float16
    } else if min > f32::MIN as f64 && max < f32::MAX as f64 {
        NumericWidth::Float32
    } else {
        NumericWidth::Float64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrowOptions {
    /// Remove every column that is not a fixed-width integer or float.
    pub drop_non_numeric: bool,
}

impl Default for NarrowOptions {
    fn default() -> Self {
        Self {
            drop_non_numeric: true,
        }
    }
}

/// What happened to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnAction {
    Narrowed { from: DataType, to: NumericWidth },
    Unchanged { dtype: DataType },
    Dropped { dtype: DataType },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnOutcome {
    pub name: String,
    pub action: ColumnAction,
}

/// Per-column actions and estimated heap size before and after.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrowReport {
    pub columns: Vec<ColumnOutcome>,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

impl NarrowReport {
    pub fn dropped(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match c.action {
            ColumnAction::Dropped { .. } => Some(c.name.as_str()),
            _ => None,
        })
    }

    pub fn bytes_saved(&self) -> usize {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

enum NumericKind {
    Integer,
    Float,
}

fn numeric_kind(dtype: &DataType) -> Option<NumericKind> {
    if dtype.is_integer() {
        Some(NumericKind::Integer)
    } else if dtype.is_float() {
        Some(NumericKind::Float)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnNarrower {
    options: NarrowOptions,
}

impl ColumnNarrower {
    pub fn new(options: NarrowOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> NarrowOptions {
        self.options
    }

    pub fn narrow(&self, frame: DataFrame) -> PolarsResult<DataFrame> {
        self.narrow_with_report(frame).map(|(frame, _)| frame)
    }

    pub fn narrow_with_report(&self, frame: DataFrame) -> PolarsResult<(DataFrame, NarrowReport)> {
        let bytes_before = frame.estimated_size();
        let mut kept: Vec<PlSmallStr> = Vec::with_capacity(frame.width());
        let mut cast: Vec<Column> = Vec::new();
        let mut outcomes = Vec::with_capacity(frame.width());

        for column in frame.get_columns() {
            let name = column.name().to_string();
            let dtype = column.dtype().clone();

            let width = match numeric_kind(&dtype) {
                None => {
                    if self.options.drop_non_numeric {
                        outcomes.push(ColumnOutcome {
                            name,
                            action: ColumnAction::Dropped { dtype },
                        });
                    } else {
                        kept.push(column.name().clone());
                        outcomes.push(ColumnOutcome {
                            name,
                            action: ColumnAction::Unchanged { dtype },
                        });
                    }
                    continue;
                }
                Some(kind) => target_width(column.as_materialized_series(), kind)?,
            };

            match width {
                Some(to) if to.storage_dtype() != dtype => {
                    kept.push(column.name().clone());
                    cast.push(column.cast(&to.storage_dtype())?);
                    outcomes.push(ColumnOutcome {
                        name,
                        action: ColumnAction::Narrowed { from: dtype, to },
                    });
                }
                _ => {
                    kept.push(column.name().clone());
                    outcomes.push(ColumnOutcome {
                        name,
                        action: ColumnAction::Unchanged { dtype },
                    });
                }
            }
        }

        // select from the input so the height survives even when nothing is kept
        let mut narrowed = frame.select(kept)?;
        for column in cast {
            narrowed.with_column(column)?;
        }
        let bytes_after = narrowed.estimated_size();
        debug!(
            "narrowed frame: {:.3} MB -> {:.3} MB",
            bytes_before as f64 / 1024.0 / 1024.0,
            bytes_after as f64 / 1024.0 / 1024.0
        );

        Ok((
            narrowed,
            NarrowReport {
                columns: outcomes,
                bytes_before,
                bytes_after,
            },
        ))
    }
}

/// Width for a numeric series, `None` when it has no observed range or no
/// integer width fits.
fn target_width(series: &Series, kind: NumericKind) -> PolarsResult<Option<NumericWidth>> {
    Ok(match kind {
        NumericKind::Integer => {
            match (series.min::<i128>()?, series.max::<i128>()?) {
                (Some(min), Some(max)) => select_int_width(min, max),
                _ => None,
            }
        }
        NumericKind::Float => match (series.min::<f64>()?, series.max::<f64>()?) {
            (Some(min), Some(max)) => Some(select_float_width(min, max)),
            _ => None,
        },
    })
}

/// [`ColumnNarrower::narrow`] with default options (non-numeric columns dropped).
pub fn narrow(frame: DataFrame) -> PolarsResult<DataFrame> {
    ColumnNarrower::default().narrow(frame)
}
