//! Row-by-row, cell-by-cell comparison of two record sets.
//!
//! Records from each side are indexed by a composite identification key, every
//! distinct key becomes one [`ComparisonRow`], and the result carries a derived
//! [`ComparisonSummary`]. [`column_stats`] aggregates per-column match rates.

pub mod engine;
pub mod model;
pub mod stats;
pub mod validate;

pub use engine::{compare, composite_key};
pub use model::{
    CellComparison, ComparisonResult, ComparisonRow, ComparisonSummary, DuplicateCounts, Record,
    RowStatus, Value, value_of, values_match,
};
pub use stats::{ColumnStats, ColumnVerdict, column_stats};
pub use validate::{ComparisonRequest, DuplicateKey, common_columns, find_duplicate_keys};
