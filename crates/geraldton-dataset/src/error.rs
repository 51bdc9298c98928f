//! Error types for dataset assembly.

use thiserror::Error;

/// Errors that can occur during labeling and filtering.
///
/// Every variant is a structural invariant violation: data-quality problems
/// never surface here, they are carried per ticker as
/// [`crate::label::ExclusionReason`] values instead.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Feature row count disagrees with the ticker list
    #[error("feature matrix has {features} rows but {tickers} tickers")]
    TickerMismatch {
        /// Rows in the feature matrix
        features: usize,
        /// Entries in the ticker list
        tickers: usize,
    },

    /// Column names disagree with the feature matrix width
    #[error("feature matrix has {columns} columns but {names} column names")]
    NameMismatch {
        /// Columns in the feature matrix
        columns: usize,
        /// Entries in the name list
        names: usize,
    },

    /// Label outcomes disagree with the ticker list
    #[error("label set has {outcomes} outcomes but {tickers} tickers")]
    LabelMismatch {
        /// Entries in the label set
        outcomes: usize,
        /// Entries in the ticker list
        tickers: usize,
    },
}
