//! Error types for corpus and tensor operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading the corpus or assembling the tensor.
///
/// Per-record problems (malformed pairs, wrong-length ratio rows, short price
/// histories) are deliberately *not* errors: the parser skips them and the
/// tensor builder excludes the affected ticker. Only structural problems that
/// make the run meaningless surface here.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The ratio dictionary contained no entries
    #[error("feature dictionary is empty")]
    EmptyDictionary,

    /// The corpus never defined the shared time horizon
    #[error("corpus defines no time horizon of length {expected} (missing `key_ratios_Time`)")]
    MissingTimeHorizon {
        /// Number of period labels the horizon must carry
        expected: usize,
    },

    /// Internal shape bookkeeping disagreed with the admitted-ticker count
    #[error("feature storage shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
