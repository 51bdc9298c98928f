#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/geraldton/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dictionary;
pub mod error;
pub mod parse;
pub mod prices;
pub mod tensor;

pub use dictionary::{FeatureDictionary, RATIO_KEY_PREFIX};
pub use error::{DataError, Result};
pub use parse::{Record, scan_records};
pub use prices::PriceSeries;
pub use tensor::{RawDataset, TensorBuilder, TensorConfig};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
