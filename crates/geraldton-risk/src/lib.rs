#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/geraldton/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod returns;
pub mod stats;

pub use returns::simple_returns;
pub use stats::{CvarEstimate, RiskConfig, RiskEngine, RiskError, RiskStats};
