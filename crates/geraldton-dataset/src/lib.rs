#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/geraldton/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod filter;
pub mod label;
pub mod windows;

pub use error::DatasetError;
pub use filter::{Dataset, FilterConfig, FilterReport, QualityFilter};
pub use label::{
    ExclusionReason, LabelConfig, LabelOutcome, LabelSet, LabelWindow, Labeler, TickerLabels,
    WindowAssessment,
};
pub use windows::select_year_window;
