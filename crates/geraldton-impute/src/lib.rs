#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/geraldton/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod imputer;
pub mod linear;
pub mod spline;

pub use imputer::{ImputeConfig, ImputeError, Imputer};
pub use linear::LinearFit;
pub use spline::CubicSpline;
