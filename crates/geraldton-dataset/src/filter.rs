//! Three-pass quality filter and final dataset assembly.
//!
//! The passes run in a fixed order, each on the survivor of the previous
//! one:
//!
//! 1. drop feature columns whose share of missing values exceeds the
//!    configured threshold (default 0, so any remaining hole disqualifies
//!    the column),
//! 2. drop every column of a ratio whose column group is no longer
//!    complete — a ratio either keeps all of its periods or none,
//! 3. drop the rows of tickers the labeler excluded.
//!
//! Rows and columns are never reordered, only removed, so the surviving
//! tickers, names, and labels stay aligned by construction.

use crate::error::DatasetError;
use crate::label::{LabelOutcome, LabelSet};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Configuration for the quality filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Maximum tolerated share of missing values per column (default: 0.0).
    pub missing_threshold: f64,

    /// Columns a ratio group must retain to survive the completeness pass
    /// (default: 11, one per reporting period).
    pub periods: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            missing_threshold: 0.0,
            periods: 11,
        }
    }
}

/// Shape of the data after each filtering pass, for run reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Shape before any pass, as (rows, columns).
    pub raw: (usize, usize),
    /// Shape after the missing-value column pass.
    pub after_missing: (usize, usize),
    /// Shape after the ratio-completeness column pass.
    pub after_completeness: (usize, usize),
    /// Shape after the unqualified-ticker row pass.
    pub after_exclusions: (usize, usize),
}

/// The assembled supervised-learning dataset.
///
/// All fields are aligned: `features` row *i* belongs to `tickers[i]` and
/// carries labels `train_labels[i]` / `test_labels[i]`; `features` column
/// *j* is named by `feature_names[j]`.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Surviving tickers, in admission order.
    pub tickers: Vec<String>,
    /// Surviving feature matrix, tickers × named columns.
    pub features: Array2<f64>,
    /// Names of the surviving columns.
    pub feature_names: Vec<String>,
    /// Train-window labels, one per surviving ticker.
    pub train_labels: Vec<u8>,
    /// Test-window labels, one per surviving ticker.
    pub test_labels: Vec<u8>,
}

/// Applies the three filtering passes.
#[derive(Debug, Default)]
pub struct QualityFilter {
    config: FilterConfig,
}

impl QualityFilter {
    /// Create a filter with the given configuration.
    pub const fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Run all three passes and assemble the final dataset.
    ///
    /// # Errors
    /// Fails when the inputs are structurally misaligned: column names vs.
    /// matrix width, tickers vs. matrix height, or label outcomes vs.
    /// tickers.
    pub fn apply(
        &self,
        features: Array2<f64>,
        names: Vec<String>,
        tickers: Vec<String>,
        labels: &LabelSet,
    ) -> Result<(Dataset, FilterReport), DatasetError> {
        if names.len() != features.ncols() {
            return Err(DatasetError::NameMismatch {
                columns: features.ncols(),
                names: names.len(),
            });
        }
        if tickers.len() != features.nrows() {
            return Err(DatasetError::TickerMismatch {
                features: features.nrows(),
                tickers: tickers.len(),
            });
        }
        if labels.outcomes.len() != tickers.len() {
            return Err(DatasetError::LabelMismatch {
                outcomes: labels.outcomes.len(),
                tickers: tickers.len(),
            });
        }

        let raw = features.dim();

        let keep = self.columns_within_missing_threshold(&features);
        let features = select_columns(&features, &keep);
        let names = select_vec(names, &keep);
        let after_missing = features.dim();
        info!(
            columns = after_missing.1,
            "missing-value pass kept {} of {} columns", after_missing.1, raw.1
        );

        let keep = self.complete_ratio_columns(&names);
        let features = select_columns(&features, &keep);
        let names = select_vec(names, &keep);
        let after_completeness = features.dim();
        info!(
            columns = after_completeness.1,
            "completeness pass kept {} of {} columns", after_completeness.1, after_missing.1
        );

        let keep: Vec<bool> = labels.outcomes.iter().map(LabelOutcome::is_admitted).collect();
        let features = select_rows(&features, &keep);
        let tickers = select_vec(tickers, &keep);
        let after_exclusions = features.dim();
        info!(
            rows = after_exclusions.0,
            "exclusion pass kept {} of {} tickers", after_exclusions.0, raw.0
        );

        let mut train_labels = Vec::with_capacity(tickers.len());
        let mut test_labels = Vec::with_capacity(tickers.len());
        for outcome in &labels.outcomes {
            if let LabelOutcome::Admitted(ticker_labels) = outcome {
                train_labels.push(ticker_labels.train.label);
                test_labels.push(ticker_labels.test.label);
            }
        }

        let dataset = Dataset {
            tickers,
            features,
            feature_names: names,
            train_labels,
            test_labels,
        };
        let report = FilterReport {
            raw,
            after_missing,
            after_completeness,
            after_exclusions,
        };
        Ok((dataset, report))
    }

    fn columns_within_missing_threshold(&self, features: &Array2<f64>) -> Vec<bool> {
        let rows = features.nrows();
        features
            .axis_iter(Axis(1))
            .map(|column| {
                if rows == 0 {
                    return true;
                }
                let missing = column.iter().filter(|v| v.is_nan()).count();
                missing as f64 / rows as f64 <= self.config.missing_threshold
            })
            .collect()
    }

    fn complete_ratio_columns(&self, names: &[String]) -> Vec<bool> {
        let mut group_sizes: HashMap<&str, usize> = HashMap::new();
        for name in names {
            *group_sizes.entry(ratio_of(name)).or_insert(0) += 1;
        }
        names
            .iter()
            .map(|name| group_sizes[ratio_of(name)] == self.config.periods)
            .collect()
    }
}

/// Ratio part of a `<ratio>__<period>` column name.
fn ratio_of(name: &str) -> &str {
    name.split_once("__").map_or(name, |(ratio, _)| ratio)
}

fn select_columns(features: &Array2<f64>, keep: &[bool]) -> Array2<f64> {
    let indices: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect();
    features.select(Axis(1), &indices)
}

fn select_rows(features: &Array2<f64>, keep: &[bool]) -> Array2<f64> {
    let indices: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect();
    features.select(Axis(0), &indices)
}

fn select_vec<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(value, &k)| k.then_some(value))
        .collect()
}
