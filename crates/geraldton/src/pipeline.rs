//! End-to-end pipeline: raw text in, labeled dataset out.
//!
//! Stage order is fixed: record scan, tensor construction, missing-value
//! repair, per-ticker risk assessment, labeling, quality filter. Each stage
//! is owned by its crate; this module only wires configurations together
//! and carries a [`RunSummary`] for reporting.

use geraldton_data::{
    DataError, FeatureDictionary, RawDataset, TensorBuilder, TensorConfig, scan_records,
};
use geraldton_dataset::{
    Dataset, DatasetError, ExclusionReason, FilterConfig, FilterReport, LabelConfig, Labeler,
    QualityFilter, TickerLabels,
};
use geraldton_impute::{ImputeConfig, ImputeError, Imputer};
use geraldton_risk::{RiskConfig, RiskEngine, RiskError, RiskStats};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::info;

/// Errors from any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Tensor construction failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Missing-value repair failed or was misconfigured.
    #[error(transparent)]
    Impute(#[from] ImputeError),

    /// Risk engine was misconfigured.
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Labeling or filtering hit a structural invariant violation.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Configuration for every stage of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Tensor construction settings.
    pub tensor: TensorConfig,
    /// Missing-value repair settings.
    pub impute: ImputeConfig,
    /// Risk statistics settings.
    pub risk: RiskConfig,
    /// Labeling settings.
    pub label: LabelConfig,
    /// Quality filter settings.
    pub filter: FilterConfig,
}

impl PipelineConfig {
    /// Set the reporting-period count consistently across the stages that
    /// depend on it. The three settings must always agree; this is the only
    /// supported way to change them together.
    pub const fn set_periods(&mut self, periods: usize) {
        self.tensor.periods = periods;
        self.impute.periods = periods;
        self.filter.periods = periods;
    }
}

/// What happened during a run, for stage reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Shape of the admitted feature matrix before filtering.
    pub raw_shape: (usize, usize),
    /// Period labels shared by every ratio block.
    pub time_horizon: Vec<String>,
    /// Tickers that survived labeling and filtering.
    pub labeled_tickers: usize,
    /// Per-ticker window assessments for the labeled tickers, in admission
    /// order: realized returns, Sortino/Sharpe ratios, CVaR, labels.
    pub ticker_labels: Vec<TickerLabels>,
    /// Tickers the labeler excluded, with reasons.
    pub exclusions: Vec<(String, ExclusionReason)>,
    /// Train-window label distribution over the surviving tickers.
    pub train_label_counts: BTreeMap<u8, usize>,
    /// Shapes after each filtering pass.
    pub filter: FilterReport,
}

/// Wires the stage crates into one run.
#[derive(Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every stage over a raw text dump.
    ///
    /// # Errors
    /// Fails on misconfiguration, on a corpus with no usable time horizon,
    /// or on a structural invariant violation between stages. Per-ticker
    /// data problems never fail the run; they surface as exclusions in the
    /// summary.
    pub fn run(
        &self,
        text: &str,
        dict: &FeatureDictionary,
    ) -> Result<(Dataset, RunSummary), PipelineError> {
        // Constructor validation happens before any parsing work.
        let imputer = Imputer::new(self.config.impute.clone())?;
        let engine = RiskEngine::new(self.config.risk.clone())?;
        let labeler = Labeler::new(self.config.label.clone());
        let filter = QualityFilter::new(self.config.filter.clone());

        let mut builder = TensorBuilder::new(dict, self.config.tensor.clone());
        builder.extend(scan_records(text));
        let mut raw = builder.finish()?;
        let raw_shape = raw.features.dim();
        info!(
            tickers = raw_shape.0,
            columns = raw_shape.1,
            "tensor construction complete"
        );

        imputer.repair_matrix(&mut raw.features)?;

        let stats = assess_all(&engine, &raw);
        let names = dict.column_names(&raw.time_horizon);
        let labels = labeler.label_all(&raw.tickers, raw.features.nrows(), &raw.prices, &stats)?;
        let ticker_labels: Vec<TickerLabels> = labels.admitted().cloned().collect();
        let exclusions: Vec<(String, ExclusionReason)> = labels
            .excluded()
            .map(|(ticker, reason)| (ticker.to_string(), reason))
            .collect();
        let train_label_counts = labels.train_label_counts();

        let RawDataset {
            tickers,
            features,
            time_horizon,
            ..
        } = raw;
        let (dataset, report) = filter.apply(features, names, tickers, &labels)?;

        let summary = RunSummary {
            raw_shape,
            time_horizon,
            labeled_tickers: dataset.tickers.len(),
            ticker_labels,
            exclusions,
            train_label_counts,
            filter: report,
        };
        Ok((dataset, summary))
    }

}

fn assess_all(engine: &RiskEngine, raw: &RawDataset) -> HashMap<String, RiskStats> {
    raw.tickers
        .iter()
        .filter_map(|ticker| {
            let series = raw.prices.get(ticker)?;
            let stats = engine.assess(series)?;
            Some((ticker.clone(), stats))
        })
        .collect()
}
