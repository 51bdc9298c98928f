//! Forward-performance labeling.
//!
//! For each admitted ticker and each configured window the labeler computes
//! the realized return between the window's two price dates and turns it
//! into risk-adjusted ratios: Sortino against the downside deviation and
//! Sharpe against the total deviation. The binary label is 1 when the
//! Sortino ratio clears the configured threshold *and* CVaR at the
//! configured confidence stays above the floor.
//!
//! A ticker that cannot be labeled — missing price at a window date, absent
//! risk statistics, zero dispersion — is not labeled 0: it is recorded as
//! excluded with a reason, and the quality filter later drops its row. The
//! exclusion taxonomy is a first-class, testable output.

use crate::error::DatasetError;
use chrono::NaiveDate;
use geraldton_data::PriceSeries;
use geraldton_risk::RiskStats;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::info;

/// One labeling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelWindow {
    /// Date whose price opens the window.
    pub start: NaiveDate,
    /// Date whose price closes the window.
    pub end: NaiveDate,
}

/// Configuration for labeling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Risk-free rate subtracted from realized returns (default: 0.016,
    /// twelve-month USD LIBOR at collection time).
    pub risk_free: f64,

    /// Minimum Sortino ratio for a positive label (default: 1.0).
    pub sortino_threshold: f64,

    /// CVaR floor: the level at `cvar_confidence` must stay strictly above
    /// it for a positive label (default: −0.1).
    pub cvar_floor: f64,

    /// Confidence level of the CVaR used in labeling (default: 95.0).
    pub cvar_confidence: f64,

    /// Window labeled for training.
    pub train: LabelWindow,

    /// Window labeled for out-of-sample evaluation.
    pub test: LabelWindow,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date");
        Self {
            risk_free: 0.016,
            sortino_threshold: 1.0,
            cvar_floor: -0.1,
            cvar_confidence: 95.0,
            train: LabelWindow {
                start: date(2014, 1, 2),
                end: date(2015, 1, 2),
            },
            test: LabelWindow {
                start: date(2015, 1, 2),
                end: date(2016, 1, 4),
            },
        }
    }
}

/// Why a ticker could not be labeled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExclusionReason {
    /// No risk statistics were computed (no computable returns).
    MissingRiskStats,
    /// The ticker never had a non-positive return, so no downside deviation.
    MissingDownsideDeviation,
    /// The required CVaR level was skipped (no returns below its VaR).
    MissingCvar {
        /// Confidence level that was required.
        confidence: f64,
    },
    /// No price recorded at a required window date.
    MissingPrice {
        /// The date whose price was required.
        date: NaiveDate,
    },
    /// A window opens at a zero price, so the realized return is undefined.
    ZeroStartPrice {
        /// The window's opening date.
        date: NaiveDate,
    },
    /// A deviation statistic is zero, so the ratio is undefined.
    ZeroDispersion,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRiskStats => write!(f, "no risk statistics"),
            Self::MissingDownsideDeviation => write!(f, "no downside deviation"),
            Self::MissingCvar { confidence } => {
                write!(f, "CVaR at {confidence}% confidence not computed")
            }
            Self::MissingPrice { date } => write!(f, "no price on {date}"),
            Self::ZeroStartPrice { date } => write!(f, "zero price on window start {date}"),
            Self::ZeroDispersion => write!(f, "zero deviation, ratio undefined"),
        }
    }
}

/// Ratios and label for one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAssessment {
    /// Realized return over the window.
    pub realized_return: f64,
    /// (realized − risk-free) / downside deviation.
    pub sortino: f64,
    /// (realized − risk-free) / total deviation.
    pub sharpe: f64,
    /// 1 when Sortino clears the threshold and CVaR stays above the floor.
    pub label: u8,
}

/// Full labeling result for an admitted ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerLabels {
    /// Ticker identifier.
    pub ticker: String,
    /// Train-window assessment.
    pub train: WindowAssessment,
    /// Test-window assessment.
    pub test: WindowAssessment,
    /// CVaR level used in the label rule.
    pub cvar: f64,
}

/// Labeling outcome for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelOutcome {
    /// Ticker labeled in both windows.
    Admitted(TickerLabels),
    /// Ticker recorded as unqualified; its row is dropped downstream.
    Excluded {
        /// Ticker identifier.
        ticker: String,
        /// Why labeling was impossible.
        reason: ExclusionReason,
    },
}

impl LabelOutcome {
    /// Ticker this outcome belongs to.
    pub fn ticker(&self) -> &str {
        match self {
            Self::Admitted(labels) => &labels.ticker,
            Self::Excluded { ticker, .. } => ticker,
        }
    }

    /// Returns true when the ticker was labeled.
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

/// Labeling outcomes parallel to the admitted-ticker list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSet {
    /// One outcome per ticker, in admission order.
    pub outcomes: Vec<LabelOutcome>,
}

impl LabelSet {
    /// Labeled tickers, in admission order.
    pub fn admitted(&self) -> impl Iterator<Item = &TickerLabels> {
        self.outcomes.iter().filter_map(|o| match o {
            LabelOutcome::Admitted(labels) => Some(labels),
            LabelOutcome::Excluded { .. } => None,
        })
    }

    /// Excluded tickers with their reasons, in admission order.
    pub fn excluded(&self) -> impl Iterator<Item = (&str, ExclusionReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            LabelOutcome::Admitted(_) => None,
            LabelOutcome::Excluded { ticker, reason } => Some((ticker.as_str(), *reason)),
        })
    }

    /// How many labeled tickers carry each train-window label value.
    ///
    /// Counts cover labeled tickers only. An excluded ticker is reported
    /// through [`Self::excluded`] with its reason; it never pads the zero
    /// bucket.
    pub fn train_label_counts(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for labels in self.admitted() {
            *counts.entry(labels.train.label).or_insert(0) += 1;
        }
        counts
    }
}

/// Assigns labels and records exclusions.
#[derive(Debug)]
pub struct Labeler {
    config: LabelConfig,
}

impl Labeler {
    /// Create a labeler with the given configuration.
    pub const fn new(config: LabelConfig) -> Self {
        Self { config }
    }

    /// Label every admitted ticker.
    ///
    /// # Errors
    /// Fails when the feature row count disagrees with the ticker list —
    /// that is a programming-invariant violation, not a data problem, and
    /// the run must stop rather than emit misaligned output.
    pub fn label_all(
        &self,
        tickers: &[String],
        feature_rows: usize,
        prices: &HashMap<String, PriceSeries>,
        stats: &HashMap<String, RiskStats>,
    ) -> Result<LabelSet, DatasetError> {
        if feature_rows != tickers.len() {
            return Err(DatasetError::TickerMismatch {
                features: feature_rows,
                tickers: tickers.len(),
            });
        }

        let outcomes: Vec<LabelOutcome> = tickers
            .iter()
            .map(|ticker| self.label_one(ticker, prices.get(ticker), stats.get(ticker)))
            .collect();

        let set = LabelSet { outcomes };
        let excluded = set.outcomes.iter().filter(|o| !o.is_admitted()).count();
        info!(
            labeled = tickers.len() - excluded,
            excluded, "labeling complete"
        );
        Ok(set)
    }

    /// Label one ticker, or record why it cannot be labeled.
    pub fn label_one(
        &self,
        ticker: &str,
        prices: Option<&PriceSeries>,
        stats: Option<&RiskStats>,
    ) -> LabelOutcome {
        match self.assess(prices, stats) {
            Ok((train, test, cvar)) => LabelOutcome::Admitted(TickerLabels {
                ticker: ticker.to_string(),
                train,
                test,
                cvar,
            }),
            Err(reason) => LabelOutcome::Excluded {
                ticker: ticker.to_string(),
                reason,
            },
        }
    }

    fn assess(
        &self,
        prices: Option<&PriceSeries>,
        stats: Option<&RiskStats>,
    ) -> Result<(WindowAssessment, WindowAssessment, f64), ExclusionReason> {
        let stats = stats.ok_or(ExclusionReason::MissingRiskStats)?;
        let downside = stats
            .downside_sd
            .ok_or(ExclusionReason::MissingDownsideDeviation)?;
        let cvar = stats
            .cvar_at(self.config.cvar_confidence)
            .ok_or(ExclusionReason::MissingCvar {
                confidence: self.config.cvar_confidence,
            })?;
        if downside == 0.0 || stats.annualized_sd == 0.0 {
            return Err(ExclusionReason::ZeroDispersion);
        }

        let train = self.assess_window(&self.config.train, prices, downside, stats.annualized_sd, cvar)?;
        let test = self.assess_window(&self.config.test, prices, downside, stats.annualized_sd, cvar)?;
        Ok((train, test, cvar))
    }

    fn assess_window(
        &self,
        window: &LabelWindow,
        prices: Option<&PriceSeries>,
        downside_sd: f64,
        annualized_sd: f64,
        cvar: f64,
    ) -> Result<WindowAssessment, ExclusionReason> {
        let price_on = |date: NaiveDate| {
            prices
                .and_then(|p| p.price_on(date))
                .ok_or(ExclusionReason::MissingPrice { date })
        };
        let open = price_on(window.start)?;
        let close = price_on(window.end)?;
        if open == 0.0 {
            return Err(ExclusionReason::ZeroStartPrice { date: window.start });
        }

        let realized_return = close / open - 1.0;
        let excess = realized_return - self.config.risk_free;
        let sortino = excess / downside_sd;
        let sharpe = excess / annualized_sd;
        let label =
            u8::from(sortino >= self.config.sortino_threshold && cvar > self.config.cvar_floor);

        Ok(WindowAssessment {
            realized_return,
            sortino,
            sharpe,
            label,
        })
    }
}
