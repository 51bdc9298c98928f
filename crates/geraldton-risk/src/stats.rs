//! Per-ticker risk statistics: deviation measures and CVaR.
//!
//! Value-at-Risk is the empirical percentile (linear interpolation between
//! order statistics) of the return distribution at a small alpha;
//! Conditional Value-at-Risk at confidence `100 − alpha` is the mean of the
//! returns strictly below that percentile. When no return falls below the
//! percentile the level is simply absent — downstream labeling treats a
//! required absent level as grounds for exclusion.
//!
//! Dispersion statistics are computed independently of the CVaR levels, so
//! a skipped level can never leave the deviations unset.

use crate::returns::simple_returns;
use geraldton_data::PriceSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur configuring the risk engine.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Alpha outside the open interval (0, 100)
    #[error("invalid tail alpha: {0} (must be strictly between 0 and 100 percent)")]
    InvalidAlpha(f64),
}

/// Configuration for risk statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Tail alphas in percent, each yielding a CVaR at confidence
    /// `100 − alpha` (default: 0.1, 1 and 5, i.e. CVaR 99.9/99/95).
    pub alphas: Vec<f64>,

    /// Trading days per year used for annualization (default: 252).
    pub trading_days_per_year: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            alphas: vec![0.1, 1.0, 5.0],
            trading_days_per_year: 252,
        }
    }
}

/// One CVaR level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CvarEstimate {
    /// Confidence level in percent (e.g. 95.0).
    pub confidence: f64,
    /// Mean of the returns strictly below the VaR percentile.
    pub value: f64,
}

/// Risk statistics for one ticker, immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskStats {
    /// Population standard deviation of all returns, annualized.
    pub annualized_sd: f64,

    /// Population standard deviation of non-positive returns, annualized;
    /// absent when the ticker had no non-positive return.
    pub downside_sd: Option<f64>,

    /// Computed CVaR levels, one per alpha that produced a non-empty tail.
    pub cvar: Vec<CvarEstimate>,
}

impl RiskStats {
    /// CVaR at the given confidence level, if that level was computed.
    pub fn cvar_at(&self, confidence: f64) -> Option<f64> {
        self.cvar
            .iter()
            .find(|c| (c.confidence - confidence).abs() < 1e-9)
            .map(|c| c.value)
    }
}

/// Computes [`RiskStats`] from price series.
#[derive(Debug)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    /// Create an engine, validating the configured alphas.
    pub fn new(config: RiskConfig) -> Result<Self, RiskError> {
        for &alpha in &config.alphas {
            if !(alpha > 0.0 && alpha < 100.0) {
                return Err(RiskError::InvalidAlpha(alpha));
            }
        }
        Ok(Self { config })
    }

    /// Create with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not
    /// happen).
    pub fn try_default() -> Result<Self, RiskError> {
        Self::new(RiskConfig::default())
    }

    /// Assess one ticker's price series.
    ///
    /// Returns `None` when the series yields no computable return at all;
    /// such a ticker has no risk profile and is excluded downstream.
    pub fn assess(&self, series: &PriceSeries) -> Option<RiskStats> {
        let returns = simple_returns(series);
        if returns.is_empty() {
            return None;
        }

        let annualize = (self.config.trading_days_per_year as f64).sqrt();
        let annualized_sd = population_std(&returns) * annualize;

        let downside: Vec<f64> = returns.iter().copied().filter(|&r| r <= 0.0).collect();
        let downside_sd = if downside.is_empty() {
            None
        } else {
            Some(population_std(&downside) * annualize)
        };

        let mut sorted = returns.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut cvar = Vec::with_capacity(self.config.alphas.len());
        for &alpha in &self.config.alphas {
            let var = percentile(&sorted, alpha);
            let tail: Vec<f64> = sorted.iter().copied().take_while(|&r| r < var).collect();
            if tail.is_empty() {
                debug!(alpha, "no returns below VaR percentile, skipping level");
                continue;
            }
            cvar.push(CvarEstimate {
                confidence: 100.0 - alpha,
                value: tail.iter().sum::<f64>() / tail.len() as f64,
            });
        }

        Some(RiskStats {
            annualized_sd,
            downside_sd,
            cvar,
        })
    }
}

/// Empirical percentile with linear interpolation between order statistics.
///
/// `sorted` must be ascending and non-empty; `pct` is in percent.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi.min(n - 1)] - sorted[lo])
}

/// Population standard deviation.
fn population_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    variance.sqrt()
}
