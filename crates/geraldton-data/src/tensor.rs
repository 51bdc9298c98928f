//! Tensor builder: turns the record stream into the raw feature matrix.
//!
//! The builder is a small state machine driven by `ticker` boundary markers.
//! Between two markers it accumulates one pre-sized (ratios × periods) block
//! of values plus a price series for the current ticker; on the next marker
//! (or at end of stream) it decides whether the finished block is admitted
//! into the dataset.
//!
//! Admission requires both a complete block — every dictionary ratio seen
//! with the expected period count — and a price history deep enough to
//! support the risk statistics computed downstream.

use crate::dictionary::FeatureDictionary;
use crate::error::{DataError, Result};
use crate::parse::Record;
use crate::prices::PriceSeries;
use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Corpus key that marks a ticker boundary.
pub const TICKER_KEY: &str = "ticker";

/// Corpus key that defines the shared time horizon.
pub const TIME_HORIZON_KEY: &str = "key_ratios_Time";

/// Suffix of per-date adjusted-close keys (`YYYY-MM-DD_adjClose`).
pub const PRICE_KEY_SUFFIX: &str = "_adjClose";

/// Configuration for tensor construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorConfig {
    /// Number of time periods per ratio row (default: 11).
    pub periods: usize,

    /// Minimum number of distinct price dates a ticker must exceed to be
    /// admitted (default: 756, i.e. three years of 252 trading days).
    pub min_price_history: usize,
}

impl Default for TensorConfig {
    fn default() -> Self {
        Self {
            periods: 11,
            min_price_history: 252 * 3,
        }
    }
}

/// Output of tensor construction.
#[derive(Debug, Clone)]
pub struct RawDataset {
    /// Admitted tickers, in admission order.
    pub tickers: Vec<String>,

    /// Feature matrix: one row per admitted ticker, `ratios × periods`
    /// columns, the ratio-major flattening of each ticker's block. Missing
    /// entries are NaN.
    pub features: Array2<f64>,

    /// Price series for every ticker encountered, admitted or not.
    pub prices: HashMap<String, PriceSeries>,

    /// Shared period labels, in corpus order.
    pub time_horizon: Vec<String>,
}

/// State machine that assembles [`RawDataset`] from a record stream.
#[derive(Debug)]
pub struct TensorBuilder<'d> {
    dict: &'d FeatureDictionary,
    config: TensorConfig,

    // Current-ticker accumulation state. `current == None` is the
    // awaiting-ticker state; everything before the first marker is ignored.
    current: Option<String>,
    block: Array2<f64>,
    seen: Vec<bool>,
    seen_count: usize,

    prices: HashMap<String, PriceSeries>,
    time_horizon: Option<Vec<String>>,

    admitted: Vec<String>,
    storage: Vec<f64>,
}

impl<'d> TensorBuilder<'d> {
    /// Create a builder over the given dictionary.
    pub fn new(dict: &'d FeatureDictionary, config: TensorConfig) -> Self {
        let ratios = dict.len();
        let periods = config.periods;
        Self {
            dict,
            config,
            current: None,
            block: Array2::from_elem((ratios, periods), f64::NAN),
            seen: vec![false; ratios],
            seen_count: 0,
            prices: HashMap::new(),
            time_horizon: None,
            admitted: Vec::new(),
            storage: Vec::new(),
        }
    }

    /// Feed one record into the builder.
    pub fn push(&mut self, record: &Record<'_>) {
        if record.key == TICKER_KEY {
            self.flush();
            self.current = Some(record.value.to_string());
            self.prices.entry(record.value.to_string()).or_default();
            return;
        }

        if record.key == TIME_HORIZON_KEY {
            let labels: Vec<String> = record
                .value
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if labels.len() == self.config.periods && self.time_horizon.is_none() {
                self.time_horizon = Some(labels);
            }
            return;
        }

        if let Some(idx) = self.dict.index_of(record.key) {
            if self.current.is_none() {
                return;
            }
            let tokens: Vec<&str> = record.value.split_whitespace().collect();
            if tokens.len() != self.config.periods {
                // Wrong-length ratio row: skip it, the block stays incomplete.
                debug!(
                    key = record.key,
                    got = tokens.len(),
                    expected = self.config.periods,
                    "discarding ratio row with unexpected period count"
                );
                return;
            }
            for (j, token) in tokens.iter().enumerate() {
                self.block[[idx, j]] = token.parse::<f64>().unwrap_or(f64::NAN);
            }
            if !self.seen[idx] {
                self.seen[idx] = true;
                self.seen_count += 1;
            }
            return;
        }

        if let Some(date_part) = record.key.strip_suffix(PRICE_KEY_SUFFIX)
            && let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && let Ok(price) = record.value.parse::<f64>()
            && let Some(ticker) = &self.current
            && let Some(series) = self.prices.get_mut(ticker)
        {
            series.record(date, price);
        }
    }

    /// Feed a whole record stream.
    pub fn extend<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record<'a>>,
    {
        for record in records {
            self.push(&record);
        }
    }

    /// Finish the stream: flush the final ticker and assemble the dataset.
    ///
    /// # Errors
    /// Fails when the corpus never defined a time horizon of the configured
    /// period count, or on an internal storage shape mismatch.
    pub fn finish(mut self) -> Result<RawDataset> {
        self.flush();

        let time_horizon = self
            .time_horizon
            .take()
            .ok_or(DataError::MissingTimeHorizon {
                expected: self.config.periods,
            })?;

        let cols = self.dict.len() * self.config.periods;
        let features = Array2::from_shape_vec((self.admitted.len(), cols), self.storage)?;

        info!(
            admitted = self.admitted.len(),
            encountered = self.prices.len(),
            columns = cols,
            "raw feature tensor assembled"
        );

        Ok(RawDataset {
            tickers: self.admitted,
            features,
            prices: self.prices,
            time_horizon,
        })
    }

    /// Flush the in-progress block: admit the previous ticker when its block
    /// is complete and its price history deep enough, then reset state.
    fn flush(&mut self) {
        if let Some(ticker) = self.current.take() {
            let complete = self.seen_count == self.dict.len();
            let history = self.prices.get(&ticker).map_or(0, PriceSeries::len);
            if complete && history > self.config.min_price_history {
                self.storage.extend(self.block.iter());
                self.admitted.push(ticker);
            } else {
                debug!(
                    ticker = %ticker,
                    ratios_seen = self.seen_count,
                    ratios_expected = self.dict.len(),
                    price_dates = history,
                    "ticker excluded at flush"
                );
            }
        }
        self.block.fill(f64::NAN);
        self.seen.fill(false);
        self.seen_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::scan_records;

    fn dict() -> FeatureDictionary {
        FeatureDictionary::from_lines(["key_ratios_pe", "key_ratios_roe"]).unwrap()
    }

    fn config() -> TensorConfig {
        TensorConfig {
            periods: 3,
            min_price_history: 2,
        }
    }

    fn build(corpus: &str) -> Result<RawDataset> {
        let dictionary = dict();
        let mut builder = TensorBuilder::new(&dictionary, config());
        builder.extend(scan_records(corpus));
        builder.finish()
    }

    #[test]
    fn test_admission_and_flattening() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
ticker:AAA
key_ratios_pe:1 2 3
key_ratios_roe:4 5 6
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
2014-01-06_adjClose:11.0
";
        let raw = build(corpus).unwrap();
        assert_eq!(raw.tickers, vec!["AAA"]);
        assert_eq!(raw.features.dim(), (1, 6));
        let row: Vec<f64> = raw.features.row(0).to_vec();
        assert_eq!(row, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(raw.time_horizon, vec!["2013", "2014", "2015"]);
    }

    #[test]
    fn test_short_history_excluded() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
ticker:AAA
key_ratios_pe:1 2 3
key_ratios_roe:4 5 6
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
";
        let raw = build(corpus).unwrap();
        assert!(raw.tickers.is_empty());
        assert_eq!(raw.features.dim(), (0, 6));
        // The excluded ticker's prices are still collected.
        assert_eq!(raw.prices["AAA"].len(), 2);
    }

    #[test]
    fn test_incomplete_block_excluded() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
ticker:AAA
key_ratios_pe:1 2 3
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
2014-01-06_adjClose:11.0
";
        let raw = build(corpus).unwrap();
        assert!(raw.tickers.is_empty());
    }

    #[test]
    fn test_wrong_length_row_discarded() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
ticker:AAA
key_ratios_pe:1 2 3 4
key_ratios_roe:4 5 6
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
2014-01-06_adjClose:11.0
";
        // The pe row has 4 tokens against 3 periods, so the block never
        // completes and AAA is excluded.
        let raw = build(corpus).unwrap();
        assert!(raw.tickers.is_empty());
    }

    #[test]
    fn test_non_numeric_tokens_become_nan() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
ticker:AAA
key_ratios_pe:1 junk 3
key_ratios_roe:4 nan 6
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
2014-01-06_adjClose:11.0
";
        let raw = build(corpus).unwrap();
        assert_eq!(raw.tickers, vec!["AAA"]);
        assert!(raw.features[[0, 1]].is_nan());
        assert!(raw.features[[0, 4]].is_nan());
    }

    #[test]
    fn test_records_before_first_ticker_ignored() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
key_ratios_pe:9 9 9
2013-05-01_adjClose:1.0
ticker:AAA
key_ratios_pe:1 2 3
key_ratios_roe:4 5 6
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
2014-01-06_adjClose:11.0
";
        let raw = build(corpus).unwrap();
        assert_eq!(raw.tickers, vec!["AAA"]);
        assert_eq!(raw.features[[0, 0]], 1.0);
        assert_eq!(raw.prices["AAA"].len(), 3);
    }

    #[test]
    fn test_block_reset_between_tickers() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
ticker:AAA
key_ratios_pe:1 2 3
key_ratios_roe:4 5 6
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
2014-01-06_adjClose:11.0
ticker:BBB
key_ratios_pe:7 8 9
2014-01-02_adjClose:20.0
2014-01-03_adjClose:20.5
2014-01-06_adjClose:21.0
";
        // BBB never reports roe; AAA's roe row must not leak into its block.
        let raw = build(corpus).unwrap();
        assert_eq!(raw.tickers, vec!["AAA"]);
    }

    #[test]
    fn test_missing_time_horizon_is_error() {
        let corpus = "\
ticker:AAA
key_ratios_pe:1 2 3
key_ratios_roe:4 5 6
2014-01-02_adjClose:10.0
2014-01-03_adjClose:10.5
2014-01-06_adjClose:11.0
";
        assert!(matches!(
            build(corpus),
            Err(DataError::MissingTimeHorizon { expected: 3 })
        ));
    }

    #[test]
    fn test_duplicate_price_date_counts_once() {
        let corpus = "\
key_ratios_Time:2013 2014 2015
ticker:AAA
key_ratios_pe:1 2 3
key_ratios_roe:4 5 6
2014-01-02_adjClose:10.0
2014-01-02_adjClose:10.1
2014-01-03_adjClose:10.5
";
        let raw = build(corpus).unwrap();
        // Two distinct dates only: not more than min_price_history, excluded.
        assert!(raw.tickers.is_empty());
        assert_eq!(raw.prices["AAA"].len(), 2);
    }
}
