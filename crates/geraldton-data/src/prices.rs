//! Per-ticker adjusted-close price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Adjusted-close prices for one ticker, keyed by calendar date.
///
/// Dates are unique per ticker: recording the same date twice keeps the last
/// value, mirroring how the upstream dump overwrites repeated observations.
/// Iteration is always date-ordered, so consumers never need to re-sort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: BTreeMap<NaiveDate, f64>,
}

impl PriceSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a price observation. A repeated date overwrites the earlier
    /// value.
    pub fn record(&mut self, date: NaiveDate, price: f64) {
        self.points.insert(date, price);
    }

    /// Number of distinct dates with a recorded price.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true when no price has been recorded.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Price recorded on an exact date, if any.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.points.get(&date).copied()
    }

    /// Date-ordered view of the series.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().map(|(d, p)| (*d, *p))
    }
}

impl FromIterator<(NaiveDate, f64)> for PriceSeries {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, f64)>>(iter: T) -> Self {
        let mut series = Self::new();
        for (date, price) in iter {
            series.record(date, price);
        }
        series
    }
}
