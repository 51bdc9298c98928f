//! Simple return series from price history.

use geraldton_data::PriceSeries;

/// Compute the simple period-over-period return series of a price history.
///
/// Observations are taken in date order. A transition whose denominator
/// price is not strictly positive is not computable and is skipped, as is
/// any transition that yields a non-finite return (e.g. from a NaN price);
/// the result holds only finite returns.
pub fn simple_returns(series: &PriceSeries) -> Vec<f64> {
    let mut returns = Vec::new();
    let mut last: Option<f64> = None;
    for (_, price) in series.iter() {
        if let Some(prev) = last
            && prev > 0.0
        {
            let r = price / prev - 1.0;
            if r.is_finite() {
                returns.push(r);
            }
        }
        last = Some(price);
    }
    returns
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn series(prices: &[f64]) -> PriceSeries {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
                    + chrono::Days::new(i as u64);
                (date, p)
            })
            .collect()
    }

    #[test]
    fn test_basic_returns() {
        let returns = simple_returns(&series(&[100.0, 110.0, 99.0]));
        assert_eq!(returns.len(), 2);
        assert_abs_diff_eq!(returns[0], 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(returns[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_denominator_skipped() {
        // The 0.0 and -5.0 observations cannot serve as denominators, but
        // transitions *into* them are still computable.
        let returns = simple_returns(&series(&[100.0, 0.0, 50.0, -5.0, 10.0]));
        assert_eq!(returns.len(), 2);
        assert_abs_diff_eq!(returns[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(returns[1], -5.0 / 50.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_price_dropped() {
        let returns = simple_returns(&series(&[100.0, f64::NAN, 110.0]));
        // 100 -> NaN yields a non-finite return; NaN cannot be a denominator.
        assert!(returns.is_empty());
    }

    #[test]
    fn test_short_series() {
        assert!(simple_returns(&series(&[])).is_empty());
        assert!(simple_returns(&series(&[42.0])).is_empty());
    }
}
