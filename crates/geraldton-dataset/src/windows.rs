//! Year-window column selection for downstream consumers.

/// Mark the columns whose reporting period falls inside a year range.
///
/// A column named `<ratio>__<period>` is kept when its period is a year in
/// `year0..=year1`, or when it is `TTM` and `include_ttm` is set. Columns
/// whose period is neither a year nor `TTM` are kept unconditionally.
pub fn select_year_window(
    names: &[String],
    year0: i32,
    year1: i32,
    include_ttm: bool,
) -> Vec<bool> {
    names
        .iter()
        .map(|name| {
            let period = name.rsplit('_').next().unwrap_or(name);
            if period == "TTM" {
                return include_ttm;
            }
            match period.parse::<i32>() {
                Ok(year) if period.len() == 4 => (year0..=year1).contains(&year),
                _ => true,
            }
        })
        .collect()
}
