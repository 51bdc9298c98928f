//! Export of the assembled dataset into training artifacts.
//!
//! Two artifacts leave a run: the labeled matrix — one row per surviving
//! ticker, holding the identifier, the feature values, and the train and
//! test labels — and the list of surviving feature names, one per line.
//! Both can also be rendered as JSON for inspection.

use geraldton_dataset::Dataset;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values, no header row.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// The labeled matrix artifact: ticker, feature values, train and test
/// labels, one row per surviving ticker.
#[derive(Debug, Clone, Copy)]
pub struct LabeledMatrixExport<'a> {
    dataset: &'a Dataset,
}

impl<'a> LabeledMatrixExport<'a> {
    /// Create an export view over an assembled dataset.
    pub const fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }
}

/// One labeled row, for JSON rendering.
#[derive(Debug, Serialize)]
struct LabeledRow<'a> {
    ticker: &'a str,
    features: Vec<Option<f64>>,
    train: u8,
    test: u8,
}

impl LabeledMatrixExport<'_> {
    fn rows(&self) -> Vec<LabeledRow<'_>> {
        self.dataset
            .tickers
            .iter()
            .enumerate()
            .map(|(i, ticker)| LabeledRow {
                ticker,
                features: self
                    .dataset
                    .features
                    .row(i)
                    .iter()
                    .map(|v| (!v.is_nan()).then_some(*v))
                    .collect(),
                train: self.dataset.train_labels[i],
                test: self.dataset.test_labels[i],
            })
            .collect()
    }
}

impl Exporter for LabeledMatrixExport<'_> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for (i, ticker) in self.dataset.tickers.iter().enumerate() {
                    let mut record = Vec::with_capacity(self.dataset.features.ncols() + 3);
                    record.push(ticker.clone());
                    record.extend(self.dataset.features.row(i).iter().map(|v| format_value(*v)));
                    record.push(self.dataset.train_labels[i].to_string());
                    record.push(self.dataset.test_labels[i].to_string());
                    wtr.write_record(&record)?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(&self.rows())?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&self.rows())?),
        }
    }
}

/// The feature-name artifact: surviving column names, one per line.
#[derive(Debug, Clone, Copy)]
pub struct FeatureNameExport<'a> {
    dataset: &'a Dataset,
}

impl<'a> FeatureNameExport<'a> {
    /// Create an export view over an assembled dataset.
    pub const fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }
}

impl Exporter for FeatureNameExport<'_> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut out = String::new();
                for name in &self.dataset.feature_names {
                    out.push_str(name);
                    out.push('\n');
                }
                Ok(out)
            }
            ExportFormat::Json => Ok(serde_json::to_string(&self.dataset.feature_names)?),
            ExportFormat::PrettyJson => {
                Ok(serde_json::to_string_pretty(&self.dataset.feature_names)?)
            }
        }
    }
}

/// Missing values are spelled `nan` so downstream loaders can round-trip
/// them.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        value.to_string()
    }
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Read;

    fn dataset() -> Dataset {
        Dataset {
            tickers: vec!["AAA".to_string(), "BBB".to_string()],
            features: array![[1.5, 2.0], [f64::NAN, 4.25]],
            feature_names: vec!["roe__2014".to_string(), "roe__2015".to_string()],
            train_labels: vec![1, 0],
            test_labels: vec![0, 1],
        }
    }

    #[test]
    fn test_labeled_matrix_csv() {
        let dataset = dataset();
        let csv = LabeledMatrixExport::new(&dataset)
            .export_to_string(ExportFormat::Csv)
            .unwrap();
        assert_eq!(csv, "AAA,1.5,2,1,0\nBBB,nan,4.25,0,1\n");
    }

    #[test]
    fn test_labeled_matrix_json_nan_is_null() {
        let dataset = dataset();
        let json = LabeledMatrixExport::new(&dataset)
            .export_to_string(ExportFormat::Json)
            .unwrap();
        assert!(json.contains("\"AAA\""));
        assert!(json.contains("null"));
        assert!(json.contains("\"train\":1"));
    }

    #[test]
    fn test_feature_names_one_per_line() {
        let dataset = dataset();
        let text = FeatureNameExport::new(&dataset)
            .export_to_string(ExportFormat::Csv)
            .unwrap();
        assert_eq!(text, "roe__2014\nroe__2015\n");
    }

    #[test]
    fn test_feature_names_json() {
        let dataset = dataset();
        let json = FeatureNameExport::new(&dataset)
            .export_to_string(ExportFormat::Json)
            .unwrap();
        assert_eq!(json, "[\"roe__2014\",\"roe__2015\"]");
    }

    #[test]
    fn test_export_to_file() {
        let dataset = dataset();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        LabeledMatrixExport::new(&dataset)
            .export_to_file(&path, ExportFormat::Csv)
            .unwrap();

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.starts_with("AAA,1.5"));
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
