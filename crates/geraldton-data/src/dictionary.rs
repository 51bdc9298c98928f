//! The ordered ratio dictionary.
//!
//! The dictionary is supplied externally as a one-key-per-line file. It fixes
//! both which `key_ratios_*` records are retained and the column order of the
//! feature matrix, and it is shared read-only across all tickers.

use crate::error::{DataError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Prefix carried by ratio keys in the corpus and the dictionary file.
pub const RATIO_KEY_PREFIX: &str = "key_ratios_";

/// Ordered mapping from ratio key to feature-column index.
///
/// Fixed at load time; the dictionary length defines the ratio count of the
/// per-ticker feature block (83 in the production projection file).
#[derive(Debug, Clone)]
pub struct FeatureDictionary {
    keys: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureDictionary {
    /// Load the dictionary from an iterator of lines.
    ///
    /// Blank lines and surrounding whitespace are ignored. A duplicate key
    /// keeps its first position.
    ///
    /// # Errors
    /// Returns [`DataError::EmptyDictionary`] if no keys remain.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = Vec::new();
        let mut index = HashMap::new();
        for line in lines {
            let key = line.as_ref().trim();
            if key.is_empty() {
                continue;
            }
            if !index.contains_key(key) {
                index.insert(key.to_string(), keys.len());
                keys.push(key.to_string());
            }
        }
        if keys.is_empty() {
            return Err(DataError::EmptyDictionary);
        }
        Ok(Self { keys, index })
    }

    /// Load the dictionary from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let lines: Vec<String> = BufReader::new(reader)
            .lines()
            .collect::<std::result::Result<_, _>>()?;
        Self::from_lines(lines)
    }

    /// Load the dictionary from a file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Number of ratios in the dictionary.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true when the dictionary holds no keys (never after load).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Column index for a corpus key, or `None` if the key is not a ratio
    /// this dictionary retains.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Ratio keys in column order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Display name of the ratio at `idx`: the key with the
    /// [`RATIO_KEY_PREFIX`] stripped, or `None` when `idx` is out of range.
    pub fn display_name(&self, idx: usize) -> Option<&str> {
        self.keys
            .get(idx)
            .map(|key| key.strip_prefix(RATIO_KEY_PREFIX).unwrap_or(key))
    }

    /// Flattened feature-column names, `<ratio>__<period>`, in dictionary
    /// order with the period index varying fastest. Matches the row-major
    /// flattening applied by the tensor builder.
    pub fn column_names(&self, time_horizon: &[String]) -> Vec<String> {
        let mut names = Vec::with_capacity(self.keys.len() * time_horizon.len());
        for key in &self.keys {
            let ratio = key.strip_prefix(RATIO_KEY_PREFIX).unwrap_or(key);
            for period in time_horizon {
                names.push(format!("{}__{}", ratio, period));
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureDictionary {
        FeatureDictionary::from_lines(["key_ratios_pe", "key_ratios_roe", "key_ratios_margin"])
            .unwrap()
    }

    #[test]
    fn test_order_and_lookup() {
        let dict = sample();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.index_of("key_ratios_roe"), Some(1));
        assert_eq!(dict.index_of("key_ratios_unknown"), None);
    }

    #[test]
    fn test_blank_lines_and_whitespace() {
        let dict = FeatureDictionary::from_lines(["  key_ratios_pe  ", "", "key_ratios_roe"])
            .unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.index_of("key_ratios_pe"), Some(0));
    }

    #[test]
    fn test_duplicate_keeps_first_position() {
        let dict =
            FeatureDictionary::from_lines(["key_ratios_pe", "key_ratios_roe", "key_ratios_pe"])
                .unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.index_of("key_ratios_pe"), Some(0));
    }

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(
            FeatureDictionary::from_lines(Vec::<String>::new()),
            Err(DataError::EmptyDictionary)
        ));
    }

    #[test]
    fn test_display_name_strips_prefix() {
        let dict = sample();
        assert_eq!(dict.display_name(0), Some("pe"));
        assert_eq!(dict.display_name(dict.len()), None);
        let odd = FeatureDictionary::from_lines(["bare_key"]).unwrap();
        assert_eq!(odd.display_name(0), Some("bare_key"));
    }

    #[test]
    fn test_column_names_layout() {
        let dict = sample();
        let horizon = vec!["2014".to_string(), "TTM".to_string()];
        let names = dict.column_names(&horizon);
        assert_eq!(
            names,
            vec!["pe__2014", "pe__TTM", "roe__2014", "roe__TTM", "margin__2014", "margin__TTM"]
        );
    }
}
