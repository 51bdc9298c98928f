//! Lenient scanner for the `key:value` fundamentals corpus.
//!
//! The raw corpus is line-oriented text in which each record looks like
//! `key_ratios_pe_ratio:12.4 13.1 nan 14.0`. Keys draw from word characters
//! plus `-_%*&/`; values from word characters plus `.`, `-`, `/` and space.
//! Anything that does not match is skipped without comment — the upstream
//! dump is noisy by nature and lenience here is contractual, not a bug.

/// A single `key:value` record borrowed from the corpus text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Record key, e.g. `ticker` or `key_ratios_net_margin`.
    pub key: &'a str,
    /// Raw record value, e.g. a ticker symbol or space-separated numbers.
    pub value: &'a str,
}

/// Returns true for bytes allowed in a record key.
const fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'%' | b'*' | b'&' | b'/')
}

/// Returns true for bytes allowed in a record value.
const fn is_value_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-' | b'/' | b' ')
}

/// Scan raw corpus text into `key:value` records.
///
/// Records are emitted in encounter order and never reordered. A line may
/// carry more than one record; malformed fragments are dropped silently.
///
/// # Example
/// ```
/// use geraldton_data::parse::scan_records;
///
/// let records = scan_records("ticker:AAPL\nnoise!!\n2014-01-02_adjClose:77.28\n");
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].key, "ticker");
/// assert_eq!(records[1].value, "77.28");
/// ```
pub fn scan_records(text: &str) -> Vec<Record<'_>> {
    let bytes = text.as_bytes();
    let mut records = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !is_key_byte(bytes[i]) {
            i += 1;
            continue;
        }

        // Greedy key run. Key bytes are all ASCII, so the slice boundaries
        // below always fall on character boundaries.
        let key_start = i;
        while i < bytes.len() && is_key_byte(bytes[i]) {
            i += 1;
        }

        if i >= bytes.len() || bytes[i] != b':' {
            // No separator follows the run; resume scanning after it.
            continue;
        }
        let key_end = i;
        i += 1; // consume ':'

        let value_start = i;
        while i < bytes.len() && is_value_byte(bytes[i]) {
            i += 1;
        }
        if i == value_start {
            // Empty value, e.g. `key:` at end of line.
            continue;
        }

        records.push(Record {
            key: &text[key_start..key_end],
            value: &text[value_start..i],
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair() {
        let records = scan_records("ticker:AAPL");
        assert_eq!(
            records,
            vec![Record {
                key: "ticker",
                value: "AAPL"
            }]
        );
    }

    #[test]
    fn test_key_charset() {
        let records = scan_records("key_ratios_Net-Margin_%:1.5 2.5\nR&D/Sales*:0.1");
        assert_eq!(records[0].key, "key_ratios_Net-Margin_%");
        assert_eq!(records[0].value, "1.5 2.5");
        assert_eq!(records[1].key, "R&D/Sales*");
    }

    #[test]
    fn test_value_keeps_spaces_and_dots() {
        let records = scan_records("key_ratios_eps:1.05 -2.5 nan 3/2");
        assert_eq!(records[0].value, "1.05 -2.5 nan 3/2");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let records = scan_records("!!!\n:novalue\nnokey:\nok:1\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "ok");
    }

    #[test]
    fn test_multiple_pairs_per_line() {
        let records = scan_records("a:1,b:2");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], Record { key: "b", value: "2" });
    }

    #[test]
    fn test_colon_terminates_value() {
        let records = scan_records("a:b:c d");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], Record { key: "a", value: "b" });
    }

    #[test]
    fn test_date_price_record() {
        let records = scan_records("2015-06-01_adjClose:104.95");
        assert_eq!(records[0].key, "2015-06-01_adjClose");
        assert_eq!(records[0].value, "104.95");
    }

    #[test]
    fn test_non_ascii_noise_ignored() {
        let records = scan_records("über:1\nplain:2");
        // The non-ASCII prefix is not part of the key charset.
        assert_eq!(records[0], Record { key: "ber", value: "1" });
        assert_eq!(records[1], Record { key: "plain", value: "2" });
    }

    #[test]
    fn test_empty_input() {
        assert!(scan_records("").is_empty());
    }
}
