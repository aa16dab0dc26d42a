//! OCR error correction for contract text.
//!
//! The correction table is corpus-tuned against Iowa 28E filings digitized by
//! OCR. Each entry is applied exactly once, in table order.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    // Ordered (misspelling, correction) pairs. Matching is order-sensitive,
    // so this stays a Vec rather than a map.
    static ref OCR_CORRECTIONS: Vec<(Regex, &'static str)> = {
        vec![
            (Regex::new(r"(?i)\blowa\b").unwrap(), "Iowa"), // most common error
            (Regex::new(r"(?i)\bDes l/loines\b").unwrap(), "Des Moines"),
            (Regex::new(r"(?i)\blVlarshall\b").unwrap(), "Marshall"),
            (Regex::new(r"(?i)\bCountv\b").unwrap(), "County"),
            (Regex::new(r"(?i)\bCitv\b").unwrap(), "City"),
            (Regex::new(r"(?i)\bCHickasaw\b").unwrap(), "Chickasaw"),
        ]
    };
}

/// Fix common OCR errors using the pre-compiled correction table.
///
/// Empty input passes through unchanged. No other normalization happens here;
/// whitespace and casing are dealt with downstream.
pub fn preprocess(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result = text.to_string();
    let mut total_subs: u64 = 0;

    for (pattern, replacement) in OCR_CORRECTIONS.iter() {
        let count = pattern.find_iter(&result).count();
        if count > 0 {
            result = pattern.replace_all(&result, *replacement).into_owned();
            total_subs += count as u64;
        }
    }

    if total_subs > 0 {
        debug!(substitutions = total_subs, "applied OCR corrections");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixes_common_iowa_errors() {
        assert_eq!(preprocess("State of lowa"), "State of Iowa");
        assert_eq!(preprocess("Citv of Lawler, lowa"), "City of Lawler, Iowa");
        assert_eq!(preprocess("Polk Countv"), "Polk County");
        assert_eq!(preprocess("CHickasaw Countv"), "Chickasaw County");
    }

    #[test]
    fn corrections_are_case_insensitive() {
        assert_eq!(preprocess("LOWA"), "Iowa");
        assert_eq!(preprocess("countv"), "County");
    }

    #[test]
    fn respects_word_boundaries() {
        // "lowa" inside a larger word must not be rewritten
        assert_eq!(preprocess("Alowan"), "Alowan");
    }

    #[test]
    fn empty_and_clean_text_pass_through() {
        assert_eq!(preprocess(""), "");
        let clean = "The City of Ames shall pay Story County.";
        assert_eq!(preprocess(clean), clean);
    }
}
