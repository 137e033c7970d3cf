//! Best-effort field extraction from OCR'd certificate text.
//!
//! The host runs OCR on a captured certificate or medical photo and hands the
//! raw text here. These scrapers are pattern-matching heuristics, not parsers:
//! they prefer labelled fields, fall back to shape-based guesses, and return
//! `None` rather than failing. Extracted values are offered to the user for
//! confirmation before being written into the checklist.

use regex::Regex;
use std::sync::OnceLock;

fn name_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*(?:full\s+)?(?:pilot\s+|holder'?s?\s+)?name\s*[:\-]\s*(.+?)\s*$")
            .expect("static regex is valid")
    })
}

fn uppercase_name_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // 2-4 words, all caps, allowing commas, periods, apostrophes, hyphens.
        Regex::new(r"^[A-Z][A-Z'.\-]*,?(?:\s+[A-Z][A-Z'.\-]*,?){1,3}$")
            .expect("static regex is valid")
    })
}

fn certificate_number_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)cert(?:ificate)?\.?\s*(?:no|num(?:ber)?|#)\.?\s*[:\-]?\s*([A-Z0-9]{6,10})")
            .expect("static regex is valid")
    })
}

fn bare_certificate_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // FAA certificate numbers are commonly seven digits.
    RE.get_or_init(|| Regex::new(r"\b(\d{7})\b").expect("static regex is valid"))
}

fn date_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:date\s+of\s+(?:issue|examination|birth)|issue[d]?\s*(?:date)?|exam(?:ination)?\s*date|expir(?:es|ation)\s*(?:date)?)\s*[:\-]?\s*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})",
        )
        .expect("static regex is valid")
    })
}

fn bare_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})\b").expect("static regex is valid")
    })
}

/// Words that disqualify an all-caps line from being read as a holder name.
const NAME_LINE_STOPWORDS: &[&str] = &[
    "CERTIFICATE",
    "FEDERAL",
    "AVIATION",
    "ADMINISTRATION",
    "DEPARTMENT",
    "TRANSPORTATION",
    "UNITED",
    "STATES",
    "AMERICA",
    "MEDICAL",
    "STUDENT",
    "PILOT",
    "AIRMAN",
    "CLASS",
    "DATE",
    "LIMITATIONS",
];

/// Extracts the document holder's name from OCR text.
///
/// Looks for a labelled `Name:` line first, then falls back to the first
/// all-caps line shaped like a person name that contains no document
/// boilerplate words.
pub fn extract_holder_name(text: &str) -> Option<String> {
    if let Some(caps) = name_label_re().captures(text) {
        let value = caps[1].trim();
        if !value.is_empty() {
            return Some(value.to_owned());
        }
    }

    for line in text.lines() {
        let line = line.trim();
        if !uppercase_name_line_re().is_match(line) {
            continue;
        }
        let has_stopword = line
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphabetic()))
            .any(|w| NAME_LINE_STOPWORDS.contains(&w));
        if !has_stopword {
            return Some(line.to_owned());
        }
    }
    None
}

/// Extracts a certificate number: a labelled `CERT NO`-style field first,
/// then the first bare seven-digit group.
pub fn extract_certificate_number(text: &str) -> Option<String> {
    if let Some(caps) = certificate_number_label_re().captures(text) {
        return Some(caps[1].to_owned());
    }
    bare_certificate_number_re()
        .captures(text)
        .map(|caps| caps[1].to_owned())
}

/// Extracts a date: a labelled issue/examination/expiration date first, then
/// the first `MM/DD/YYYY`-shaped token. Returned as found; no calendar
/// validation.
pub fn extract_date(text: &str) -> Option<String> {
    if let Some(caps) = date_label_re().captures(text) {
        return Some(caps[1].to_owned());
    }
    bare_date_re().captures(text).map(|caps| caps[1].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERTIFICATE_TEXT: &str = "\
DEPARTMENT OF TRANSPORTATION
FEDERAL AVIATION ADMINISTRATION
STUDENT PILOT CERTIFICATE
SMITH, JOHN ROBERT
CERT NO: 3912457
DATE OF ISSUE: 03/14/2024";

    const MEDICAL_TEXT: &str = "\
MEDICAL CERTIFICATE THIRD CLASS
Name: John Smith
Date of Examination: 01/02/2024
LIMITATIONS: NONE";

    #[test]
    fn test_labelled_name_is_preferred() {
        assert_eq!(
            extract_holder_name(MEDICAL_TEXT).as_deref(),
            Some("John Smith")
        );
    }

    #[test]
    fn test_uppercase_line_fallback_skips_boilerplate() {
        assert_eq!(
            extract_holder_name(CERTIFICATE_TEXT).as_deref(),
            Some("SMITH, JOHN ROBERT")
        );
    }

    #[test]
    fn test_no_name_yields_none() {
        assert_eq!(extract_holder_name("FEDERAL AVIATION ADMINISTRATION"), None);
        assert_eq!(extract_holder_name(""), None);
    }

    #[test]
    fn test_labelled_certificate_number() {
        assert_eq!(
            extract_certificate_number(CERTIFICATE_TEXT).as_deref(),
            Some("3912457")
        );
        assert_eq!(
            extract_certificate_number("Certificate Number 4821943C").as_deref(),
            Some("4821943C")
        );
    }

    #[test]
    fn test_bare_seven_digit_fallback() {
        assert_eq!(
            extract_certificate_number("issued 1234567 today").as_deref(),
            Some("1234567")
        );
        assert_eq!(extract_certificate_number("no numbers here"), None);
    }

    #[test]
    fn test_labelled_date_is_preferred_over_earlier_bare_date() {
        let text = "scanned 9/9/2020\nDate of Examination: 01/02/2024";
        assert_eq!(extract_date(text).as_deref(), Some("01/02/2024"));
    }

    #[test]
    fn test_bare_date_fallback_and_hyphen_form() {
        assert_eq!(extract_date("renewed 3-14-24, no label").as_deref(), Some("3-14-24"));
        assert_eq!(extract_date("no date"), None);
    }

    #[test]
    fn test_apostrophes_survive_name_extraction() {
        let text = "Name: Mary O'Brien";
        assert_eq!(extract_holder_name(text).as_deref(), Some("Mary O'Brien"));
    }
}
