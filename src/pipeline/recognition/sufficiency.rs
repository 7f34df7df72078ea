//! Sufficiency gate for the strategy loop.
//!
//! Recognized text is "sufficient" when it contains enough known medical
//! term signatures to be worth extracting from; the orchestrator stops at
//! the first sufficient strategy.

use std::sync::LazyLock;

use regex::Regex;

/// Confidence thresholds used by the orchestrator and report summary.
pub mod thresholds {
    /// Below this: recognition likely failed. Downstream output is flagged.
    pub const VERY_LOW: f32 = 0.30;

    /// Below this: significant uncertainty in the recognized text.
    pub const LOW: f32 = 0.50;

    /// Above this: high confidence.
    pub const HIGH: f32 = 0.85;

    /// Digital text layers and structured input.
    pub const VERY_HIGH: f32 = 0.95;
}

/// Minimum character count before signature matching is attempted.
pub const MIN_TEXT_LEN: usize = 5;

/// Minimum number of distinct signature matches for sufficiency.
pub const MIN_SIGNATURE_MATCHES: usize = 2;

/// Signatures of laboratory vocabulary. Case-insensitive; one hit per
/// pattern counts once no matter how often it occurs.
static MEDICAL_SIGNATURES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bh(?:a?emoglobin|gb|b)\b",
        r"(?i)\bwbc\b|\bleu[ck]ocyte",
        r"(?i)\brbc\b|\berythrocyte",
        r"(?i)\bplatelets?\b|\bplt\b|\bthrombocyte",
        r"(?i)\bglucose\b|\bsugar\b",
        r"(?i)\bcholesterol\b|\bhdl\b|\bldl\b|\btriglyceride",
        r"(?i)\bneutrophils?\b|\blymphocytes?\b|\bmonocytes?\b",
        r"(?i)\bmcv\b|\bmch\b|\bmchc\b|\bpcv\b|\bh(?:a?e)matocrit\b",
        r"(?i)\bcreatinine\b|\burea\b",
        r"(?i)\bcumm\b|/cumm|g/d[lL]|mg/d[lL]|mill\b|thou\b",
        r"(?i)\btest\b|\bresult\b|\breference\b|\blaborator",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Count how many distinct signatures the text matches.
pub fn signature_score(text: &str) -> usize {
    MEDICAL_SIGNATURES
        .iter()
        .filter(|re| re.is_match(text))
        .count()
}

/// Sufficiency check: enough text, enough recognizable vocabulary.
pub fn is_sufficient(text: &str) -> bool {
    text.trim().len() >= MIN_TEXT_LEN && signature_score(text) >= MIN_SIGNATURE_MATCHES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_report_text_is_sufficient() {
        let text = "Hemoglobin 12.5 g/dL\nWBC Count 9000 /cumm\nPlatelet Count 250000";
        assert!(is_sufficient(text));
        assert!(signature_score(text) >= 3);
    }

    #[test]
    fn prose_without_lab_terms_is_insufficient() {
        assert!(!is_sufficient("The quick brown fox jumps over the lazy dog"));
    }

    #[test]
    fn short_garbage_is_insufficient() {
        assert!(!is_sufficient("xg1"));
        assert!(!is_sufficient(""));
    }

    #[test]
    fn single_signature_is_not_enough() {
        // One recognizable term could be noise; the gate wants two.
        assert!(!is_sufficient("glucose mentioned in passing prose here"));
    }

    #[test]
    fn abbreviations_count_as_signatures() {
        assert!(is_sufficient("Hb 9.5 g/dl and PLT 95 thou/cumm"));
    }

    #[test]
    fn repeated_term_counts_once() {
        let text = "glucose glucose glucose glucose";
        assert_eq!(signature_score(text), 1);
    }

    #[test]
    fn thresholds_are_ordered() {
        assert!(thresholds::VERY_LOW < thresholds::LOW);
        assert!(thresholds::LOW < thresholds::HIGH);
        assert!(thresholds::HIGH < thresholds::VERY_HIGH);
    }
}
