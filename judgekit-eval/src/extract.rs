//! Verdict extraction from free-form judge text
//!
//! The judge is asked for `Label: ... / Confidence: ...` but nothing relies on
//! that layout. The extractor scans the text for the first label from a closed
//! vocabulary and for a confidence number, and never calls the judge itself.

use crate::error::{EvalError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Confidence assigned when a label is found but no usable number is.
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Label recorded when extraction fails permanently.
pub const UNKNOWN_LABEL: &str = "unknown";

/// The judge's structured decision for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: String,
    /// Always within `[0, 1]`
    pub confidence: f64,
}

impl Verdict {
    /// Placeholder for an instance whose judge output could not be parsed.
    pub fn sentinel() -> Self {
        Self { label: UNKNOWN_LABEL.to_string(), confidence: 0.0 }
    }

    pub fn is_sentinel(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

/// Closed, case-insensitive set of labels a judge may answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim().to_lowercase();
            if label.is_empty() {
                return Err(EvalError::Config("Label vocabulary contains an empty label".into()));
            }
            if label == UNKNOWN_LABEL {
                return Err(EvalError::Config(format!(
                    "'{}' is reserved for unparsable verdicts",
                    UNKNOWN_LABEL
                )));
            }
            if !normalized.contains(&label) {
                normalized.push(label);
            }
        }
        if normalized.is_empty() {
            return Err(EvalError::Config("Label vocabulary is empty".to_string()));
        }
        Ok(Self { labels: normalized })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

/// Pure text scanner turning judge output into a [`Verdict`].
#[derive(Debug, Clone)]
pub struct VerdictExtractor {
    vocabulary: LabelVocabulary,
    label_pattern: Regex,
    keyed_confidence: Regex,
    bare_confidence: Regex,
    fallback_confidence: f64,
}

impl VerdictExtractor {
    pub fn new(vocabulary: LabelVocabulary, fallback_confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&fallback_confidence) {
            return Err(EvalError::Config(format!(
                "Fallback confidence must be within [0, 1], got {}",
                fallback_confidence
            )));
        }

        // Longer labels first so that a label which prefixes another cannot
        // shadow it at the same position.
        let mut alternatives: Vec<&String> = vocabulary.labels.iter().collect();
        alternatives.sort_by_key(|l| std::cmp::Reverse(l.len()));
        let alternation =
            alternatives.iter().map(|l| regex::escape(l)).collect::<Vec<_>>().join("|");

        let label_pattern = compile(&format!(r"(?i)(?:^|\W)({})(?:\W|$)", alternation))?;
        // Negative values keep their sign and clamp to 0. `n/d` is a fraction.
        let keyed_confidence = compile(
            r"(?i)\bconfidence(?:\s+(?:score|level))?\s*(?:[:=]|is|of)?\s*(-?\d+(?:\.\d+)?|-?\.\d+)(?:\s*/\s*(\d+(?:\.\d+)?))?(\s*%)?",
        )?;
        // Bare numbers need a decimal point; plain integers are too often
        // counts or list markers.
        let bare_confidence =
            compile(r"(?:^|[^\w.\-])(-?(?:0?\.\d+|1\.0+))(?:$|[^\w.%/]|\.(?:\s|$))")?;

        Ok(Self { vocabulary, label_pattern, keyed_confidence, bare_confidence, fallback_confidence })
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    pub fn fallback_confidence(&self) -> f64 {
        self.fallback_confidence
    }

    /// Extract `(label, confidence)` from judge text.
    ///
    /// The first vocabulary label in left-to-right order wins. Confidence is
    /// taken from a `confidence: <n>` phrase (percentages and `n/d` allowed) if
    /// present, otherwise from the first bare decimal such as `0.8`, otherwise the
    /// fallback. The result is clamped to `[0, 1]`.
    pub fn extract(&self, text: &str) -> Result<Verdict> {
        let label = self
            .label_pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_lowercase())
            .ok_or_else(|| EvalError::UnparsableVerdict(preview(text)))?;

        let confidence = self
            .keyed_confidence(text)
            .or_else(|| self.bare_confidence(text))
            .unwrap_or(self.fallback_confidence)
            .clamp(0.0, 1.0);

        Ok(Verdict { label, confidence })
    }

    fn keyed_confidence(&self, text: &str) -> Option<f64> {
        let captures = self.keyed_confidence.captures(text)?;
        let value: f64 = captures.get(1)?.as_str().parse().ok()?;
        if let Some(denominator) = captures.get(2) {
            let denominator: f64 = denominator.as_str().parse().ok()?;
            return (denominator > 0.0).then_some(value / denominator);
        }
        Some(if captures.get(3).is_some() { value / 100.0 } else { value })
    }

    fn bare_confidence(&self, text: &str) -> Option<f64> {
        self.bare_confidence.captures(text)?.get(1)?.as_str().parse().ok()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| EvalError::Config(format!("Invalid extraction pattern: {}", e)))
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("no recognized label in \"{}...\"", &trimmed[..idx]),
        None => format!("no recognized label in \"{}\"", trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sentiment() -> VerdictExtractor {
        let vocabulary = LabelVocabulary::new(["positive", "negative"]).unwrap();
        VerdictExtractor::new(vocabulary, DEFAULT_FALLBACK_CONFIDENCE).unwrap()
    }

    #[test]
    fn test_label_and_confidence() {
        let verdict = sentiment().extract("Label: positive, Confidence: 0.87").unwrap();
        assert_eq!(verdict, Verdict { label: "positive".to_string(), confidence: 0.87 });
    }

    #[test]
    fn test_label_without_number_uses_fallback() {
        let verdict = sentiment().extract("positive").unwrap();
        assert_eq!(verdict.label, "positive");
        assert_eq!(verdict.confidence, DEFAULT_FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_no_label_is_unparsable() {
        let err = sentiment().extract("I cannot determine the sentiment").unwrap_err();
        assert!(matches!(err, EvalError::UnparsableVerdict(_)));
    }

    #[test]
    fn test_first_label_wins() {
        let text = "NEGATIVE overall, although the opening is positive. Confidence: 0.6";
        let verdict = sentiment().extract(text).unwrap();
        assert_eq!(verdict.label, "negative");
        assert_eq!(verdict.confidence, 0.6);
    }

    #[test]
    fn test_labels_match_whole_words_only() {
        let extractor = VerdictExtractor::new(
            LabelVocabulary::new(["acceptable", "unacceptable"]).unwrap(),
            0.5,
        )
        .unwrap();
        assert_eq!(extractor.extract("Unacceptable: meaning lost").unwrap().label, "unacceptable");
        assert!(sentiment().extract("The film was positively dreadful").is_err());
    }

    #[test]
    fn test_confidence_out_of_range_is_clamped() {
        assert_eq!(sentiment().extract("positive; confidence = 1.7").unwrap().confidence, 1.0);
        assert_eq!(sentiment().extract("negative. Confidence: 87%").unwrap().confidence, 0.87);
        assert_eq!(sentiment().extract("negative, confidence 250%").unwrap().confidence, 1.0);
    }

    #[test]
    fn test_negative_confidence_clamps_to_zero() {
        assert_eq!(sentiment().extract("positive, confidence: -0.3").unwrap().confidence, 0.0);
        assert_eq!(sentiment().extract("positive -0.3").unwrap().confidence, 0.0);
        assert_eq!(sentiment().extract("Label: negative Confidence: -1").unwrap().confidence, 0.0);
        assert_eq!(sentiment().extract("negative, confidence -.4").unwrap().confidence, 0.0);
    }

    #[test]
    fn test_hyphen_is_not_a_sign_inside_words() {
        let verdict = sentiment().extract("positive, well-0.8 rated").unwrap();
        assert_eq!(verdict.confidence, DEFAULT_FALLBACK_CONFIDENCE);
        let verdict = sentiment().extract("positive - 0.8").unwrap();
        assert_eq!(verdict.confidence, 0.8);
    }

    #[test]
    fn test_bare_integers_are_not_confidence() {
        let verdict = sentiment().extract("Review 1: positive").unwrap();
        assert_eq!(verdict.confidence, DEFAULT_FALLBACK_CONFIDENCE);
        let verdict = sentiment().extract("Review 1: positive (1.0)").unwrap();
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_keyed_ratio_is_a_fraction() {
        assert_eq!(sentiment().extract("positive. Confidence: 9/10").unwrap().confidence, 0.9);
        assert_eq!(sentiment().extract("negative, confidence 3 / 4").unwrap().confidence, 0.75);
        // A zero denominator falls through to the fallback
        let verdict = sentiment().extract("negative, confidence 3/0").unwrap();
        assert_eq!(verdict.confidence, DEFAULT_FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_bare_fraction_is_used_without_keyword() {
        let verdict = sentiment().extract("negative (0.75)").unwrap();
        assert_eq!(verdict.confidence, 0.75);

        let verdict = sentiment().extract("positive with score .9.").unwrap();
        assert_eq!(verdict.confidence, 0.9);

        // 5 and 10 are not fractions; 2.5 neither
        let verdict = sentiment().extract("positive, 5 out of 10, rating 2.5").unwrap();
        assert_eq!(verdict.confidence, DEFAULT_FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_configurable_fallback() {
        let extractor =
            VerdictExtractor::new(LabelVocabulary::new(["good", "bad"]).unwrap(), 0.3).unwrap();
        assert_eq!(extractor.extract("Good").unwrap().confidence, 0.3);
        assert!(VerdictExtractor::new(LabelVocabulary::new(["good"]).unwrap(), 1.5).is_err());
    }

    #[test]
    fn test_vocabulary_validation() {
        assert!(LabelVocabulary::new(Vec::<String>::new()).is_err());
        assert!(LabelVocabulary::new(["positive", " "]).is_err());
        assert!(LabelVocabulary::new(["Unknown"]).is_err());

        let vocab = LabelVocabulary::new(["Positive", "positive", "NEGATIVE"]).unwrap();
        assert_eq!(vocab.labels(), ["positive", "negative"]);
        assert!(vocab.contains("Negative"));
    }

    #[test]
    fn test_sentinel() {
        let sentinel = Verdict::sentinel();
        assert!(sentinel.is_sentinel());
        assert_eq!(sentinel.confidence, 0.0);
    }

    proptest! {
        #[test]
        fn extracted_confidence_is_always_in_unit_interval(text in ".{0,200}") {
            if let Ok(verdict) = sentiment().extract(&text) {
                prop_assert!((0.0..=1.0).contains(&verdict.confidence));
            }
        }

        #[test]
        fn any_keyed_number_is_clamped(value in -1000.0f64..1000.0) {
            let verdict = sentiment().extract(&format!("positive, confidence: {value}")).unwrap();
            prop_assert!((0.0..=1.0).contains(&verdict.confidence));
        }
    }
}
