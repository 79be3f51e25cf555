//! Dataset-level metrics
//!
//! [`OverallMetrics`] is a pure function of the full [`InstanceResult`]
//! collection. Nothing is accumulated while the run is in progress.

use crate::error::{EvalError, Result};
use crate::report::{InstanceResult, normalize_label};
use crate::similarity::{BLEU, ROUGE_L};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Precision/recall/F1 for a single reference label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Instances carrying this reference label
    pub support: usize,
}

/// Aggregate statistics for a run
///
/// Classification metrics are `None` when no instance carries a reference
/// label. Accuracy is correct instances over all instances; precision, recall
/// and F1 are macro-averaged over the labels present in the reference set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total: usize,
    pub labelled: usize,
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    /// Mean confidence over every instance, sentinels included
    pub avg_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_bleu: Option<f64>,
    /// Mean ROUGE-L F-measure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rouge: Option<f64>,
    /// Mean of each extra score over the instances that produced it
    #[serde(default)]
    pub avg_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub per_label: BTreeMap<String, LabelMetrics>,
}

impl OverallMetrics {
    pub fn from_results(results: &[InstanceResult]) -> Result<Self> {
        validate(results)?;

        let labelled: Vec<(String, String)> = results
            .iter()
            .filter_map(|r| {
                r.reference_label
                    .as_deref()
                    .map(|reference| (normalize_label(reference), normalize_label(&r.verdict.label)))
            })
            .collect();

        // Unlabelled instances can never be correct but still count toward
        // the denominator.
        let accuracy = (!labelled.is_empty()).then(|| {
            let correct = results.iter().filter(|r| r.reference_label.is_some() && r.correct).count();
            correct as f64 / results.len() as f64
        });

        let per_label = per_label_metrics(&labelled);
        let macro_avg = |metric: fn(&LabelMetrics) -> f64| {
            (!per_label.is_empty())
                .then(|| per_label.values().map(metric).sum::<f64>() / per_label.len() as f64)
        };

        let avg_confidence =
            results.iter().map(|r| r.verdict.confidence).sum::<f64>() / results.len() as f64;
        let avg_scores = average_scores(results);

        Ok(Self {
            total: results.len(),
            labelled: labelled.len(),
            accuracy,
            precision: macro_avg(|m| m.precision),
            recall: macro_avg(|m| m.recall),
            f1: macro_avg(|m| m.f1),
            avg_confidence,
            avg_bleu: avg_scores.get(BLEU).copied(),
            avg_rouge: avg_scores.get(ROUGE_L).copied(),
            avg_scores,
            per_label,
        })
    }
}

fn validate(results: &[InstanceResult]) -> Result<()> {
    if results.is_empty() {
        return Err(EvalError::Metrics("No instance results to aggregate".to_string()));
    }

    let mut seen = HashSet::new();
    for result in results {
        if !seen.insert(result.instance_id.as_str()) {
            return Err(EvalError::Metrics(format!(
                "Duplicate result for instance '{}'",
                result.instance_id
            )));
        }
        if !result.verdict.confidence.is_finite() {
            return Err(EvalError::Metrics(format!(
                "Non-finite confidence for instance '{}'",
                result.instance_id
            )));
        }
        if let Some((name, _)) = result.extra_scores.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EvalError::Metrics(format!(
                "Non-finite {} score for instance '{}'",
                name, result.instance_id
            )));
        }
    }
    Ok(())
}

/// One entry per label in the reference set. A label that is never
/// predicted has precision 0.
fn per_label_metrics(pairs: &[(String, String)]) -> BTreeMap<String, LabelMetrics> {
    let labels: BTreeSet<&str> = pairs.iter().map(|(reference, _)| reference.as_str()).collect();

    labels
        .into_iter()
        .map(|label| {
            let true_positive = pairs.iter().filter(|(r, p)| r == label && p == label).count();
            let predicted = pairs.iter().filter(|(_, p)| p == label).count();
            let support = pairs.iter().filter(|(r, _)| r == label).count();

            let precision = ratio(true_positive, predicted);
            let recall = ratio(true_positive, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            (label.to_string(), LabelMetrics { precision, recall, f1, support })
        })
        .collect()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

fn average_scores(results: &[InstanceResult]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for result in results {
        for (name, score) in &result.extra_scores {
            let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    sums.into_iter().map(|(name, (sum, count))| (name.to_string(), sum / count as f64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Verdict;
    use crate::schema::EvaluationInstance;

    fn result(id: &str, reference: &str, predicted: &str, confidence: f64) -> InstanceResult {
        InstanceResult::new(
            &EvaluationInstance::review(id, "text", reference),
            Verdict { label: predicted.to_string(), confidence },
            1,
        )
    }

    #[test]
    fn test_all_correct_is_perfect() {
        let results = vec![
            result("0", "positive", "positive", 0.9),
            result("1", "negative", "negative", 0.7),
            result("2", "positive", "positive", 0.8),
        ];
        let metrics = OverallMetrics::from_results(&results).unwrap();
        assert_eq!(metrics.accuracy, Some(1.0));
        assert_eq!(metrics.precision, Some(1.0));
        assert_eq!(metrics.recall, Some(1.0));
        assert_eq!(metrics.f1, Some(1.0));
        assert!((metrics.avg_confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_two_class_macro_f1() {
        // positive: P = 1/2, R = 1, F1 = 2/3. negative: never predicted, all zero.
        let results = vec![
            result("0", "positive", "positive", 0.9),
            result("1", "negative", "positive", 0.6),
        ];
        let metrics = OverallMetrics::from_results(&results).unwrap();
        let f1 = metrics.f1.unwrap();
        assert!(f1 > 0.0 && f1 < 1.0);
        assert!((f1 - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(metrics.precision, Some(0.25));
        assert_eq!(metrics.recall, Some(0.5));
        assert_eq!(metrics.accuracy, Some(0.5));
        assert_eq!(metrics.per_label["negative"].precision, 0.0);
        assert_eq!(metrics.per_label["positive"].support, 1);
    }

    #[test]
    fn test_sentinels_count_toward_confidence_and_accuracy() {
        let instance = EvaluationInstance::review("1", "text", "negative");
        let results = vec![
            result("0", "positive", "positive", 1.0),
            InstanceResult::new(&instance, Verdict::sentinel(), 2),
        ];
        let metrics = OverallMetrics::from_results(&results).unwrap();
        assert_eq!(metrics.avg_confidence, 0.5);
        assert_eq!(metrics.accuracy, Some(0.5));
        // "unknown" is predicted but is not a reference label
        assert!(!metrics.per_label.contains_key("unknown"));
    }

    #[test]
    fn test_similarity_averages_skip_unscored_instances() {
        let scored = |id: &str, bleu: f64, rouge: f64| {
            InstanceResult::new(
                &EvaluationInstance::translation(id, "src", "cand"),
                Verdict { label: "good".to_string(), confidence: 0.5 },
                1,
            )
            .with_extra_scores(BTreeMap::from([
                (BLEU.to_string(), bleu),
                (ROUGE_L.to_string(), rouge),
            ]))
        };
        let unscored = InstanceResult::new(
            &EvaluationInstance::translation("2", "src", "cand"),
            Verdict { label: "bad".to_string(), confidence: 0.5 },
            1,
        );

        let metrics =
            OverallMetrics::from_results(&[scored("0", 0.2, 0.4), scored("1", 0.4, 0.8), unscored])
                .unwrap();
        assert!((metrics.avg_bleu.unwrap() - 0.3).abs() < 1e-12);
        assert!((metrics.avg_rouge.unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(metrics.labelled, 0);
        assert_eq!(metrics.accuracy, None);
        assert_eq!(metrics.f1, None);
    }

    #[test]
    fn test_accuracy_counts_unlabelled_instances() {
        let judged = |id: &str, label: Option<&str>| {
            let mut instance = EvaluationInstance::translation(id, "src", "cand");
            if let Some(label) = label {
                instance = instance.with_label(label);
            }
            InstanceResult::new(&instance, Verdict { label: "good".to_string(), confidence: 0.9 }, 1)
        };
        let results = vec![judged("0", Some("good")), judged("1", Some("Good")), judged("2", None)];

        let metrics = OverallMetrics::from_results(&results).unwrap();
        assert_eq!(metrics.total, 3);
        assert_eq!(metrics.labelled, 2);
        assert!((metrics.accuracy.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        // Per-label figures only see the labelled pairs
        assert_eq!(metrics.per_label["good"].support, 2);
        assert_eq!(metrics.f1, Some(1.0));
    }

    #[test]
    fn test_malformed_collections_rejected() {
        assert!(matches!(OverallMetrics::from_results(&[]), Err(EvalError::Metrics(_))));

        let duplicated = vec![result("0", "positive", "positive", 0.9), result("0", "negative", "negative", 0.9)];
        assert!(OverallMetrics::from_results(&duplicated).is_err());

        let nan = vec![result("0", "positive", "positive", f64::NAN)];
        assert!(OverallMetrics::from_results(&nan).is_err());
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let results = vec![
            result("0", "positive", "negative", 0.31),
            result("1", "negative", "negative", 0.77),
            result("2", "neutral", "positive", 0.12),
            result("3", "positive", "positive", 0.95),
        ];
        let first = OverallMetrics::from_results(&results).unwrap();
        let second = OverallMetrics::from_results(&results).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
