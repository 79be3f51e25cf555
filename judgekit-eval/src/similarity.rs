//! Reference-based text similarity: sentence BLEU and ROUGE-1/2/L
//!
//! All scores are in `[0, 1]` and depend only on the two input strings.
//! Matching is case-sensitive, so "The" and "the" are different tokens.

use std::collections::{BTreeMap, HashMap, HashSet};

pub const BLEU: &str = "bleu";
pub const ROUGE_1: &str = "rouge-1";
pub const ROUGE_2: &str = "rouge-2";
pub const ROUGE_L: &str = "rouge-l";

const MAX_BLEU_ORDER: usize = 4;

/// Scores a candidate translation against a reference translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// All similarity scores keyed by metric name.
    pub fn score(&self, candidate: &str, reference: &str) -> BTreeMap<String, f64> {
        let candidate = tokenize(candidate);
        let reference = tokenize(reference);

        BTreeMap::from([
            (BLEU.to_string(), bleu_tokens(&candidate, &reference)),
            (ROUGE_1.to_string(), rouge_n_tokens(&candidate, &reference, 1)),
            (ROUGE_2.to_string(), rouge_n_tokens(&candidate, &reference, 2)),
            (ROUGE_L.to_string(), rouge_l_tokens(&candidate, &reference)),
        ])
    }

    /// Sentence-level BLEU with effective order and exponential smoothing.
    pub fn bleu(&self, candidate: &str, reference: &str) -> f64 {
        bleu_tokens(&tokenize(candidate), &tokenize(reference))
    }

    /// ROUGE-N F-measure
    pub fn rouge_n(&self, candidate: &str, reference: &str, n: usize) -> f64 {
        rouge_n_tokens(&tokenize(candidate), &tokenize(reference), n)
    }

    /// ROUGE-L F-measure (longest common subsequence)
    pub fn rouge_l(&self, candidate: &str, reference: &str) -> f64 {
        rouge_l_tokens(&tokenize(candidate), &tokenize(reference))
    }
}

/// Word tokens with case preserved; each punctuation character is its own token.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() || c == '\'' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

fn bleu_tokens(candidate: &[String], reference: &[String]) -> f64 {
    if candidate.is_empty() || reference.is_empty() {
        return 0.0;
    }

    // Orders longer than the candidate have no n-grams and are skipped
    let effective_order = candidate.len().min(MAX_BLEU_ORDER);
    let mut smoothing = 1.0;
    let mut log_precision_sum = 0.0;

    for n in 1..=effective_order {
        let cand = ngram_counts(candidate, n);
        let refs = ngram_counts(reference, n);
        let total = candidate.len() + 1 - n;
        let matches: usize =
            cand.iter().map(|(gram, count)| (*count).min(refs.get(gram).copied().unwrap_or(0))).sum();

        let precision = if matches == 0 {
            smoothing *= 2.0;
            1.0 / (smoothing * total as f64)
        } else {
            matches as f64 / total as f64
        };
        log_precision_sum += precision.ln();
    }

    let brevity_penalty = if candidate.len() < reference.len() {
        (1.0 - reference.len() as f64 / candidate.len() as f64).exp()
    } else {
        1.0
    };

    (brevity_penalty * (log_precision_sum / effective_order as f64).exp()).clamp(0.0, 1.0)
}

fn f_measure(overlap: usize, candidate_len: usize, reference_len: usize) -> f64 {
    if overlap == 0 || candidate_len == 0 || reference_len == 0 {
        return 0.0;
    }
    let precision = overlap as f64 / candidate_len as f64;
    let recall = overlap as f64 / reference_len as f64;
    2.0 * precision * recall / (precision + recall)
}

fn rouge_n_tokens(candidate: &[String], reference: &[String], n: usize) -> f64 {
    let cand: HashSet<&[String]> = ngram_counts(candidate, n).into_keys().collect();
    let refs: HashSet<&[String]> = ngram_counts(reference, n).into_keys().collect();
    let overlap = refs.intersection(&cand).count();
    f_measure(overlap, cand.len(), refs.len())
}

fn rouge_l_tokens(candidate: &[String], reference: &[String]) -> f64 {
    let lcs = lcs_length(reference, candidate);
    f_measure(lcs, candidate.len(), reference.len())
}

/// Length of longest common subsequence
fn lcs_length(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Two rolling rows of the usual DP table
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y { prev[j] + 1 } else { prev[j + 1].max(curr[j]) };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
