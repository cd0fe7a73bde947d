//! IBM Model 1 word translation trained on a [`ParallelCorpus`].
//!
//! The corpus source side is translated into its target side. `t(f|e)` is
//! learned by EM with every source sentence extended by a NULL word, and
//! translation picks the most likely sentence among the target sentences
//! seen during training.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info, instrument, trace};

use crate::reader::ParallelCorpus;

/// Source word every target word may align to.
pub const NULL_TOKEN: &str = "**N**";

/// Floor applied to every re-estimated probability.
pub const MIN_PROB: f64 = 1.0e-12;

/// Training parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ibm1Config {
    /// Number of EM iterations.
    pub iterations: usize,
    /// Weight candidates by the corpus length estimate `P(l | m)`.
    pub length_prior: bool,
}

impl Default for Ibm1Config {
    fn default() -> Self {
        Self {
            iterations: 30,
            length_prior: false,
        }
    }
}

/// A trained IBM Model 1.
#[derive(Debug, Clone)]
pub struct Ibm1 {
    /// `tau[e][f]` is `t(f | e)`.
    tau: HashMap<String, HashMap<String, f64>>,
    /// Distinct target sentences, sorted.
    outputs: Vec<Vec<String>>,
    /// `(target length, source length) -> P(l | m)` when the prior is on.
    length_prior: Option<HashMap<(usize, usize), f64>>,
}

impl Ibm1 {
    /// Start from uniform probabilities and run `config.iterations` EM steps.
    #[instrument(skip_all, fields(sentences = corpus.len(), iterations = config.iterations))]
    pub fn train(corpus: &ParallelCorpus, config: Ibm1Config) -> Self {
        let mut model = Self::uniform(corpus);

        for iteration in 0..config.iterations {
            model.em_step(corpus);
            trace!(iteration, "em iteration done");
        }

        if config.length_prior {
            model.length_prior = Some(length_table(corpus, &model.outputs));
        }

        debug!(
            source_vocab = model.tau.len() - 1,
            outputs = model.outputs.len(),
            "model trained"
        );
        model
    }

    fn uniform(corpus: &ParallelCorpus) -> Self {
        let target_vocab: BTreeSet<&str> = corpus
            .sentences()
            .iter()
            .flat_map(|s| s.target_words.iter().map(String::as_str))
            .collect();

        let initial = if target_vocab.is_empty() {
            0.0
        } else {
            1.0 / target_vocab.len() as f64
        };
        let row: HashMap<String, f64> = target_vocab
            .iter()
            .map(|f| ((*f).to_owned(), initial))
            .collect();

        let mut tau = HashMap::new();
        tau.insert(NULL_TOKEN.to_owned(), row.clone());
        for sentence in corpus.sentences() {
            for e in &sentence.source_words {
                tau.entry(e.clone()).or_insert_with(|| row.clone());
            }
        }

        let outputs = corpus
            .sentences()
            .iter()
            .map(|s| s.target_words.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            tau,
            outputs,
            length_prior: None,
        }
    }

    /// One expectation/maximization pass over the corpus.
    fn em_step(&mut self, corpus: &ParallelCorpus) {
        let mut counts: HashMap<&str, HashMap<&str, f64>> = HashMap::new();
        let mut totals: HashMap<&str, f64> = HashMap::new();

        for sentence in corpus.sentences() {
            let source: Vec<&str> = std::iter::once(NULL_TOKEN)
                .chain(sentence.source_words.iter().map(String::as_str))
                .collect();

            for f in &sentence.target_words {
                let z: f64 = source.iter().map(|e| self.probability(f, e)).sum();
                if z <= 0.0 {
                    continue;
                }
                for &e in &source {
                    let c = self.probability(f, e) / z;
                    *counts.entry(e).or_default().entry(f.as_str()).or_default() += c;
                    *totals.entry(e).or_default() += c;
                }
            }
        }

        for (e, row) in &mut self.tau {
            let Some(&total) = totals.get(e.as_str()).filter(|t| **t > 0.0) else {
                continue;
            };
            let counted = counts.get(e.as_str());
            for (f, p) in row.iter_mut() {
                let count = counted
                    .and_then(|c| c.get(f.as_str()))
                    .copied()
                    .unwrap_or(0.0);
                *p = (count / total).max(MIN_PROB);
            }
        }
    }

    /// `t(f | e)`, or [`MIN_PROB`] for pairs never seen in training.
    pub fn probability(&self, f: &str, e: &str) -> f64 {
        self.tau
            .get(e)
            .and_then(|row| row.get(f))
            .copied()
            .unwrap_or(MIN_PROB)
    }

    /// Distinct target sentences the model can produce.
    pub fn outputs(&self) -> &[Vec<String>] {
        &self.outputs
    }

    /// Log-likelihood of `target` given `source` under the model.
    pub fn score(&self, source: &[String], target: &[String]) -> f64 {
        let aligned = source.len() + 1;
        let lexical: f64 = target
            .iter()
            .map(|f| {
                let sum: f64 = std::iter::once(NULL_TOKEN)
                    .chain(source.iter().map(String::as_str))
                    .map(|e| self.probability(f, e))
                    .sum();
                sum.ln()
            })
            .sum();
        let mut score = lexical - target.len() as f64 * (aligned as f64).ln();

        if let Some(prior) = &self.length_prior {
            if let Some(p) = prior.get(&(target.len(), source.len())) {
                score += p.ln();
            }
        }
        score
    }

    /// Most likely observed target sentence for `source`.
    ///
    /// Ties go to the first sentence in sorted order. Returns `None` when the
    /// model was trained on an empty corpus.
    pub fn translate(&self, source: &[String]) -> Option<&[String]> {
        let mut best: Option<(&[String], f64)> = None;
        for candidate in &self.outputs {
            let score = self.score(source, candidate);
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((candidate.as_slice(), score));
            }
        }
        best.map(|(words, _)| words)
    }
}

/// Estimates for every observed source length paired with every output length.
fn length_table(
    corpus: &ParallelCorpus,
    outputs: &[Vec<String>],
) -> HashMap<(usize, usize), f64> {
    let source_lengths: BTreeSet<usize> = corpus
        .sentences()
        .iter()
        .map(|s| s.source_words.len())
        .collect();
    let target_lengths: BTreeSet<usize> = outputs.iter().map(Vec::len).collect();

    let mut table = HashMap::new();
    for &m in &source_lengths {
        for &l in &target_lengths {
            let p = corpus.length_estimate(l, m);
            if p > 0.0 {
                table.insert((l, m), p);
            }
        }
    }
    table
}

/// A translation is good when it contains every word of the reference.
pub fn good_translation(actual: &[String], translated: &[String]) -> bool {
    actual.iter().all(|w| translated.contains(w))
}

/// Outcome of a leave-one-out evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LooReport {
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Train on all but one sentence, translate the held-out source, repeat for
/// every sentence.
///
/// `on_step(current, total)` runs after each held-out sentence is scored.
#[instrument(skip_all, fields(sentences = corpus.len(), iterations = config.iterations))]
pub fn leave_one_out(
    corpus: &ParallelCorpus,
    config: Ibm1Config,
    mut on_step: impl FnMut(usize, usize),
) -> LooReport {
    let total = corpus.len();
    let mut correct = 0;

    for (i, held_out) in corpus.sentences().iter().enumerate() {
        let model = Ibm1::train(&corpus.without(i), config);
        let hit = model
            .translate(&held_out.source_words)
            .is_some_and(|out| good_translation(&held_out.target_words, out));

        if hit {
            correct += 1;
        }
        debug!(
            index = i,
            hit,
            input = %held_out.source_words.join(" "),
            expected = %held_out.target_words.join(" "),
            "held-out sentence scored"
        );
        on_step(i + 1, total);
    }

    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };
    info!(correct, total, accuracy, "leave-one-out finished");

    LooReport {
        correct,
        total,
        accuracy,
    }
}
