//! Core domain types for parallel corpora.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ExamplePair
// ---------------------------------------------------------------------------

/// One parsed example file: a machine command and its English description.
///
/// Both lines keep their trailing line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamplePair {
    /// Line 1 of the example file.
    pub machine: String,
    /// Line 2 of the example file.
    pub english: String,
    /// File the pair was read from.
    pub source: PathBuf,
}

// ---------------------------------------------------------------------------
// BuildSummary
// ---------------------------------------------------------------------------

/// Metadata for one written corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMeta {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Outcome of a successful corpus build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Number of session directories traversed.
    pub sessions: usize,
    /// Root entries skipped by the marker / metadata filters.
    pub skipped_entries: usize,
    /// Number of aligned pairs written.
    pub examples: usize,
    /// English half of the corpus.
    pub english: OutputMeta,
    /// Machine-language half of the corpus.
    pub machine: OutputMeta,
    /// When the outputs were flushed.
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AlignedSentence
// ---------------------------------------------------------------------------

/// A tokenised line pair read back from a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedSentence {
    /// Words of the source-side line.
    pub source_words: Vec<String>,
    /// Words of the target-side line.
    pub target_words: Vec<String>,
}

impl AlignedSentence {
    /// Tokenise a line pair on single spaces, dropping line terminators.
    pub fn from_lines(source: &str, target: &str) -> Self {
        Self {
            source_words: tokenize(source),
            target_words: tokenize(target),
        }
    }
}

fn tokenize(line: &str) -> Vec<String> {
    line.trim_end_matches(['\n', '\r'])
        .split(' ')
        .map(str::to_owned)
        .collect()
}
