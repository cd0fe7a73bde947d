//! Loading an aligned corpus pair back into memory.
//!
//! Either half may be loaded as the source side. `verify` reads the
//! machine file as source; translation models read the English file as
//! source and the machine file as target.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, instrument};

use parcorpus_shared::{AlignedSentence, CorpusError, Result};

/// A corpus held as tokenised aligned sentences.
#[derive(Debug, Clone, Default)]
pub struct ParallelCorpus {
    sentences: Vec<AlignedSentence>,
}

impl ParallelCorpus {
    /// Read `source_path` and `target_path` in lock-step.
    ///
    /// Reading stops at the end of the shorter file.
    #[instrument(
        skip_all,
        fields(source = %source_path.display(), target = %target_path.display())
    )]
    pub fn load(source_path: &Path, target_path: &Path) -> Result<Self> {
        let source = read_lines(source_path)?;
        let target = read_lines(target_path)?;

        if source.len() != target.len() {
            debug!(
                source = source.len(),
                target = target.len(),
                "corpus halves differ in length, truncating to the shorter"
            );
        }

        Ok(Self::from_lines(&source, &target))
    }

    /// Like [`ParallelCorpus::load`], but fails with
    /// [`CorpusError::AlignmentMismatch`] when the line counts differ.
    ///
    /// The error reports the source count as `machine` and the target count
    /// as `english`.
    pub fn load_strict(source_path: &Path, target_path: &Path) -> Result<Self> {
        let source = read_lines(source_path)?;
        let target = read_lines(target_path)?;

        if source.len() != target.len() {
            return Err(CorpusError::AlignmentMismatch {
                machine: source.len(),
                english: target.len(),
            });
        }

        Ok(Self::from_lines(&source, &target))
    }

    /// Wrap already tokenised sentences.
    pub fn from_sentences(sentences: Vec<AlignedSentence>) -> Self {
        Self { sentences }
    }

    /// A copy of the corpus with the sentence at `index` left out.
    pub fn without(&self, index: usize) -> Self {
        let sentences = self
            .sentences
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, s)| s.clone())
            .collect();
        Self { sentences }
    }

    fn from_lines(source: &[String], target: &[String]) -> Self {
        let sentences = source
            .iter()
            .zip(target)
            .map(|(s, t)| AlignedSentence::from_lines(s, t))
            .collect();
        Self { sentences }
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AlignedSentence> {
        self.sentences.get(index)
    }

    pub fn sentences(&self) -> &[AlignedSentence] {
        &self.sentences
    }

    /// Longest target sentence, in words.
    pub fn max_target_length(&self) -> usize {
        self.sentences
            .iter()
            .map(|s| s.target_words.len())
            .max()
            .unwrap_or(0)
    }

    /// Add-one smoothed estimate of a target length `l` given source length `m`.
    ///
    /// Returns `0.0` when no source sentence has length `m`.
    pub fn length_estimate(&self, l: usize, m: usize) -> f64 {
        let with_source_len: Vec<_> = self
            .sentences
            .iter()
            .filter(|s| s.source_words.len() == m)
            .collect();

        if with_source_len.is_empty() {
            return 0.0;
        }

        let hits = with_source_len
            .iter()
            .filter(|s| s.target_words.len() == l)
            .count();
        (hits + 1) as f64 / with_source_len.len() as f64
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| CorpusError::io(path, e))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use parcorpus_shared::BuildConfig;

    use super::*;
    use crate::builder::{SilentProgress, build};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pc-reader-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_pair(dir: &Path, machine: &str, english: &str) -> (PathBuf, PathBuf) {
        let m = dir.join("machine.txt");
        let e = dir.join("english.txt");
        std::fs::write(&m, machine).unwrap();
        std::fs::write(&e, english).unwrap();
        (m, e)
    }

    #[test]
    fn load_tokenizes_each_line_pair() {
        let tmp = temp_dir();
        let (m, e) = write_pair(
            &tmp,
            "agentInRoom agent0 room1\nblockInRoom block0 room2\n",
            "go to room one\npush the block to room two\n",
        );

        let corpus = ParallelCorpus::load(&m, &e).unwrap();
        assert_eq!(corpus.len(), 2);

        let first = corpus.get(0).unwrap();
        assert_eq!(first.source_words, vec!["agentInRoom", "agent0", "room1"]);
        assert_eq!(first.target_words, vec!["go", "to", "room", "one"]);
        assert_eq!(corpus.max_target_length(), 6);
        assert!(corpus.get(2).is_none());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_truncates_to_shorter_half() {
        let tmp = temp_dir();
        let (m, e) = write_pair(&tmp, "a\nb\nc\n", "x\ny\n");

        let corpus = ParallelCorpus::load(&m, &e).unwrap();
        assert_eq!(corpus.len(), 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_strict_rejects_mismatch() {
        let tmp = temp_dir();
        let (m, e) = write_pair(&tmp, "a\nb\nc\n", "x\ny\n");

        let err = ParallelCorpus::load_strict(&m, &e).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::AlignmentMismatch {
                machine: 3,
                english: 2
            }
        ));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = temp_dir();
        let err = ParallelCorpus::load(&tmp.join("nope.txt"), &tmp.join("nope2.txt")).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn without_drops_one_sentence() {
        let corpus = ParallelCorpus::from_sentences(vec![
            AlignedSentence::from_lines("a", "x"),
            AlignedSentence::from_lines("b", "y"),
            AlignedSentence::from_lines("c", "z"),
        ]);

        let held_out = corpus.without(1);
        assert_eq!(held_out.len(), 2);
        assert_eq!(held_out.sentences()[1].source_words, vec!["c"]);
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn length_estimate_is_add_one_smoothed() {
        let tmp = temp_dir();
        let (m, e) = write_pair(
            &tmp,
            "a b\nc d\ne f\ng\n",
            "one two three\nfour five\nsix seven eight\nnine\n",
        );
        let corpus = ParallelCorpus::load(&m, &e).unwrap();

        // Three sources of length 2; two of them have 3-word targets.
        assert!((corpus.length_estimate(3, 2) - 1.0).abs() < f64::EPSILON);
        assert!((corpus.length_estimate(2, 2) - 2.0 / 3.0).abs() < 1e-9);
        assert!((corpus.length_estimate(5, 2) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(corpus.length_estimate(1, 7), 0.0);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn reads_back_what_build_wrote() {
        let tmp = temp_dir();
        let config = BuildConfig {
            raw_root: tmp.join("raw"),
            english_out: tmp.join("out/english.txt"),
            machine_out: tmp.join("out/machine.txt"),
            ..BuildConfig::default()
        };
        let session = config.raw_root.join("AMT_Turk_1");
        std::fs::create_dir_all(&session).unwrap();
        std::fs::write(
            session.join("1.txt"),
            "agentInRoom agent0 room0\ngo to room zero\n",
        )
        .unwrap();
        std::fs::write(session.join("2.txt"), "isRed room1\nthe red room").unwrap();

        let summary = build(&config, &SilentProgress).unwrap();
        let corpus =
            ParallelCorpus::load_strict(&config.machine_out, &config.english_out).unwrap();

        assert_eq!(corpus.len(), summary.examples);
        assert_eq!(corpus.sentences()[1].source_words, vec!["isRed", "room1"]);
        assert_eq!(corpus.sentences()[1].target_words, vec!["the", "red", "room"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
