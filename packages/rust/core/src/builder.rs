//! End-to-end `build` pipeline: raw tree → scan → read examples → write corpus.

use chrono::Utc;
use tracing::{info, instrument};

use parcorpus_shared::{BuildConfig, BuildSummary, Result};

use crate::corpus::CorpusPair;
use crate::{example, scan};

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a session directory is about to be read.
    fn session_started(&self, name: &str, current: usize, total: usize);
    /// Called after each example file is ingested.
    fn example_read(&self, path: &str, total_examples: usize);
    /// Called when the build completes.
    fn done(&self, summary: &BuildSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn session_started(&self, _name: &str, _current: usize, _total: usize) {}
    fn example_read(&self, _path: &str, _total_examples: usize) {}
    fn done(&self, _summary: &BuildSummary) {}
}

/// Read every example under `config.raw_root` and write the aligned corpus.
///
/// 1. Scan the root for session directories (sorted, filtered)
/// 2. Read each session's example files in name order
/// 3. Check alignment and write both corpus halves
///
/// Nothing is written unless every example was read successfully.
#[instrument(skip_all, fields(raw_root = %config.raw_root.display()))]
pub fn build(config: &BuildConfig, progress: &dyn ProgressReporter) -> Result<BuildSummary> {
    info!(
        marker = %config.session_marker,
        english_out = %config.english_out.display(),
        machine_out = %config.machine_out.display(),
        "starting corpus build"
    );

    // --- Phase 1: Scan ---
    progress.phase("Scanning sessions");
    let scanned = scan::session_dirs(&config.raw_root, config)?;

    // --- Phase 2: Read ---
    progress.phase("Reading examples");
    let mut corpus = CorpusPair::new();
    let total = scanned.sessions.len();

    for (i, session) in scanned.sessions.iter().enumerate() {
        let name = session
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        progress.session_started(&name, i + 1, total);

        let before = corpus.len();
        for file in scan::example_files(session, config)? {
            corpus.push(example::read_example(&file)?);
            progress.example_read(&file.to_string_lossy(), corpus.len());
        }

        info!(session = %name, examples = corpus.len() - before, "session read");
    }

    // --- Phase 3: Write ---
    progress.phase("Writing corpus");
    let (english, machine) = corpus.write(&config.english_out, &config.machine_out)?;

    let summary = BuildSummary {
        sessions: total,
        skipped_entries: scanned.skipped,
        examples: corpus.len(),
        english,
        machine,
        completed_at: Utc::now(),
    };

    info!(
        sessions = summary.sessions,
        examples = summary.examples,
        "corpus build complete"
    );
    progress.done(&summary);

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
