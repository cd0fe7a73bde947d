//! Raw data tree traversal.
//!
//! Directory listings are sorted by file name so the corpus order depends
//! only on what is on disk, never on the order the OS returns entries in.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use parcorpus_shared::{BuildConfig, CorpusError, Result};

/// A directory entry with its name already extracted.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: OsString,
    pub path: PathBuf,
}

/// Session directories found under the raw root.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Qualifying session directories, in name order.
    pub sessions: Vec<PathBuf>,
    /// Root entries rejected by the marker or metadata filters.
    pub skipped: usize,
}

/// List the entries of `dir`, sorted by file name.
pub fn sorted_entries(dir: &Path) -> Result<Vec<Entry>> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| CorpusError::io(dir, e))?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| CorpusError::io(dir, e))?;
        entries.push(Entry {
            name: entry.file_name(),
            path: entry.path(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Find the session directories directly under `root`.
#[instrument(skip_all, fields(root = %root.display(), marker = %config.session_marker))]
pub fn session_dirs(root: &Path, config: &BuildConfig) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    for entry in sorted_entries(root)? {
        let name = entry.name.to_string_lossy().into_owned();

        if name == config.metadata_entry_name {
            debug!(entry = %name, "skipping metadata entry");
            result.skipped += 1;
            continue;
        }
        if !name.contains(config.session_marker.as_str()) {
            debug!(entry = %name, "no session marker, skipping");
            result.skipped += 1;
            continue;
        }
        if !entry.path.is_dir() {
            debug!(entry = %name, "marker matched a non-directory, skipping");
            result.skipped += 1;
            continue;
        }

        result.sessions.push(entry.path);
    }

    debug!(
        sessions = result.sessions.len(),
        skipped = result.skipped,
        "scanned raw root"
    );
    Ok(result)
}

/// List the example files of one session directory, in name order.
pub fn example_files(session: &Path, config: &BuildConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in sorted_entries(session)? {
        if entry.name.to_string_lossy() == config.metadata_entry_name.as_str() {
            continue;
        }
        if entry.path.is_dir() {
            debug!(path = %entry.path.display(), "nested directory in session, skipping");
            continue;
        }
        files.push(entry.path);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pc-scan-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn entries_are_sorted_by_name() {
        let tmp = temp_dir();
        for name in ["c.txt", "a.txt", "b.txt"] {
            std::fs::write(tmp.join(name), "x\ny\n").unwrap();
        }

        let names: Vec<_> = sorted_entries(&tmp)
            .unwrap()
            .into_iter()
            .map(|e| e.name.into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn session_filter_applies_marker_and_metadata_rules() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("AMT_Turk_2")).unwrap();
        std::fs::create_dir_all(tmp.join("AMT_Turk_1")).unwrap();
        std::fs::create_dir_all(tmp.join("pilot")).unwrap();
        std::fs::create_dir_all(tmp.join("turk_lowercase")).unwrap();
        std::fs::write(tmp.join(".DS_Store"), "junk").unwrap();
        std::fs::write(tmp.join("Turk_notes.txt"), "not a dir").unwrap();

        let config = BuildConfig::default();
        let result = session_dirs(&tmp, &config).unwrap();

        assert_eq!(
            result.sessions,
            vec![tmp.join("AMT_Turk_1"), tmp.join("AMT_Turk_2")]
        );
        assert_eq!(result.skipped, 4);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn example_files_skip_metadata_and_dirs() {
        let tmp = temp_dir();
        std::fs::write(tmp.join("ex_2.txt"), "a\nb\n").unwrap();
        std::fs::write(tmp.join("ex_1.txt"), "a\nb\n").unwrap();
        std::fs::write(tmp.join(".DS_Store"), "junk").unwrap();
        std::fs::create_dir_all(tmp.join("nested")).unwrap();

        let files = example_files(&tmp, &BuildConfig::default()).unwrap();
        assert_eq!(files, vec![tmp.join("ex_1.txt"), tmp.join("ex_2.txt")]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_root_is_io_error() {
        let missing = std::env::temp_dir().join(format!("pc-missing-{}", uuid::Uuid::now_v7()));
        let err = session_dirs(&missing, &BuildConfig::default()).unwrap_err();
        assert!(matches!(err, CorpusError::Io { ref path, .. } if *path == missing));
    }
}
