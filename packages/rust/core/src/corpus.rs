//! In-memory corpus pair and its serialization to disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use parcorpus_shared::{CorpusError, ExamplePair, OutputMeta, Result};

/// Two line sequences where `machine[i]` is aligned with `english[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusPair {
    machine: Vec<String>,
    english: Vec<String>,
}

impl CorpusPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one example, machine line first.
    pub fn push(&mut self, pair: ExamplePair) {
        self.machine.push(pair.machine);
        self.english.push(pair.english);
    }

    /// Number of aligned pairs.
    pub fn len(&self) -> usize {
        self.machine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machine.is_empty()
    }

    pub fn machine(&self) -> &[String] {
        &self.machine
    }

    pub fn english(&self) -> &[String] {
        &self.english
    }

    /// Fail with [`CorpusError::AlignmentMismatch`] if the halves differ in length.
    pub fn check_alignment(&self) -> Result<()> {
        if self.machine.len() != self.english.len() {
            return Err(CorpusError::AlignmentMismatch {
                machine: self.machine.len(),
                english: self.english.len(),
            });
        }
        Ok(())
    }

    /// Write both halves as raw concatenations of their lines.
    ///
    /// Alignment and distinct output paths are checked before anything
    /// touches the disk. Each half is staged in a hidden sibling temp file,
    /// and the targets are only replaced once both temp files are complete.
    ///
    /// Returns `(english, machine)` output metadata.
    #[instrument(skip_all, fields(pairs = self.len()))]
    pub fn write(
        &self,
        english_out: &Path,
        machine_out: &Path,
    ) -> Result<(OutputMeta, OutputMeta)> {
        self.check_alignment()?;

        if same_target(english_out, machine_out) {
            return Err(CorpusError::config(format!(
                "english and machine outputs both resolve to {}",
                machine_out.display()
            )));
        }

        let machine_content = self.machine.concat();
        let english_content = self.english.concat();

        let machine_temp = stage(machine_out, &machine_content)?;
        let english_temp = match stage(english_out, &english_content) {
            Ok(temp) => temp,
            Err(e) => {
                let _ = std::fs::remove_file(&machine_temp);
                return Err(e);
            }
        };

        commit(&machine_temp, machine_out)?;
        commit(&english_temp, english_out)?;

        info!(
            pairs = self.len(),
            english = %english_out.display(),
            machine = %machine_out.display(),
            "corpus written"
        );

        Ok((
            output_meta(english_out, &english_content),
            output_meta(machine_out, &machine_content),
        ))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether two output paths name the same file.
///
/// Parents are canonicalized when they already exist, so `a/../x` and `x`
/// compare equal.
fn same_target(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    if a.file_name() != b.file_name() {
        return false;
    }

    let parent = |p: &Path| {
        let dir = p
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::canonicalize(dir).ok()
    };
    match (parent(a), parent(b)) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.tmp"))
}

/// Write `content` next to `target` and return the temp path.
fn stage(target: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CorpusError::io(parent, e))?;
    }

    let temp = temp_path(target);
    std::fs::write(&temp, content).map_err(|e| CorpusError::io(&temp, e))?;
    debug!(path = %temp.display(), size = content.len(), "staged corpus file");
    Ok(temp)
}

fn commit(temp: &Path, target: &Path) -> Result<()> {
    std::fs::rename(temp, target).map_err(|e| CorpusError::io(target, e))
}

fn output_meta(path: &Path, content: &str) -> OutputMeta {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());

    OutputMeta {
        path: path.to_path_buf(),
        sha256: format!("{:x}", hasher.finalize()),
        size_bytes: content.len(),
    }
}
