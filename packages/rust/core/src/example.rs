//! Reading of single two-line example files.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use parcorpus_shared::{CorpusError, ExamplePair, Result};

/// Split `content` after each `\n`, keeping the terminator on every line.
///
/// `"a\nb"` and `"a\nb\n"` both yield two lines; an empty string yields none.
/// Only `\n` ends a line. A `\r\n` ending is kept verbatim on the line, and
/// a lone `\r` does not break it, so `"CMD\rdesc\r"` is a single line. This
/// differs from text-mode readers that also split on bare `\r`.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

/// Read one example file into a machine/English pair.
///
/// Line 1 is the machine command, line 2 the English description. A second
/// line without a terminator gets `\n` appended so concatenated corpora stay
/// line-aligned.
pub fn read_example(path: &Path) -> Result<ExamplePair> {
    let content = {
        let mut file = std::fs::File::open(path).map_err(|e| CorpusError::io(path, e))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)
            .map_err(|e| CorpusError::io(path, e))?;
        buf
    };

    let lines = split_lines(&content);
    let (machine, english) = match lines.as_slice() {
        [machine, english] => (*machine, *english),
        _ => return Err(CorpusError::malformed(path, lines.len())),
    };

    let mut english = english.to_owned();
    if !english.ends_with('\n') {
        english.push('\n');
    }

    debug!(path = %path.display(), "read example");
    Ok(ExamplePair {
        machine: machine.to_owned(),
        english,
        source: path.to_path_buf(),
    })
}
