//! Application configuration for parcorpus.
//!
//! User config lives at `~/.parcorpus/parcorpus.toml` unless a path is
//! given explicitly. CLI flags override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "parcorpus.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".parcorpus";

// ---------------------------------------------------------------------------
// Config structs (matching parcorpus.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Corpus layout and filters.
    #[serde(default)]
    pub corpus: CorpusConfig,
}

/// `[corpus]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding the raw session directories.
    #[serde(default = "default_raw_root")]
    pub raw_root: String,

    /// Output file for the English half of the corpus.
    #[serde(default = "default_english_out")]
    pub english_out: String,

    /// Output file for the machine-language half of the corpus.
    #[serde(default = "default_machine_out")]
    pub machine_out: String,

    /// Substring a directory name must contain to count as a session.
    #[serde(default = "default_session_marker")]
    pub session_marker: String,

    /// Entry name that is never treated as a session or an example.
    #[serde(default = "default_metadata_entry_name")]
    pub metadata_entry_name: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            raw_root: default_raw_root(),
            english_out: default_english_out(),
            machine_out: default_machine_out(),
            session_marker: default_session_marker(),
            metadata_entry_name: default_metadata_entry_name(),
        }
    }
}

fn default_raw_root() -> String {
    "data/raw".into()
}
fn default_english_out() -> String {
    "data/corpus/english.txt".into()
}
fn default_machine_out() -> String {
    "data/corpus/machine.txt".into()
}
fn default_session_marker() -> String {
    "Turk".into()
}
fn default_metadata_entry_name() -> String {
    ".DS_Store".into()
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the raw data tree.
    pub raw_root: PathBuf,
    /// Where the English lines are written.
    pub english_out: PathBuf,
    /// Where the machine-language lines are written.
    pub machine_out: PathBuf,
    /// Case-sensitive substring selecting session directories.
    pub session_marker: String,
    /// Filesystem metadata entry to skip at every level.
    pub metadata_entry_name: String,
}

impl From<&AppConfig> for BuildConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            raw_root: PathBuf::from(&config.corpus.raw_root),
            english_out: PathBuf::from(&config.corpus.english_out),
            machine_out: PathBuf::from(&config.corpus.machine_out),
            session_marker: config.corpus.session_marker.clone(),
            metadata_entry_name: config.corpus.metadata_entry_name.clone(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.parcorpus/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CorpusError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.parcorpus/parcorpus.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CorpusError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CorpusError::io(parent, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CorpusError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| CorpusError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[corpus]"));
        assert!(toml_str.contains("session_marker = \"Turk\""));
        assert!(toml_str.contains(".DS_Store"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.corpus.raw_root, "data/raw");
        assert_eq!(parsed.corpus.machine_out, "data/corpus/machine.txt");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[corpus]
raw_root = "/srv/amt/raw"
session_marker = "Batch"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.corpus.raw_root, "/srv/amt/raw");
        assert_eq!(config.corpus.session_marker, "Batch");
        assert_eq!(config.corpus.english_out, "data/corpus/english.txt");
        assert_eq!(config.corpus.metadata_entry_name, ".DS_Store");
    }

    #[test]
    fn empty_config_is_default() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(config.corpus.session_marker, "Turk");
    }

    #[test]
    fn build_config_from_app_config() {
        let app = AppConfig::default();
        let build = BuildConfig::from(&app);
        assert_eq!(build.raw_root, PathBuf::from("data/raw"));
        assert_eq!(build.english_out, PathBuf::from("data/corpus/english.txt"));
        assert_eq!(build.session_marker, "Turk");
    }

    #[test]
    fn init_and_load_from_path() {
        let dir = std::env::temp_dir().join(format!("pc-config-test-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join(CONFIG_FILE_NAME);

        init_config_at(&path).expect("init config");
        let loaded = load_config_from(&path).expect("load config");
        assert_eq!(loaded.corpus.metadata_entry_name, ".DS_Store");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_invalid_toml_is_config_error() {
        let dir = std::env::temp_dir().join(format!("pc-config-bad-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[corpus\nraw_root = ").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, CorpusError::Config { .. }));
        assert!(err.to_string().contains("failed to parse"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
