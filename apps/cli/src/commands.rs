//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use parcorpus_core::builder::{self, ProgressReporter};
use parcorpus_core::ibm1::{self, Ibm1, Ibm1Config};
use parcorpus_core::reader::ParallelCorpus;
use parcorpus_shared::{
    AppConfig, BuildConfig, BuildSummary, init_config, init_config_at, load_config,
    load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// parcorpus: aggregate two-line examples into an aligned parallel corpus.
#[derive(Parser)]
#[command(
    name = "parcorpus",
    version,
    about = "Build aligned machine-language / English corpora from raw example files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.parcorpus/parcorpus.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the english/machine corpus pair from the raw data tree.
    Build {
        #[command(flatten)]
        overrides: BuildOverrides,

        /// Print the build summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check that an existing corpus pair is line-aligned.
    Verify {
        /// English corpus file (defaults to the configured english_out).
        #[arg(long)]
        english: Option<PathBuf>,

        /// Machine corpus file (defaults to the configured machine_out).
        #[arg(long)]
        machine: Option<PathBuf>,
    },

    /// Leave-one-out accuracy of an IBM Model 1 English to machine translator.
    Evaluate {
        #[command(flatten)]
        corpus: CorpusFiles,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Translate an English sentence into the most likely machine expression.
    Translate {
        /// Space-separated English words.
        text: String,

        #[command(flatten)]
        corpus: CorpusFiles,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags that override `[corpus]` values from the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct BuildOverrides {
    /// Directory holding the raw session directories.
    #[arg(long)]
    pub raw_root: Option<PathBuf>,

    /// Output file for English lines.
    #[arg(long)]
    pub english_out: Option<PathBuf>,

    /// Output file for machine-language lines.
    #[arg(long)]
    pub machine_out: Option<PathBuf>,

    /// Substring a directory name must contain to be read as a session.
    #[arg(long)]
    pub session_marker: Option<String>,

    /// Entry name skipped at every level (e.g. .DS_Store).
    #[arg(long)]
    pub metadata_entry_name: Option<String>,
}

impl BuildOverrides {
    fn apply(self, mut config: BuildConfig) -> BuildConfig {
        if let Some(p) = self.raw_root {
            config.raw_root = p;
        }
        if let Some(p) = self.english_out {
            config.english_out = p;
        }
        if let Some(p) = self.machine_out {
            config.machine_out = p;
        }
        if let Some(m) = self.session_marker {
            config.session_marker = m;
        }
        if let Some(n) = self.metadata_entry_name {
            config.metadata_entry_name = n;
        }
        config
    }
}

/// Corpus pair a translation model is trained on.
#[derive(Args, Debug, Default)]
pub(crate) struct CorpusFiles {
    /// English corpus file (defaults to the configured english_out).
    #[arg(long)]
    pub english: Option<PathBuf>,

    /// Machine corpus file (defaults to the configured machine_out).
    #[arg(long)]
    pub machine: Option<PathBuf>,
}

impl CorpusFiles {
    /// Load the pair with English as the source side.
    fn load(self, config_path: Option<&Path>) -> Result<ParallelCorpus> {
        let defaults = BuildConfig::from(&resolve_config(config_path)?);
        let english = self.english.unwrap_or(defaults.english_out);
        let machine = self.machine.unwrap_or(defaults.machine_out);

        ParallelCorpus::load_strict(&english, &machine).wrap_err_with(|| {
            format!(
                "could not load corpus from '{}' and '{}'",
                english.display(),
                machine.display()
            )
        })
    }
}

/// IBM Model 1 training flags.
#[derive(Args, Debug)]
pub(crate) struct ModelArgs {
    /// EM iterations per trained model.
    #[arg(long, default_value_t = 30)]
    pub iterations: usize,

    /// Weight candidates by the corpus target length distribution.
    #[arg(long)]
    pub length_prior: bool,
}

impl From<ModelArgs> for Ibm1Config {
    fn from(args: ModelArgs) -> Self {
        Self {
            iterations: args.iterations,
            length_prior: args.length_prior,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = format!("parcorpus={level},parcorpus_core={level},parcorpus_shared={level}");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Build { overrides, json } => cmd_build(config_path.as_deref(), overrides, json),
        Command::Verify { english, machine } => {
            cmd_verify(config_path.as_deref(), english, machine)
        }
        Command::Evaluate { corpus, model } => {
            cmd_evaluate(config_path.as_deref(), corpus, model.into())
        }
        Command::Translate {
            text,
            corpus,
            model,
        } => cmd_translate(config_path.as_deref(), &text, corpus, model.into()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// Load the config from an explicit path, or the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn cmd_build(config_path: Option<&Path>, overrides: BuildOverrides, json: bool) -> Result<()> {
    let app = resolve_config(config_path)?;
    let config = overrides.apply(BuildConfig::from(&app));

    info!(
        raw_root = %config.raw_root.display(),
        marker = %config.session_marker,
        "building corpus"
    );

    let reporter = CliProgress::new();
    let summary = builder::build(&config, &reporter).wrap_err_with(|| {
        format!("corpus build from '{}' failed", config.raw_root.display())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("  Corpus built successfully!");
    println!("  Sessions: {}", summary.sessions);
    println!("  Skipped:  {}", summary.skipped_entries);
    println!("  Pairs:    {}", summary.examples);
    println!(
        "  English:  {} ({})",
        summary.english.path.display(),
        short_hash(&summary.english.sha256)
    );
    println!(
        "  Machine:  {} ({})",
        summary.machine.path.display(),
        short_hash(&summary.machine.sha256)
    );
    println!();

    Ok(())
}

fn cmd_verify(
    config_path: Option<&Path>,
    english: Option<PathBuf>,
    machine: Option<PathBuf>,
) -> Result<()> {
    let defaults = BuildConfig::from(&resolve_config(config_path)?);
    let english = english.unwrap_or(defaults.english_out);
    let machine = machine.unwrap_or(defaults.machine_out);

    info!(english = %english.display(), machine = %machine.display(), "verifying corpus");

    let corpus = ParallelCorpus::load_strict(&machine, &english)
        .wrap_err("corpus halves are not aligned")?;

    println!();
    println!("  Corpus is aligned.");
    println!("  Pairs:              {}", corpus.len());
    println!("  Max English length: {}", corpus.max_target_length());
    println!();

    Ok(())
}

fn cmd_evaluate(config_path: Option<&Path>, files: CorpusFiles, config: Ibm1Config) -> Result<()> {
    let corpus = files.load(config_path)?;

    info!(
        sentences = corpus.len(),
        iterations = config.iterations,
        length_prior = config.length_prior,
        "running leave-one-out evaluation"
    );

    let bar = ProgressBar::new(corpus.len() as u64);
    let style = ProgressStyle::with_template("{bar:30.cyan} {pos}/{len} held-out sentences")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);

    let report = ibm1::leave_one_out(&corpus, config, |current, _| {
        bar.set_position(current as u64)
    });
    bar.finish_and_clear();

    println!();
    println!("  Leave-one-out evaluation");
    println!("  Correct:            {}/{}", report.correct, report.total);
    println!("  Accuracy:           {:.4}", report.accuracy);
    println!("  Max machine length: {}", corpus.max_target_length());
    println!();

    Ok(())
}

fn cmd_translate(
    config_path: Option<&Path>,
    text: &str,
    files: CorpusFiles,
    config: Ibm1Config,
) -> Result<()> {
    let corpus = files.load(config_path)?;
    let model = Ibm1::train(&corpus, config);

    let source: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
    let Some(translated) = model.translate(&source) else {
        color_eyre::eyre::bail!("corpus is empty, nothing to translate into");
    };

    println!("{}", translated.join(" "));
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => {
            init_config_at(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn short_hash(sha256: &str) -> &str {
    sha256.get(..12).unwrap_or(sha256)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Clears the spinner on error paths too.
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn session_started(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Session [{current}/{total}] {name}"));
    }

    fn example_read(&self, path: &str, total_examples: usize) {
        self.spinner
            .set_message(format!("Read {total_examples} examples ({path})"));
    }

    fn done(&self, _summary: &BuildSummary) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_flags_override_config() {
        let cli = Cli::try_parse_from([
            "parcorpus",
            "build",
            "--raw-root",
            "/data/amt",
            "--session-marker",
            "Batch",
        ])
        .expect("parse");

        let Command::Build { overrides, json } = cli.command else {
            panic!("expected build command");
        };
        assert!(!json);

        let config = overrides.apply(BuildConfig::default());
        assert_eq!(config.raw_root, PathBuf::from("/data/amt"));
        assert_eq!(config.session_marker, "Batch");
        assert_eq!(config.english_out, PathBuf::from("data/corpus/english.txt"));
        assert_eq!(config.metadata_entry_name, ".DS_Store");
    }

    #[test]
    fn empty_overrides_keep_config() {
        let config = BuildOverrides::default().apply(BuildConfig::default());
        assert_eq!(config.machine_out, PathBuf::from("data/corpus/machine.txt"));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "parcorpus",
            "verify",
            "--english",
            "e.txt",
            "-vv",
            "--log-format",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn metadata_entry_name_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "parcorpus",
            "build",
            "--metadata-entry-name",
            "Thumbs.db",
        ])
        .expect("parse");

        let Command::Build { overrides, .. } = cli.command else {
            panic!("expected build command");
        };
        let config = overrides.apply(BuildConfig::default());
        assert_eq!(config.metadata_entry_name, "Thumbs.db");

        assert!(Cli::try_parse_from(["parcorpus", "build", "--metadata-name", "x"]).is_err());
    }

    #[test]
    fn evaluate_defaults_to_thirty_iterations() {
        let cli = Cli::try_parse_from(["parcorpus", "evaluate", "--machine", "m.txt"])
            .expect("parse");

        let Command::Evaluate { corpus, model } = cli.command else {
            panic!("expected evaluate command");
        };
        assert_eq!(corpus.machine, Some(PathBuf::from("m.txt")));
        assert!(corpus.english.is_none());
        assert_eq!(Ibm1Config::from(model), Ibm1Config::default());
    }

    #[test]
    fn translate_takes_text_and_model_flags() {
        let cli = Cli::try_parse_from([
            "parcorpus",
            "translate",
            "go to the red room",
            "--iterations",
            "5",
            "--length-prior",
        ])
        .expect("parse");

        let Command::Translate { text, model, .. } = cli.command else {
            panic!("expected translate command");
        };
        assert_eq!(text, "go to the red room");
        let config = Ibm1Config::from(model);
        assert_eq!(config.iterations, 5);
        assert!(config.length_prior);
    }

    #[test]
    fn short_hash_truncates() {
        assert_eq!(short_hash(&"a".repeat(64)), "aaaaaaaaaaaa");
        assert_eq!(short_hash("abc"), "abc");
    }
}
