use chatgpt_md_export::{input, process, utils, vcs};
use clap::Parser;
use clap::error::ErrorKind;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: chatgpt-md-export <input_path>";
const DEFAULT_OUTPUT_DIR: &str = "output_dir";

/// Convert a ChatGPT data export into Markdown notes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Export archive (.zip), a directory containing conversations.json,
    /// or a conversations JSON file.
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory to write notes/ and attachments/ into.
    /// Defaults to ./output_dir if not set in config.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Stage, commit and tag the generated notes with git afterwards.
    #[arg(long)]
    commit: bool,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/chatgpt-md-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print each note written and enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress standard output (progress bar and summary).
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default, Debug)]
struct FileConfig {
    output_dir: Option<PathBuf>,
    commit: Option<bool>,
}

/// `None` means the arguments were unusable and only the usage line should be printed.
fn parse_args<I, T>(args: I) -> Option<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Some(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => None,
    }
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("chatgpt-md-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .try_init()
        .map_err(|e| eyre!("Failed to initialise logging: {e}"))
}

fn main() -> Result<()> {
    let Some(cli) = parse_args(std::env::args_os()) else {
        println!("{USAGE}");
        return Ok(());
    };

    init_tracing(cli.verbose)?;

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve output_dir (CLI > Config > ./output_dir)
    let output_dir = match cli.output_dir.or(file_cfg.output_dir) {
        Some(dir) => dir,
        None => std::env::current_dir()
            .wrap_err("Failed to determine current directory")?
            .join(DEFAULT_OUTPUT_DIR),
    };

    let config = utils::ExportConfig {
        output_dir,
        commit: cli.commit || file_cfg.commit.unwrap_or(false),
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // 3. Load the export; an extracted archive is removed when `input` drops
    let mut input = input::resolve_input(&cli.input_path)?;
    let records = std::mem::take(&mut input.records);
    let summary = process::convert_all(records, input.root(), &config)?;
    drop(input);

    if !config.quiet {
        println!("Conversion to Markdown completed successfully!");
        eprintln!(
            "Done. {} created, {} appended, {} attachments copied.",
            summary.created, summary.appended, summary.attachments
        );
    }

    // 4. Optional git bookkeeping
    if config.commit {
        vcs::commit_to_git(&config.output_dir, summary.total())?;
    }

    Ok(())
}
