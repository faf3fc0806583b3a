//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use quantifying_core::{PathTable, RunContext, git, update_readme};
use quantifying_readme::EntryUpdate;
use quantifying_shared::{
    AppConfig, Quarter, RunConfig, init_config, init_config_at, load_config, load_config_from,
};
use tracing::info;

/// Phase a report update runs in unless told otherwise.
const REPORT_PHASE: &str = "3-report";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Quantifying — maintain quarterly commons reports.
#[derive(Parser)]
#[command(
    name = "quantifying",
    version,
    about = "Maintain quarterly Quantifying the Commons reports and sync them with git.",
    long_about = None,
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.quantifying/quantifying.toml).
    #[arg(long, env = "QUANTIFYING_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Repository root (overrides the config file).
    #[arg(long, env = "QUANTIFYING_REPO", global = true)]
    pub repo: Option<PathBuf>,

    /// Reporting quarter as YYYYQn (defaults to the current UTC quarter).
    #[arg(long, env = "QUANTIFYING_QUARTER", global = true)]
    pub quarter: Option<Quarter>,

    /// Write report updates to disk.
    #[arg(long, env = "QUANTIFYING_ENABLE_SAVE", global = true)]
    pub enable_save: bool,

    /// Run git fetch/merge/commit/push.
    #[arg(long, env = "QUANTIFYING_ENABLE_GIT", global = true)]
    pub enable_git: bool,
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
    /// Quarterly README report operations.
    Readme {
        #[command(subcommand)]
        action: ReadmeAction,
    },

    /// Show the resolved repository paths.
    Paths {
        /// Pipeline phase the paths are resolved for.
        #[arg(long, default_value = REPORT_PHASE)]
        phase: String,

        /// Resolve paths for the quarter before --quarter.
        #[arg(long)]
        previous: bool,

        /// Print the table as JSON instead of logging it.
        #[arg(long)]
        json: bool,
    },

    /// Git synchronization.
    Git {
        #[command(subcommand)]
        action: GitAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// README subcommands.
#[derive(Subcommand)]
pub(crate) enum ReadmeAction {
    /// Insert or replace one entry in a section of the quarter's README.
    Upsert {
        /// Section title (`## <section>`).
        #[arg(long)]
        section: String,

        /// Entry title (`### <entry>`).
        #[arg(long)]
        entry: String,

        /// Image to reference; requires --caption.
        #[arg(long)]
        image: Option<PathBuf>,

        /// Image caption; requires --image.
        #[arg(long)]
        caption: Option<String>,

        /// Entry text.
        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,

        /// Read the entry text from a file.
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Pipeline phase performing the update.
        #[arg(long, default_value = REPORT_PHASE)]
        phase: String,
    },
}

/// Git subcommands.
#[derive(Subcommand)]
pub(crate) enum GitAction {
    /// Fetch origin and merge the branch into the current one.
    Fetch {
        /// Branch to merge (defaults to the current branch).
        #[arg(long)]
        branch: Option<String>,
    },
    /// Stage and commit a path.
    Commit {
        /// Path to commit (defaults to the quarter's data directory).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Commit message.
        #[arg(short, long)]
        message: String,

        /// Push after committing (skipped when there was nothing to commit).
        #[arg(long)]
        push: bool,
    },
    /// Push the current branch to origin.
    Push,
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

    let filter = match cli.global.verbose {
        0 => "quantifying=info",
        1 => "quantifying=debug",
        _ => "quantifying=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.global.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let Cli { global, command } = cli;

    match command {
        Command::Readme { action } => match action {
            ReadmeAction::Upsert {
                section,
                entry,
                image,
                caption,
                text,
                text_file,
                phase,
            } => {
                let text = match (text, text_file) {
                    (Some(text), _) => Some(text),
                    (None, Some(file)) => Some(read_text_file(&file)?),
                    (None, None) => None,
                };
                let update = EntryUpdate {
                    section_title: section,
                    entry_title: entry,
                    image_path: image,
                    image_caption: caption,
                    entry_text: text,
                };
                cmd_readme_upsert(&global, &phase, &update)
            }
        },
        Command::Paths {
            phase,
            previous,
            json,
        } => cmd_paths(&global, &phase, previous, json),
        Command::Git { action } => match action {
            GitAction::Fetch { branch } => cmd_git_fetch(&global, branch.as_deref()),
            GitAction::Commit {
                path,
                message,
                push,
            } => cmd_git_commit(&global, path, &message, push),
            GitAction::Push => cmd_git_push(&global),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&global),
            ConfigAction::Show => cmd_config_show(&global),
        },
    }
}

// ---------------------------------------------------------------------------
// Context construction
// ---------------------------------------------------------------------------

/// Load the config file named by `--config`, or the default one.
fn resolve_config(global: &GlobalArgs) -> Result<AppConfig> {
    let config = match &global.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Build the run context for `phase` from config, flags, and today's quarter.
fn build_context(global: &GlobalArgs, phase: &str) -> Result<RunContext> {
    let config = resolve_config(global)?;
    let run = RunConfig::from(&config).with_overrides(global.enable_save, global.enable_git);

    let repo = global
        .repo
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.defaults.repo));
    let quarter = global.quarter.unwrap_or_else(Quarter::current);
    let paths = PathTable::setup(&repo, phase, quarter)?;

    Ok(RunContext::new(run, quarter, paths))
}

fn read_text_file(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre!("cannot read text file '{}': {e}", path.display()))?;
    Ok(text.trim_end_matches(['\n', '\r']).to_string())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_readme_upsert(global: &GlobalArgs, phase: &str, update: &EntryUpdate) -> Result<()> {
    let ctx = build_context(global, phase)?;

    info!(
        quarter = %ctx.quarter,
        section = %update.section_title,
        entry = %update.entry_title,
        "updating report"
    );

    match update_readme(&ctx, update)? {
        Some(path) => println!("  Report updated: {}", ctx.paths.display_relative(&path)),
        None => println!("  Saving disabled (--enable-save); report not written."),
    }
    Ok(())
}

fn cmd_paths(global: &GlobalArgs, phase: &str, previous: bool, json: bool) -> Result<()> {
    let mut ctx = build_context(global, phase)?;
    if previous {
        let prior = ctx.quarter.previous();
        ctx.paths.update_quarter(ctx.quarter, prior);
        ctx.quarter = prior;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&ctx.paths)?);
    } else {
        ctx.paths.log();
    }
    Ok(())
}

fn cmd_git_fetch(global: &GlobalArgs, branch: Option<&str>) -> Result<()> {
    let ctx = build_context(global, REPORT_PHASE)?;
    let repo = ctx.paths.repo().to_path_buf();
    git::fetch_and_merge(&ctx, &repo, branch)?;
    Ok(())
}

fn cmd_git_commit(
    global: &GlobalArgs,
    path: Option<PathBuf>,
    message: &str,
    push: bool,
) -> Result<()> {
    let ctx = build_context(global, REPORT_PHASE)?;
    let repo = ctx.paths.repo().to_path_buf();
    let add_path = match path {
        Some(p) => std::path::absolute(&p)?,
        None => ctx.paths.data_quarter().to_path_buf(),
    };

    let ctx = git::add_and_commit(ctx, &repo, &add_path, message)?;
    if push {
        git::push_changes(&ctx, &repo)?;
    }
    Ok(())
}

fn cmd_git_push(global: &GlobalArgs) -> Result<()> {
    let ctx = build_context(global, REPORT_PHASE)?;
    let repo = ctx.paths.repo().to_path_buf();
    git::push_changes(&ctx, &repo)?;
    Ok(())
}

fn cmd_config_init(global: &GlobalArgs) -> Result<()> {
    let path = match &global.config {
        Some(path) => {
            init_config_at(path)?;
            path.clone()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
