//! Clap derive structures for the `modelfs` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// modelfs -- console CLI for model and dataset management
#[derive(Debug, Parser)]
#[command(
    name = "modelfs",
    version,
    about = "Manage models, model sources, and datasets from the command line",
    long_about = "A CLI for the modelfs administrative console.\n\n\
        Lists and mutates namespaced resources over the console REST API,\n\
        and can mirror a namespace live over the SSE event feed (`watch`).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Console profile to use
    #[arg(long, short = 'p', env = "MODELFS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Console base URL (overrides profile)
    #[arg(long, short = 's', env = "MODELFS_SERVER", global = true)]
    pub server: Option<String>,

    /// Namespace (overrides the persisted selection)
    #[arg(long, short = 'n', env = "MODELFS_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MODELFS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "MODELFS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "MODELFS_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage models
    #[command(alias = "model", alias = "m")]
    Models(ModelsArgs),

    /// Manage model sources
    #[command(alias = "source", alias = "src")]
    Sources(SourcesArgs),

    /// View datasets
    #[command(alias = "ds")]
    Datasets(DatasetsArgs),

    /// Manage namespaces and the active selection
    #[command(alias = "ns")]
    Namespaces(NamespacesArgs),

    /// Mirror the active namespace live and print changes as they land
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ── Models ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub action: ModelsAction,
}

#[derive(Debug, Subcommand)]
pub enum ModelsAction {
    /// List models in the namespace
    #[command(alias = "ls")]
    List,

    /// Show one model's detail, including versions
    Get { name: String },

    /// Delete a model
    #[command(alias = "rm")]
    Delete { name: String },

    /// Trigger a resync of a model
    Resync { name: String },
}

// ── Sources ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SourcesArgs {
    #[command(subcommand)]
    pub action: SourcesAction,
}

#[derive(Debug, Subcommand)]
pub enum SourcesAction {
    /// List model sources in the namespace
    #[command(alias = "ls")]
    List,

    /// Show one model source
    Get { name: String },

    /// Delete a model source
    #[command(alias = "rm")]
    Delete { name: String },
}

// ── Datasets ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DatasetsArgs {
    #[command(subcommand)]
    pub action: DatasetsAction,
}

#[derive(Debug, Subcommand)]
pub enum DatasetsAction {
    /// List datasets in the namespace
    #[command(alias = "ls")]
    List,
}

// ── Namespaces ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NamespacesArgs {
    #[command(subcommand)]
    pub action: NamespacesAction,
}

#[derive(Debug, Subcommand)]
pub enum NamespacesAction {
    /// List namespaces known to the backend
    #[command(alias = "ls")]
    List,

    /// Persist a namespace as the active selection
    Use { name: String },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Disable the event feed and poll snapshots only
    #[arg(long)]
    pub no_events: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,

    /// Write a starter config file
    Init {
        /// Console base URL for the default profile
        #[arg(long, default_value = "http://localhost:8090")]
        server: String,
    },
}
