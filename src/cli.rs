use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::config::DEFAULT_MANIFEST;

#[derive(Parser)]
#[command(name = "repoflow")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative workspaces and package repositories for RepoFlow", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest declaring workspaces and repositories
    #[arg(long, global = true, env = "REPOFLOW_MANIFEST", default_value = DEFAULT_MANIFEST)]
    pub manifest: String,

    /// Tracked state file (default: .repoflow/state.toml next to the manifest)
    #[arg(long, global = true)]
    pub state: Option<String>,

    /// API base URL (overrides the manifest and REPOFLOW_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API key (overrides the manifest and REPOFLOW_API_KEY)
    #[arg(long, global = true, hide = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Create, replace and delete resources to match the manifest
    Apply(ApplyArgs),

    /// Start tracking a resource that already exists
    #[command(subcommand)]
    Import(ImportCommand),

    /// Show tracked resources
    Show(ShowArgs),

    /// Re-read tracked resources and forget the ones that are gone
    Refresh,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plan / Apply
// ============================================================================

#[derive(Parser)]
pub struct PlanArgs {
    /// Limit to a resource type or address (e.g. "repository" or "repository.npm-local")
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Limit to a resource type or address (e.g. "repository" or "repository.npm-local")
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show the plan without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of changes applied concurrently
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

// ============================================================================
// Import
// ============================================================================

#[derive(Subcommand)]
pub enum ImportCommand {
    /// Import a repository as <workspaceRef>/<repositoryId>
    Repository {
        /// Manifest address to track it under
        address: String,

        /// Existing repository, e.g. "example/3f1c..."
        id: String,
    },

    /// Import a workspace by name or id
    Workspace {
        /// Manifest address to track it under
        address: String,

        /// Workspace name or id
        reference: String,
    },
}

// ============================================================================
// Show
// ============================================================================

#[derive(Parser)]
pub struct ShowArgs {
    /// Address to show (e.g. "repository.npm-local")
    pub address: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
