use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "provision")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative package provisioning for Debian-based systems", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Make the system match a descriptor
    Apply(ApplyArgs),

    /// Preview what apply would change
    Diff(DiffArgs),

    /// Parse and validate a descriptor, print the apply order
    Validate {
        /// Descriptor file (.toml or .json)
        descriptor: PathBuf,
    },

    /// Show the last recorded apply run
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Apply / Diff
// ============================================================================

#[derive(Parser)]
pub struct ApplyArgs {
    /// Descriptor file (.toml or .json)
    pub descriptor: PathBuf,

    /// Query only, show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Only apply matching resources: package, repository, package.<name>, repository.<id>
    #[arg(long)]
    pub only: Option<String>,

    /// Attempts per adapter call for transient failures (overrides config)
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Pass --force-yes to apt-get (overrides config)
    #[arg(long)]
    pub force_yes: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Descriptor file (.toml or .json)
    pub descriptor: PathBuf,

    /// Only diff matching resources: package, repository, package.<name>, repository.<id>
    #[arg(long)]
    pub only: Option<String>,
}
