use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for the `pactoria` binary.
#[derive(Debug, Parser)]
#[command(name = "pactoria", version, about = "Pactoria - contract management API for UK SMEs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ./pactoria.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub config: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            config: self.config.clone(),
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Apply database migrations and exit.
    Migrate,
    /// Print the effective configuration with secrets masked.
    Config,
}

#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    /// Listen address, overriding server.bind_addr
    #[arg(long)]
    pub bind: Option<String>,

    /// Development mode: sign tokens with an ephemeral secret when none is configured
    #[arg(long)]
    pub dev: bool,
}
