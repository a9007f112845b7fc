mod check;
mod dump;
mod init;

pub use check::*;
use clap::Subcommand;
pub use dump::*;
pub use init::*;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Load a bundle, synthesize every VirtualServer and report warnings
    Check {
        /// Path to bundle directory
        #[arg(default_value = "bundle")]
        path: PathBuf,

        /// Print warnings without colors
        #[arg(short, long, default_value = "false")]
        plain: bool,

        /// Print warnings as JSON
        #[arg(long, conflicts_with = "plain")]
        json: bool,
    },

    /// Print the synthesized configuration documents
    Dump {
        #[arg(default_value = "bundle")]
        path: PathBuf,

        /// Output as JSON
        #[arg(long, conflicts_with = "yaml")]
        json: bool,

        /// Output as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Initialize a new bundle directory
    Init {
        /// Path to bundle directory
        #[arg(default_value = "bundle")]
        path: PathBuf,
    },
}

pub fn run(cmd: ConfigCmd) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Check { path, plain, json } => check(path, plain, json),
        ConfigCmd::Dump { path, json, yaml } => dump(path, json, yaml),
        ConfigCmd::Init { path } => init(path),
    }
}
