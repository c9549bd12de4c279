//! BlenderVault CLI - Command-line interface
//!
//! This binary provides a command-line interface to the BlenderVault
//! engine: registry management, release discovery, chunked downloads, and
//! supervised launching.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

#[derive(Debug, Parser)]
#[command(
    name = "blendervault",
    version,
    about = "Manage, download, and launch multiple Blender versions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered installations
    List,

    /// Register an installation under a name
    Add {
        /// Name for the installation
        name: String,
        /// Path to the Blender executable
        executable: PathBuf,
    },

    /// Rename an installation and replace its executable
    Rename {
        /// Current name
        name: String,
        /// New name
        new_name: String,
        /// Path to the (possibly new) Blender executable
        executable: PathBuf,
    },

    /// Remove an installation from the registry
    Remove {
        /// Name of the installation to remove
        name: String,
    },

    /// Scan a folder and register discovered installations
    Scan {
        /// Folder to scan; defaults to the configured versions folder
        folder: Option<PathBuf>,
    },

    /// List releases available on the mirror
    Releases {
        /// Major version folder to list archives of (e.g. Blender4.0)
        major: Option<String>,
    },

    /// Download, install, and register a release
    Install {
        /// Major version folder (e.g. Blender4.0)
        major: String,
        /// Archive name within the folder (e.g. blender-4.0.1-linux-x64.zip)
        minor: String,
    },

    /// Launch a registered installation
    Launch {
        /// Name of the installation to launch
        name: String,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List => commands::versions::run_list(),
        Commands::Add { name, executable } => commands::versions::run_add(&name, &executable),
        Commands::Rename {
            name,
            new_name,
            executable,
        } => commands::versions::run_rename(&name, &new_name, &executable),
        Commands::Remove { name } => commands::versions::run_remove(&name),
        Commands::Scan { folder } => commands::versions::run_scan(folder),
        Commands::Releases { major } => commands::releases::run(major),
        Commands::Install { major, minor } => commands::install::run(&major, &minor),
        Commands::Launch { name } => commands::launch::run(&name),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_declaration_is_consistent() {
        Cli::command().debug_assert();
    }
}
