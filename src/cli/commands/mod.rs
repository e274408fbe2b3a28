//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every product in the manifest
    Build {
        /// Root directory of the build (one subdirectory per product)
        #[arg(short, long, env = "BUILD_DIR", default_value = ".")]
        build_dir: PathBuf,

        /// Skip CI status notification even when a PR context is present
        #[arg(long)]
        no_notify: bool,
    },

    /// Show the status record of the last run
    Status {
        /// Root directory of the build
        #[arg(short, long, env = "BUILD_DIR", default_value = ".")]
        build_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Commands::Build {
                build_dir,
                no_notify,
            } => {
                let ok = build::execute(build::BuildOptions {
                    build_dir,
                    no_notify,
                })
                .await?;
                if !ok {
                    // the failure has already been reported on the progress line
                    std::process::exit(1);
                }
                Ok(())
            }
            Commands::Status { build_dir } => status::execute(&build_dir),
        }
    }
}
