use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pstream-util")]
#[command(about = "PSTREAM update container utility", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a PSTREAM container to a directory
    Extract {
        /// Path to the PSTREAM container
        #[arg(value_name = "PSF_FILE")]
        psf_path: PathBuf,

        /// Destination directory (must be absent or empty)
        #[arg(value_name = "DIR")]
        output: PathBuf,

        /// External tool used to decode PA30 delta streams in place
        #[arg(short, long, value_name = "TOOL")]
        delta_tool: Option<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Display information about a PSTREAM container
    Info {
        /// Path to the PSTREAM container
        #[arg(value_name = "PSF_FILE")]
        psf_path: PathBuf,
    },

    /// List the files packaged in a PSTREAM container
    List {
        /// Path to the PSTREAM container
        #[arg(value_name = "PSF_FILE")]
        psf_path: PathBuf,

        /// External tool used to decode the PA30-packed manifest
        #[arg(short, long, value_name = "TOOL")]
        delta_tool: Option<PathBuf>,
    },
}
