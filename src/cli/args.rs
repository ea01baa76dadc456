//! CLI argument parsing

use crate::config::Direction;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Visualize message flow between handlers
#[derive(Parser, Debug)]
#[command(name = "msgflow")]
#[command(about = "Visualize asynchronous message flow between handlers")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the message flow diagram
    Render {
        /// Observation manifest (file or directory) to analyze; the graph is saved to the data file
        #[arg(long)]
        source: Option<PathBuf>,

        /// Persisted graph to load when no source is given
        #[arg(short, long)]
        data_file: Option<PathBuf>,

        /// Output file (.dot/.gv for raw DOT, anything else is laid out by Graphviz)
        #[arg(short, long)]
        output: PathBuf,

        /// Handler full name to start walking outbound edges from
        #[arg(short, long)]
        start: Option<String>,

        /// Keep only edges crossing module boundaries
        #[arg(long)]
        inter_module_only: bool,

        /// Also list handlers marked as entry points
        #[arg(long)]
        list_entry_points: bool,

        /// Layout direction
        #[arg(long, value_enum, ignore_case = true)]
        direction: Option<Direction>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List handlers marked as business process entry points
    EntryPoints {
        /// Observation manifest (file or directory) to analyze
        #[arg(long)]
        source: Option<PathBuf>,

        /// Persisted graph to load when no source is given
        #[arg(short, long)]
        data_file: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}
