//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::loader::Priority;

/// pageflow - navigation mediator for partial-document page transitions
#[derive(Parser)]
#[command(
    name = "pf",
    about = "Simulate and inspect partial-document page navigation",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bootstrap a site and navigate through routes, printing the observed events
    Simulate {
        /// Site definition (YAML)
        site: PathBuf,

        /// Routes to visit, in order
        routes: Vec<String>,

        /// Root selector override
        #[arg(long)]
        root: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Look for a page node and a redirect marker in a document
    Inspect {
        /// HTML file
        file: PathBuf,

        /// Page key (selector of the page node)
        #[arg(short, long)]
        key: String,

        /// Root selector the redirect marker hangs off
        #[arg(short, long, default_value = "body")]
        root: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Fetch a route the way a navigation would
    Fetch {
        /// Route or absolute URL
        route: String,

        /// Base URL override
        #[arg(long = "base-url")]
        base_url: Option<String>,

        /// Fetch priority (now, normal)
        #[arg(short, long, default_value = "now")]
        priority: Priority,
    },
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}
