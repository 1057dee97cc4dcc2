// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and the render, check and tree subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "layercake")]
#[command(about = "Compose text from named template layers")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

/// Placeholder tag overrides shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TagArgs {
    #[arg(long, help = "Placeholder opening tag")]
    pub open: Option<String>,

    #[arg(long, help = "Placeholder closing tag")]
    pub close: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the entry point layer of a data file
    Render {
        #[arg(help = "Path to YAML or JSON data file")]
        data: PathBuf,

        #[arg(
            short,
            long,
            conflicts_with = "inline",
            help = "Template file installed as the entry point"
        )]
        template: Option<PathBuf>,

        #[arg(short, long, help = "Inline template installed as the entry point")]
        inline: Option<String>,

        #[arg(short, long, help = "Entry point layer name")]
        entry: Option<String>,

        #[command(flatten)]
        tags: TagArgs,

        #[arg(long, help = "Memoize rendered layers")]
        fast: bool,

        #[arg(short, long, help = "Text substituted for missing layers")]
        missing: Option<String>,

        #[arg(short, long, help = "Write the result to a file")]
        output: Option<PathBuf>,
    },

    /// Report syntax errors in every template layer of a data file
    Check {
        #[arg(help = "Path to YAML or JSON data file")]
        data: PathBuf,

        #[command(flatten)]
        tags: TagArgs,
    },

    /// Print the control tree of one layer
    Tree {
        #[arg(help = "Path to YAML or JSON data file")]
        data: PathBuf,

        #[arg(help = "Layer name")]
        layer: String,

        #[command(flatten)]
        tags: TagArgs,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
