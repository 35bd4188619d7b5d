//! CLI argument parsing for promptstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ps")]
#[command(author, version, about = "Schema-aware prompt template registry", long_about = None)]
pub struct Cli {
    /// Path to settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set the prompt registry directory
    Set {
        /// Directory holding templates and configs
        #[arg(short, long)]
        directory: PathBuf,
    },

    /// Generate a prompt from a template and config
    Generate {
        /// Template path, relative to the registry directory
        #[arg(short, long)]
        template: String,

        /// Config path, relative to the registry directory
        #[arg(short, long)]
        config: String,

        /// Where to write the generated prompt
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate or update a config file based on a template's schema
    GenCfg {
        /// Template path, relative to the registry directory
        #[arg(short, long)]
        template: String,

        /// Config path to create or update, relative to the registry directory
        #[arg(short, long)]
        config: String,
    },

    /// Create a new empty template file
    NewTemplate {
        /// Path for the new .tmpl file, relative to the registry directory
        #[arg(short, long)]
        path: String,
    },

    /// Create a new empty config file
    NewConfig {
        /// Path for the new config file, relative to the registry directory
        #[arg(short, long)]
        path: String,
    },
}
