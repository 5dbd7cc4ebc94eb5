//! Command-line interface components.

pub mod commands;

use crate::config::ExtractionConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "health_export")]
#[command(about = "Extract time series and profile data from Apple Health XML exports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Skip records with malformed timestamps instead of failing the category
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Only accept record timestamps with this UTC offset (e.g. -0600)
    #[arg(long, global = true, value_name = "OFFSET", allow_hyphen_values = true)]
    pub expect_offset: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write one CSV per category
    Export {
        /// Path to the export XML file
        #[arg(value_name = "EXPORT_XML")]
        input: PathBuf,

        /// Output directory for CSV files (default: ./download)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the profile card
    Profile {
        /// Path to the export XML file
        #[arg(value_name = "EXPORT_XML")]
        input: PathBuf,
    },

    /// Summarise every category over a date range
    Summary {
        /// Path to the export XML file
        #[arg(value_name = "EXPORT_XML")]
        input: PathBuf,

        /// Range start date (YYYY-MM-DD or MM/DD/YY HH:MM)
        #[arg(long)]
        start: String,

        /// Range end date (YYYY-MM-DD or MM/DD/YY HH:MM)
        #[arg(long)]
        end: String,

        /// Optional start time of day (HH:MM)
        #[arg(long)]
        start_time: Option<String>,

        /// Optional end time of day (HH:MM)
        #[arg(long)]
        end_time: Option<String>,
    },
}

impl Command {
    pub fn input(&self) -> &Path {
        match self {
            Command::Export { input, .. }
            | Command::Profile { input }
            | Command::Summary { input, .. } => input,
        }
    }
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Build the extraction configuration from defaults and flags
    pub fn to_config(&self) -> ExtractionConfig {
        let mut config = ExtractionConfig::default();

        if self.lenient {
            config = config.with_lenient_records();
        }
        if let Some(offset) = &self.expect_offset {
            config = config.with_required_offset(offset.clone());
        }
        if let Some(Command::Export {
            output: Some(output),
            ..
        }) = &self.command
        {
            config = config.with_output_dir(output.clone());
        }

        config
    }
}
