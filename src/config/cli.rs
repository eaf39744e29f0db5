use crate::domain::model::RecordType;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "lims-admin")]
#[command(about = "LIMS admin tool: barcode label printing and record lists")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "lims.toml", global = true)]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output", global = true)]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate the configuration and print a summary
    Check,

    /// Show the admin configuration of a record type
    Describe {
        #[arg(long)]
        model: RecordType,
    },

    /// List the barcode actions available for a record type
    Actions {
        #[arg(long)]
        model: RecordType,
    },

    /// Run a barcode action on selected records
    Print {
        #[arg(long)]
        model: RecordType,

        #[arg(long)]
        action: String,

        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<u64>,
    },

    /// Show the filtered, paginated record list of a record type
    Changelist {
        #[arg(long)]
        model: RecordType,

        /// Filter as key=value, e.g. is_empty=True
        #[arg(long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,

        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: usize,

        /// Show the editable columns
        #[arg(long)]
        edit: bool,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}
