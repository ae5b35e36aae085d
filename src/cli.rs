//! CLI argument definitions.
//!
//! This module contains the top-level CLI structure and shared options.
//! Individual command definitions are in the `commands` module.

use clap::Parser;

use crate::commands::Command;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Bookworm endpoint URL (falls back to .bookworm.json, then any
    /// installed default)
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// Database to query (same fallbacks as the endpoint)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Skip TLS certificate verification
    #[arg(long, global = true, default_value_t = false)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args_apply_after_subcommand() {
        let args = Args::try_parse_from([
            "bookworm",
            "fields",
            "-e",
            "https://bw.example.org",
            "-d",
            "federalist",
        ])
        .unwrap();
        assert_eq!(args.endpoint.as_deref(), Some("https://bw.example.org"));
        assert_eq!(args.database.as_deref(), Some("federalist"));
        assert_eq!(args.format, OutputFormat::Table);
        assert!(!args.insecure);
    }

    #[test]
    fn test_format_selection() {
        let args =
            Args::try_parse_from(["bookworm", "--format", "csv", "query", "-g", "languages"])
                .unwrap();
        assert_eq!(args.format, OutputFormat::Csv);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Args::try_parse_from(["bookworm"]).is_err());
    }
}
