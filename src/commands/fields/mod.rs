mod execute;
mod output;

pub use execute::FieldsResult;

use clap::Args;

/// List the queryable fields of a database
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  bookworm -d federalist fields
  bookworm -d federalist fields --format csv")]
pub struct FieldsCmd {}

#[cfg(test)]
mod cli_tests {
    use crate::cli::Args;
    use crate::commands::Command;
    use clap::Parser;

    #[test]
    fn test_parses_without_arguments() {
        let args = Args::try_parse_from(["bookworm", "fields"]).unwrap();
        assert!(matches!(args.command, Command::Fields(_)));
    }
}
