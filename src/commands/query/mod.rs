mod execute;
mod output;

pub use execute::QueryResult;

use clap::Args;

/// Run a count query and print the reshaped table
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  bookworm -d federalist query -g languages                # Texts/words per language
  bookworm -d federalist query -g '*languages' -g date_year
  bookworm -d federalist query -g date_year -l '{\"word\": [\"liberty\"]}'
  bookworm -d federalist query -g languages --drop-zeros --drop-unknowns")]
pub struct QueryCmd {
    /// Field to group counts by (repeat for nested grouping; '*' prefix
    /// buckets by id space, '__id' suffix asks for ids)
    #[arg(short, long = "group")]
    pub groups: Vec<String>,

    /// Count type to request (repeat for several)
    #[arg(short, long = "counttype", default_values_t = [
        crate::query::TEXT_COUNT.to_string(),
        crate::query::WORD_COUNT.to_string(),
    ])]
    pub counttype: Vec<String>,

    /// Search limits as a JSON object, e.g. '{"word": ["liberty"], "date_year": {"$lt": 1800}}'
    #[arg(short = 'l', long)]
    pub limits: Option<String>,

    /// Keep group columns as ordinary columns instead of a row index
    #[arg(long, default_value_t = false)]
    pub no_index: bool,

    /// Drop rows where every count column is zero
    #[arg(long, default_value_t = false)]
    pub drop_zeros: bool,

    /// Drop rows with unknown/unspecified facet values
    #[arg(long, default_value_t = false)]
    pub drop_unknowns: bool,

    /// Skip the field-schema check (one fewer server call; bad field
    /// names then surface as server errors)
    #[arg(long, default_value_t = false)]
    pub skip_field_check: bool,
}
