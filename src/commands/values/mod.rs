mod execute;
mod output;

pub use execute::ValuesResult;

use clap::Args;

/// List the most frequent values of one field
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  bookworm -d federalist values -f languages
  bookworm -d federalist values -f languages --max 100   # Only ids <= 100")]
pub struct ValuesCmd {
    /// Field to list values for
    #[arg(short, long)]
    pub field: String,

    /// Only consider values with ids at or below this cutoff (buckets by
    /// id space)
    #[arg(long)]
    pub max: Option<u64>,
}
