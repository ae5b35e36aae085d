//! Command definitions and implementations.
//!
//! Each command lives in its own module with the clap struct in `mod.rs`,
//! the query logic in `execute.rs`, and the output formatting in
//! `output.rs`.

mod fields;
mod query;
mod values;

pub use fields::FieldsCmd;
pub use query::QueryCmd;
pub use values::ValuesCmd;

use std::error::Error;

use clap::Subcommand;

use crate::output::{OutputFormat, Outputable};

/// Connection settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    pub endpoint: Option<String>,
    pub database: Option<String>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
}

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, conn: &Connection) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a count query and print the reshaped table
    Query(QueryCmd),

    /// List the queryable fields of a database
    Fields(FieldsCmd),

    /// List the most frequent values of one field
    Values(ValuesCmd),
}

impl Command {
    /// Execute the command and return formatted output
    pub fn run(self, conn: &Connection, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Query(cmd) => {
                let result = cmd.execute(conn)?;
                Ok(result.format(format))
            }
            Command::Fields(cmd) => {
                let result = cmd.execute(conn)?;
                Ok(result.format(format))
            }
            Command::Values(cmd) => {
                let result = cmd.execute(conn)?;
                Ok(result.format(format))
            }
        }
    }
}
