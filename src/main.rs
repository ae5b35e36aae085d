use std::error::Error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookworm::cli::Args;
use bookworm::commands::Connection;
use bookworm::config::ConfigFile;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let conn = resolve_connection(&args)?;
    let output = args.command.run(&conn, args.format)?;
    println!("{}", output);
    Ok(())
}

/// Flags win over `.bookworm.json`; anything still unset falls through to
/// the library's installed defaults.
fn resolve_connection(args: &Args) -> Result<Connection, Box<dyn Error>> {
    let file = ConfigFile::load()?;
    Ok(Connection {
        endpoint: args
            .endpoint
            .clone()
            .or_else(|| file.as_ref().and_then(|f| f.endpoint.clone())),
        database: args
            .database
            .clone()
            .or_else(|| file.as_ref().and_then(|f| f.database.clone())),
        insecure: args.insecure,
    })
}
