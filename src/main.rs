// Attache - tool-call dispatch runtime
// Main entry point
//
// The conversation engine lives upstream; this binary is the mechanical
// side of the loop. It advertises the tool catalog and dispatches batches
// of tool-call requests handed to it as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use attache::config::load_config;
use attache::tools::{definitions, ToolCallRequest};
use attache::build_dispatcher;

#[derive(Parser, Debug)]
#[command(name = "attache")]
#[command(about = "Tool-call dispatch runtime for a mail/calendar/file assistant", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Print the advertised tool catalog as JSON
    Catalog,
    /// Dispatch a JSON array of tool-call requests and print the results
    Dispatch {
        /// Read requests from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Catalog => {
            println!("{}", serde_json::to_string_pretty(&definitions())?);
        }
        Command::Dispatch { file } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read requests from stdin")?;
                    buffer
                }
            };

            let requests: Vec<ToolCallRequest> =
                serde_json::from_str(&input).context("Requests must be a JSON array")?;

            let config = load_config()?;
            let dispatcher = build_dispatcher(&config)?;

            let results = dispatcher.dispatch(&requests).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
