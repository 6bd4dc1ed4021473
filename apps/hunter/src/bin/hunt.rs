//! One-shot pipeline run from the command line. Prints the result as JSON.

use anyhow::Result;
use clap::Parser;

use hunter::config::Config;
use hunter::logging::{init_tracing, LogTarget};
use hunter::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "hunt", about = "Scout, rank and tailor for a single role query")]
struct HuntCli {
    /// Role to search for, e.g. "Machine Learning Intern"
    query: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = HuntCli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.rust_log, LogTarget::Stderr);

    let query = cli.query.trim();
    anyhow::ensure!(!query.is_empty(), "Please enter a role.");

    let pipeline = Pipeline::from_config(&config)?;
    let result = pipeline.run(query).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
