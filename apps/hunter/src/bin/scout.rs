//! Scouting child process. Prints exactly one line of JSON (the listings) on
//! stdout; everything else goes to stderr.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use hunter::fetch::{scout_listings, BrowserTaskClient, FetchConfig};
use hunter::logging::{init_tracing, LogTarget};
use hunter::pipeline::scout::normalize_query;

#[derive(Parser, Debug)]
#[command(name = "scout", about = "Collect job listings for a role query as one line of JSON")]
struct ScoutCli {
    /// Role to search for
    #[arg(default_value = "Machine Learning Intern")]
    query: String,

    /// Maximum number of listings to collect
    #[arg(long, env = "SCOUT_MAX_RESULTS", default_value_t = 3)]
    max_results: usize,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ScoutCli::parse();
    init_tracing(&cli.log_level, LogTarget::Stderr);

    let config = FetchConfig::from_env()?;
    let client = BrowserTaskClient::new(config)?;

    let keyword = normalize_query(&cli.query);
    info!("Scouting \"{keyword}\" for up to {} listings", cli.max_results);

    let listings = scout_listings(&client, &keyword, cli.max_results.max(1)).await?;
    println!("{}", serde_json::to_string(&listings)?);

    Ok(())
}
