use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use stocktalk_core::{
    db,
    events::TracingSink,
    loader::StagingLoader,
    pipeline,
    types::{HarvestRequest, IfExists, SortMethod, TimeRange},
};
use stocktalk_reddit::RedditSearchClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ticker-discussion staging harvester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the content platform for a ticker and stage the posts
    Harvest(HarvestArgs),
}

#[derive(Args, Debug)]
struct HarvestArgs {
    /// Ticker symbol used as the search keyword
    #[arg(long)]
    ticker: String,
    /// Maximum number of posts to fetch
    #[arg(long)]
    limit: u32,
    /// relevance, hot, top, new or comments (default: new)
    #[arg(long)]
    sort_method: Option<String>,
    /// all, day, hour, month, week or year (default: all)
    #[arg(long)]
    time_range: Option<String>,
    /// fail, replace or append when the staging table already exists
    #[arg(long, default_value = "replace")]
    if_exists: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Harvest(args) => harvest(args).await,
    }
}

async fn harvest(args: HarvestArgs) -> Result<()> {
    dotenvy::dotenv().ok();

    let request = HarvestRequest {
        ticker: Some(args.ticker),
        limit: Some(args.limit),
        sort_method: args
            .sort_method
            .as_deref()
            .map(SortMethod::from_str)
            .transpose()?,
        time_range: args
            .time_range
            .as_deref()
            .map(TimeRange::from_str)
            .transpose()?,
    };
    let if_exists = IfExists::from_str(&args.if_exists)?;

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("STOCKTALK_DATABASE_URL"))
        .context("DATABASE_URL (or STOCKTALK_DATABASE_URL) must be set")?;
    let access_token =
        std::env::var("REDDIT_ACCESS_TOKEN").context("REDDIT_ACCESS_TOKEN must be set")?;
    let user_agent = std::env::var("REDDIT_USER_AGENT")
        .unwrap_or_else(|_| format!("stocktalk/{}", env!("CARGO_PKG_VERSION")));

    let pool = db::connect(&database_url).await?;
    let search = RedditSearchClient::new(&access_token, &user_agent)?;
    let loader = StagingLoader::new(pool, if_exists);

    let summary = pipeline::run_harvest(&request, &search, &loader, &TracingSink).await?;

    info!(
        ticker = %summary.ticker,
        rows_fetched = summary.rows_fetched,
        stickied_dropped = summary.stickied_dropped,
        rows_loaded = summary.rows_loaded,
        "harvest complete"
    );

    Ok(())
}
