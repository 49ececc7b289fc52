use clap::Args;

use crate::config;
use crate::stats::{self, FileStore};

#[derive(Debug, Args, Clone)]
pub struct StatsArgs {
    /// Print the stats as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: StatsArgs) -> Result<(), String> {
    let store = FileStore::new(config::state_path().map_err(|err| err.to_string())?);
    let current = stats::current_stats(&store, &stats::today())
        .await
        .map_err(|err| err.to_string())?;

    if args.json {
        println!("{}", serde_json::to_string(&current).map_err(|err| err.to_string())?);
    } else {
        println!("replies generated: {}", current.replies_generated);
        println!("tweets analyzed:   {}", current.tweets_analyzed);
        println!("since:             {}", current.last_reset);
    }
    Ok(())
}
