use std::process;

use clap::Parser;
use plume::commands::suggest::{self, SuggestArgs};
use plume::logging::{LogLevel, init_logging};

#[derive(Debug, Parser)]
#[command(
    name = "plume-suggest",
    about = "Generate reply suggestions for a tweet",
    disable_version_flag = true
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[command(flatten)]
    suggest: SuggestArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    if let Err(err) = suggest::run(cli.suggest).await {
        eprintln!("{err}");
        process::exit(1);
    }
}
