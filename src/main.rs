use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use plume::commands::config::{self, ConfigArgs};
use plume::commands::serve::{self, ServeArgs};
use plume::commands::stats::{self, StatsArgs};
use plume::commands::suggest::{self, SuggestArgs};
use plume::logging::{LogLevel, init_logging};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PLUME_GIT_SHA"),
    ", built ",
    env!("PLUME_BUILD_TS"),
    ")"
);

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  plume suggest --provider openai --author \"Ada\" --handle ada \"Tabs or spaces?\"\n  echo \"Tabs or spaces?\" | plume suggest --profile work --json\n  plume serve < requests.jsonl\n  plume config check --profile work\n  plume completion bash > ~/.local/share/bash-completion/completions/plume";

const SUGGEST_HELP_EXAMPLES: &str = "Examples:\n  plume suggest --provider groq --tone 80 --length concise --hashtags \"Rust 2024 is out\"\n  plume suggest --style witty --expertise Databases --expertise Rust --dry-run \"Postgres 17 released\"";

#[derive(Debug, Parser)]
#[command(
    name = "plume",
    about = "AI reply suggestions for social media posts",
    version,
    long_version = LONG_VERSION,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    /// Log level when neither PLUME_LOG nor RUST_LOG is set.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Generate reply suggestions for a tweet", after_help = SUGGEST_HELP_EXAMPLES)]
    Suggest(SuggestArgs),
    #[command(about = "Serve suggestion requests as JSON lines on stdin/stdout")]
    Serve(ServeArgs),
    #[command(about = "Show today's usage stats")]
    Stats(StatsArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "plume", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "plume", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "plume", &mut io::stdout()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let result = match cli.command {
        Commands::Suggest(args) => suggest::run(args).await,
        Commands::Serve(args) => serve::run(args).await,
        Commands::Stats(args) => stats::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
