mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { config } => commands::init::run(config.config.as_deref()),
        Commands::Seed { file } => commands::seed::run(&file),
        Commands::Search {
            query,
            limit,
            config,
        } => commands::search::run(config.config.as_deref(), &query, limit).await,
        Commands::Suggest {
            keyword,
            limit,
            config,
        } => commands::suggest::run(config.config.as_deref(), &keyword, limit).await,
        Commands::Topics {
            user,
            top_k,
            config,
        } => commands::topics::run(config.config.as_deref(), user, top_k).await,
        Commands::Hot { top_k, config } => {
            commands::topics::run_hot(config.config.as_deref(), top_k).await
        }
        Commands::Users {
            user,
            top_n,
            config,
        } => commands::users::run(config.config.as_deref(), user, top_n).await,
        Commands::Stats => commands::stats::run(),
        Commands::Version => commands::version::run(),
    }
}
