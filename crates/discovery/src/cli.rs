use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "discovery")]
#[command(version)]
#[command(about = "Search, suggestions and recommendations over community posts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Accepted only by commands that read engine settings
#[derive(Args, Debug, Default)]
pub struct ConfigArg {
    /// JSON config file (defaults to config.json in the data directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, database and default config
    Init {
        #[command(flatten)]
        config: ConfigArg,
    },

    /// Import users, posts, tags, follows and engagements from a JSON dataset
    Seed {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Rank posts for a query (blank query lists recent posts)
    Search {
        #[arg(default_value = "")]
        query: String,

        /// Maximum results (0 or omitted: all candidates)
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        config: ConfigArg,
    },

    /// Typeahead suggestions (blank keyword lists hot searches)
    Suggest {
        #[arg(default_value = "")]
        keyword: String,

        #[arg(short, long, default_value_t = 0)]
        limit: usize,

        #[command(flatten)]
        config: ConfigArg,
    },

    /// Topics a user engaged with recently
    Topics {
        #[arg(short, long)]
        user: i64,

        #[arg(short = 'k', long, default_value_t = 0)]
        top_k: usize,

        #[command(flatten)]
        config: ConfigArg,
    },

    /// Most engaged topics today
    Hot {
        #[arg(short = 'k', long, default_value_t = 0)]
        top_k: usize,

        #[command(flatten)]
        config: ConfigArg,
    },

    /// Users with similar interests
    Users {
        #[arg(short, long)]
        user: i64,

        #[arg(short = 'n', long, default_value_t = 0)]
        top_n: usize,

        #[command(flatten)]
        config: ConfigArg,
    },

    /// Show database row counts
    Stats,

    /// Print version information
    Version,
}
