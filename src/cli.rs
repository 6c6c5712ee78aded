use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "namesake")]
#[command(about = "Person directory with demographic enrichment", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create a new empty person database.
    Init { db: PathBuf },

    /// Run the HTTP service.
    Serve {
        db: PathBuf,
        /// Bind address (overrides NAMESAKE_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides NAMESAKE_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Probe the three classifiers for a name without persisting anything.
    Enrich {
        name: String,
        /// Output the raw profile as JSON
        #[arg(long)]
        json: bool,
    },
}
