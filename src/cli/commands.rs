use clap::{Parser, Subcommand};

/// `infinite-adventure` - an endless, illustrated text adventure.
#[derive(Parser, Debug)]
#[command(name = "infinite-adventure")]
#[command(version)]
#[command(about = "An endless text adventure narrated and illustrated on demand.", long_about = None)]
pub struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Play in the terminal
    Play,

    /// Show session and cache statistics
    Stats,
}
