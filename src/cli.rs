use clap::{Parser, Subcommand};

/// Scrybe - co-write stories with an AI partner.
#[derive(Parser, Debug)]
#[command(name = "scrybe")]
#[command(version = "0.1.0")]
#[command(about = "Collaborative story-writing with a remote AI.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a writing session
    Write {
        /// Name of your AI writing partner
        #[arg(long)]
        ai_name: Option<String>,

        /// Story genre (Mystery, Fantasy, Romance, ...)
        #[arg(long)]
        genre: Option<String>,
    },

    /// List your saved stories
    Library,

    /// Print a saved story, chapter by chapter
    Read {
        /// Story id from `scrybe library`
        story_id: i64,
    },

    /// Create the config file and print its location
    Init,
}
