use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sqlchat", version, about = "Ask questions about your data in plain language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Ask a single question and print the reply
    Ask {
        /// The question, in plain language
        question: String,

        /// Session to attach the exchange to
        #[arg(short, long, default_value = "cli")]
        session: String,
    },

    /// Print the schema the model is shown
    Tables,

    /// Print example questions for the current database
    Suggest,

    /// Print the stored history of a session
    History {
        session: String,
    },

    /// Delete the stored history of a session
    Clear {
        session: String,
    },
}
