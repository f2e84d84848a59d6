//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    author = "neur0map",
    about = "Ask questions about a document and get answers grounded in its text",
    long_about = "docqa splits a document into overlapping chunks, embeds them locally, and answers \
                  questions by retrieving the most similar chunks and passing only those to a \
                  text-generation model. Answers cite the chunks they came from."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/docqa/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply (e.g. "offline")
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk, embed and index a plain-text document
    Index {
        /// Document to index (UTF-8 text)
        file: PathBuf,

        /// Index database to write (defaults to <data_dir>/<file stem>.db)
        #[arg(short, long, value_name = "DB")]
        output: Option<PathBuf>,

        /// Chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared by consecutive chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Document identifier (defaults to a random UUID)
        #[arg(long)]
        id: Option<String>,
    },

    /// Ask a question about an indexed document
    Ask {
        /// Question to ask
        question: String,

        /// Index database written by `docqa index`
        #[arg(short, long, value_name = "DB")]
        index: PathBuf,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Character budget for retrieved context
        #[arg(long)]
        max_context_chars: Option<usize>,

        /// Skip generation and show the retrieved chunks only
        #[arg(long)]
        offline: bool,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Index a document, then answer questions from stdin until EOF or "exit"
    Chat {
        /// Document to load (UTF-8 text)
        file: PathBuf,

        /// Number of chunks to retrieve per question
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Skip generation and show the retrieved chunks only
        #[arg(long)]
        offline: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section (e.g. "retrieval")
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "docqa",
            "ask",
            "What does Alice use?",
            "--index",
            "resume.db",
            "-k",
            "5",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask {
                question,
                index,
                top_k,
                json,
                offline,
                ..
            } => {
                assert_eq!(question, "What does Alice use?");
                assert_eq!(index, PathBuf::from("resume.db"));
                assert_eq!(top_k, Some(5));
                assert!(json);
                assert!(!offline);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["docqa", "index", "cv.txt", "--verbose", "-p", "offline"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.profile.as_deref(), Some("offline"));
    }
}
