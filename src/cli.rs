use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the node graph of a document
    Nodes {
        /// HTML file, or `-` for stdin
        file: PathBuf,

        /// Only list interactive nodes together with their context
        #[clap(short, long, default_value = "false")]
        interactive: bool,

        /// Context depth used with --interactive
        #[clap(short, long)]
        depth: Option<usize>,
    },
    /// Print the context collected around one node
    Context {
        /// HTML file, or `-` for stdin
        file: PathBuf,

        /// Backend node id
        id: String,

        /// Hops walked up and down the node graph
        #[clap(short, long)]
        depth: Option<usize>,
    },
    /// Rank interactive nodes against a natural-language query
    Query {
        /// HTML file, or `-` for stdin
        file: PathBuf,

        /// What the user wants to do, e.g. "sign up for the newsletter"
        query: String,

        /// Maximum number of results
        #[clap(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity score [-1.0, 1.0]
        #[clap(short, long, allow_negative_numbers = true)]
        threshold: Option<f32>,

        /// Embedding model, `lexical` for the offline embedder
        #[clap(short, long)]
        model: Option<String>,
    },
}
