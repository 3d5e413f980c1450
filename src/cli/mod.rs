mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use commands::run;

#[derive(Parser)]
#[command(name = "uast-query")]
#[command(about = "Parse source files into UAST trees and query them")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Semantic tree of a file
    uast-query parse src/main.rs

    # Function names across a directory
    uast-query extract ./src --xpath '//function_item/identifier' --key token

    # Import paths of every Go file, with cache statistics
    uast-query --stats imports ./cmd

    # Detected language per file
    uast-query language ./
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Capacity of the parsed tree cache (defaults to UAST_CACHE_SIZE)
    #[arg(long, global = true)]
    pub cache_size: Option<usize>,

    /// Largest file sent to the parser in bytes, negative disables the limit
    /// (defaults to UAST_MAX_BLOB_SIZE)
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub max_blob_size: Option<i64>,

    /// Print resolver statistics to stderr when done
    #[arg(long, global = true)]
    pub stats: bool,
}

#[derive(Args, Clone)]
pub struct TreeArgs {
    /// Files or directories to process
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Language of every input, detected from the file name when omitted
    #[arg(long)]
    pub language: Option<String>,

    /// Path query applied to each tree
    #[arg(long)]
    pub xpath: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the tree of each file
    Parse {
        #[command(flatten)]
        tree: TreeArgs,

        /// Tree shape: semantic, annotated or native
        #[arg(long, default_value = "semantic")]
        mode: String,
    },

    /// Extract a property from every selected node
    Extract {
        #[command(flatten)]
        tree: TreeArgs,

        /// Property to extract (type, token, roles, position or any key)
        #[arg(long)]
        key: String,
    },

    /// Print the child nodes of every selected node
    Children {
        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Print import paths of every selected node
    Imports {
        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Print the detected language of each file
    Language {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}
