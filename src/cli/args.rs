//! Command-line argument parsing
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rag-mcp - RAG knowledge base served to LLM agents over MCP
#[derive(Parser, Debug)]
#[command(name = "rag-mcp")]
#[command(version)]
#[command(about = "RAG knowledge base over MCP (stdio)", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (info), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand; defaults to serving over stdio
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server over stdio (default)
    Serve,

    /// Load every text file from the data directory into the knowledge base
    Load,

    /// Print knowledge-base statistics
    Stats,

    /// Display the active configuration
    Config,
}

impl Args {
    /// Default log level derived from the verbosity flags
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let args = Args::parse_from(["rag-mcp"]);
        assert!(args.command.is_none());
        assert_eq!(args.log_level(), "info");
    }

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["rag-mcp", "-v"]);
        assert_eq!(args.log_level(), "debug");
        let args = Args::parse_from(["rag-mcp", "-vv"]);
        assert_eq!(args.log_level(), "trace");
    }

    #[test]
    fn test_subcommand_parsing() {
        let args = Args::parse_from(["rag-mcp", "load"]);
        assert!(matches!(args.command, Some(Commands::Load)));

        let args = Args::parse_from(["rag-mcp", "--config", "/tmp/c.toml", "stats"]);
        assert!(matches!(args.command, Some(Commands::Stats)));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
