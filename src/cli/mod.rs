//! CLI module
//!
//! Handles command-line argument parsing for the server binary.

pub mod args;

pub use args::{Args, Commands};
