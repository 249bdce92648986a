//! Operator console for the avatar speech clip player.
//!
//! `avatar run` starts the engine against a clip directory and reads
//! console commands from stdin; `avatar devices` lists output devices;
//! `avatar sweep` removes stale clips.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used only by the binary entry point.
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod console;
pub mod error;
pub mod handlers;
pub mod parser;

pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
