//! Command handlers.
//!
//! Each handler is a thin wrapper: build what it needs from the global
//! options, call into `avatar_player`, and format the result for the
//! terminal.

pub mod devices;
pub mod run;
pub mod sweep;
