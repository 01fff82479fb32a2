//! CLI layer for casewise.
//!
//! Provides the command-line interface using clap, with commands for asking
//! questions, inspecting retrieval and chunking, and an interactive chat.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{execute, run_chat};
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
