//! Command-line interface for vocab.

mod commands;

pub use commands::{is_verbose, run};
