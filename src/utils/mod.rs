//! Generic utility primitives with zero domain knowledge.
//!
//! - `shell` - Shell quoting for displaying commands

pub mod shell;
