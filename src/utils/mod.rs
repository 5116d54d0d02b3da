//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - Command execution with error handling
//! - `template` - String template rendering

pub mod command;
pub mod template;
