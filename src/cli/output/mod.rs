//! Output formatting utilities for the CLI.

pub mod table;

use serde::Serialize;

pub use table::TableFormatter;

/// A command result printable as text or JSON
pub trait CommandOutput: Serialize {
    /// Human-readable rendering
    fn to_human(&self) -> String;
    /// JSON rendering
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` in the requested format
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}
