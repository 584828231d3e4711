//! Terminal output: JSON results on stdout, status and errors on stderr.

use anyhow::{Context, Result};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

pub fn status(message: &str) {
    eprintln!("{message}");
}

/// Print the error with its full cause chain.
pub fn error(err: &anyhow::Error) {
    eprintln!("Error: {err}");
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
