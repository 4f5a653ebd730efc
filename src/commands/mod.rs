//! Command handlers behind the `meal_cart` binary.
//!
//! Results go to stdout (JSON where a script might consume them); progress
//! and warnings go through `tracing` to stderr.

pub mod config;
pub mod kroger;
pub mod plan;
pub mod recipes;
pub mod shopping;

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::cli::{Cli, Command};
use crate::kroger::{KrogerAuth, KrogerClient};
use crate::settings::Settings;

pub async fn run(cli: Cli, settings: &Settings) -> Result<()> {
    match cli.command {
        Command::Config(cmd) => config::run(cmd, settings),
        Command::Recipes(cmd) => recipes::run(cmd, settings),
        Command::Plan(args) => plan::run(args, settings).await,
        Command::Kroger(cmd) => kroger::run(cmd, settings).await,
        Command::Groceries(args) => shopping::groceries(args, settings).await,
        Command::Cart(args) => shopping::cart(args, settings).await,
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn kroger_client(settings: &Settings) -> Result<KrogerClient> {
    let auth = KrogerAuth::new(settings.kroger.clone(), settings.token_file())?;
    Ok(KrogerClient::new(auth)?)
}

/// Writes pretty JSON, creating the parent directory as needed.
pub(crate) async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write '{}'", path.display()))
}

/// Prints `question` and reads one trimmed line.
pub(crate) fn prompt_line<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    question: &str,
) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
