//! postboard-cli: command-line client for the posts API.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;
mod session;
mod view;

#[cfg(test)]
mod tests;

use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{browse, posts};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::Posts(cmd) => posts::handle(&ctx, cmd.action).await?,
        Commands::Browse => browse::run(ctx).await?,
    }

    Ok(())
}
