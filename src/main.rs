use anyhow::Result;
use clap::Parser;
use dbg_forge::cli::Cli;

fn main() -> Result<()> {
    Cli::parse().execute()
}
