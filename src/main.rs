//! # VRT Mosaic CLI
//!
//! This is the binary entry point for the `vrt-mosaic` command-line tool.
//!
//! Its responsibilities are parsing arguments with `clap`, setting up
//! logging, and dispatching to the command implementations. All mosaic logic
//! lives in the `vrt_mosaic` library crate; the binary is a thin wrapper.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
