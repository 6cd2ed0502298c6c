//! Binary crate for the `weather` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Serving the HTTP API over `weather-core`
//! - Translating lookup failures into HTTP responses

use clap::Parser;

mod cli;
mod error;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
