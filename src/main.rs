//! `outbound-rs` command line.
//!
//! - `outbound-rs check -c proxies.yaml` builds every proxy and lists them
//! - `outbound-rs dial -c proxies.yaml -p edge -t example.com:80` relays
//!   stdin/stdout through one proxy

use std::process::ExitCode;

use clap::Parser;
use outbound_adapter::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    match cli::run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
