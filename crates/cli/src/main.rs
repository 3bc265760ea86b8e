//! REST bridge CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse arguments** — [`args::Cli`] describes one message: either a
//!    direct HTTP call (`--method`, `--path`, …) or a proxy-mode operation
//!    (`--operation`, `--arg`, …).
//! 2. **Wire observability** — configure `tracing-subscriber` with a JSON layer
//!    writing to stderr. Verbosity follows `RUST_LOG` and defaults to `info`.
//! 3. **Construct infrastructure** — load the endpoint configuration, create
//!    the [`http_transport::ReqwestClientFactory`] and inject it into an
//!    [`invoker::InvocationEngine`].
//! 4. **Invoke once** — process the exchange and print the outbound message
//!    as JSON on stdout. A remote failure is printed as JSON on stderr and the
//!    process exits non-zero.

mod args;
mod output;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use bridge::{BridgeError, EndpointConfig};
use clap::Parser;
use http_transport::ReqwestClientFactory;
use invoker::InvocationEngine;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let endpoint = load_endpoint(&cli.config)?;
    let exchange_uri = endpoint.endpoint_uri.clone();
    let factory = Arc::new(ReqwestClientFactory::new(&endpoint));
    let engine = InvocationEngine::new(endpoint, factory);
    engine.start();

    let mut exchange = cli.exchange(exchange_uri)?;
    info!(exchange = %exchange.id(), uri = %exchange.from_endpoint(), "Invoking endpoint");
    let outcome = engine.process(&mut exchange).await;
    engine.stop();

    match outcome {
        Ok(()) => {
            let rendered = output::render_exchange(&exchange);
            println!("{}", serde_json::to_string_pretty(&rendered)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(BridgeError::RemoteInvocation(remote)) => {
            error!(status = remote.status, "Remote invocation failed");
            let rendered = output::render_remote_error(&remote);
            eprintln!("{}", serde_json::to_string_pretty(&rendered)?);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("invocation failed"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_endpoint(path: &Path) -> anyhow::Result<EndpointConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read endpoint configuration {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid endpoint configuration {}", path.display()))
}
