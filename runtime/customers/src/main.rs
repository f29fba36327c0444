use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use courier_customers::adapter::{new_outbound, register_inbound};
use courier_customers::config::Cli;
use courier_customers::CustomerService;
use courier_fabric::Adapter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();
    let adapter = Adapter::new(config).context("invalid configuration")?;

    let outbound = Arc::new(new_outbound(&adapter));
    let inbound = Arc::new(CustomerService::new(outbound));
    register_inbound(&adapter, inbound).context("failed to register inbound operations")?;

    adapter.start().await.context("listener failed")?;
    Ok(())
}
