//! Serve command: run the MCP server on stdio.

use anyhow::Context;
use clap::Args;
use rmcp::ServiceExt;
use tracing::{info, instrument};

use abbr_wrap_core::Config;

use crate::server::ProjectServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    // Transport is always stdio; no options yet
}

/// Serve the annotator over MCP until the client disconnects.
///
/// Stdout carries the protocol, so all diagnostics go through `tracing`
/// (stderr and the log file).
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(
    _args: ServeArgs,
    max_input: Option<usize>,
    config: Config,
) -> anyhow::Result<()> {
    let server = ProjectServer::with_config(&config, max_input);
    info!(
        abbreviations = config.abbreviations.len(),
        max_input = ?max_input,
        "starting MCP server on stdio"
    );

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP server")?;
    let reason = service
        .waiting()
        .await
        .context("MCP server terminated abnormally")?;

    info!(reason = ?reason, "MCP server stopped");
    Ok(())
}
