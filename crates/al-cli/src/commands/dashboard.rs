//! Dashboard command: today's question, stats and plans.

use std::io::Write;

use anyhow::{Context, Result};

use al_api::Client;
use al_core::{Credential, RenderSink};

use crate::terminal::TerminalSink;

pub async fn run<W: Write>(writer: &mut W, client: &Client, credential: &Credential) -> Result<()> {
    let dashboard = client
        .dashboard()
        .await
        .context("failed to load dashboard")?;
    let mut sink = TerminalSink::new(writer, credential.username.clone());
    sink.render_dashboard(&dashboard);
    Ok(())
}
