//! End-of-day review and exit-reason analysis.

use std::io::Write;

use anyhow::{Context, Result};

use al_api::{Client, ExitVerdict};

pub async fn run<W: Write>(writer: &mut W, client: &Client) -> Result<()> {
    let analysis = client.review().await.context("failed to load review")?;
    writeln!(writer, "{analysis}")?;
    Ok(())
}

pub async fn analyze_exit<W: Write>(writer: &mut W, client: &Client, reason: &str) -> Result<()> {
    let analysis = client
        .analyze_exit(reason)
        .await
        .context("failed to analyze exit reason")?;
    let verdict = match analysis.verdict {
        ExitVerdict::Distracted => "distraction",
        ExitVerdict::Valid => "valid reason",
        ExitVerdict::Unknown => "unclear",
    };
    writeln!(writer, "Verdict: {verdict}")?;
    writeln!(writer, "{}", analysis.response)?;
    Ok(())
}
