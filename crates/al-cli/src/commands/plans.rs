//! Plan list management.

use std::io::Write;

use anyhow::{Context, Result, bail};

use al_api::Client;
use al_core::{Credential, RenderSink};

use crate::terminal::TerminalSink;

pub async fn list<W: Write>(writer: &mut W, client: &Client, credential: &Credential) -> Result<()> {
    let dashboard = client.dashboard().await.context("failed to load plans")?;
    let mut sink = TerminalSink::new(writer, credential.username.clone());
    sink.render_plans(&dashboard.plans);
    Ok(())
}

/// Joins the words given on the command line into one plan text.
pub fn plan_text(words: &[String]) -> Result<String> {
    let text = words.join(" ").trim().to_string();
    if text.is_empty() {
        bail!("Plan text cannot be empty");
    }
    Ok(text)
}

pub async fn add<W: Write>(writer: &mut W, client: &Client, words: &[String]) -> Result<()> {
    let text = plan_text(words)?;
    client.add_plan(&text).await.context("failed to add plan")?;
    writeln!(writer, "Plan added: {text}")?;
    Ok(())
}

pub async fn done<W: Write>(writer: &mut W, client: &Client, id: i64) -> Result<()> {
    client
        .complete_plan(id)
        .await
        .with_context(|| format!("failed to complete plan #{id}"))?;
    writeln!(writer, "Plan #{id} done. Well done!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_text_joins_words() {
        let words = vec!["Write".to_string(), "report".to_string()];
        assert_eq!(plan_text(&words).unwrap(), "Write report");
    }

    #[test]
    fn plan_text_rejects_blank() {
        assert!(plan_text(&[]).is_err());
        assert!(plan_text(&["  ".to_string()]).is_err());
    }
}
