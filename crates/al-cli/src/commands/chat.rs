//! Chat with the assistant.

use std::io::Write;

use anyhow::{Context, Result, bail};

use al_api::Client;
use al_core::{ChatContext, Credential, RenderSink};

use crate::terminal::TerminalSink;

pub async fn send<W: Write>(writer: &mut W, client: &Client, words: &[String]) -> Result<()> {
    let message = words.join(" ");
    let message = message.trim();
    if message.is_empty() {
        bail!("Message cannot be empty");
    }
    let reply = client
        .chat(message, ChatContext::Dashboard)
        .await
        .context("failed to send message")?;
    writeln!(writer, "assistant> {reply}")?;
    Ok(())
}

pub async fn history<W: Write>(
    writer: &mut W,
    client: &Client,
    credential: &Credential,
    limit: u32,
) -> Result<()> {
    let messages = client
        .chat_history(Some(limit))
        .await
        .context("failed to load chat history")?;
    let mut sink = TerminalSink::new(writer, credential.username.clone());
    sink.render_chat(&messages);
    Ok(())
}
