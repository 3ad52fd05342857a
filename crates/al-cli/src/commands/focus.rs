//! Interactive focus session.

use std::io;

use anyhow::{Context, Result};
use crossterm::tty::IsTty;

use al_api::Client;
use al_core::{Credential, PlannedMinutes};

use crate::Config;
use crate::focus_loop::{self, FocusLoop};
use crate::terminal::{AlternateScreen, TerminalSink};

/// Picks the session length: the flag if given, else the configured default.
pub fn planned_minutes(config: &Config, minutes: Option<PlannedMinutes>) -> Result<PlannedMinutes> {
    match minutes {
        Some(minutes) => Ok(minutes),
        None => config
            .default_duration()
            .context("invalid default_minutes in configuration"),
    }
}

pub async fn run(
    config: &Config,
    client: Client,
    credential: &Credential,
    minutes: Option<PlannedMinutes>,
) -> Result<()> {
    let planned = planned_minutes(config, minutes)?;

    let stdout = io::stdout();
    let inline = stdout.is_tty();
    let sink = TerminalSink::new(stdout, credential.username.clone()).with_inline_timer(inline);
    let screen = AlternateScreen::new(config.fullscreen);

    let mut session = FocusLoop::new(client, screen, sink, config.grace_period());
    focus_loop::spawn_stdin_reader(session.sender());
    let result = session.run(planned, true).await;
    // Leave the alternate screen before printing anything else.
    drop(session);

    result.context("failed to start focus session")?;
    focus_loop::finish(&mut io::stdout())
}
