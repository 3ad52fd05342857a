//! Terminal rendering for the focus client.

use std::fmt::Display;
use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::tty::IsTty;
use crossterm::{execute, queue};

use al_core::view::{chat_lines, plan_lines, stats_lines};
use al_core::{
    Admonition, AdmonitionSource, ChatMessage, Dashboard, Plan, Presentation, PresentationError,
    RenderSink, SessionStatus, TimerView,
};

/// Writes rendered output to a terminal or any other writer.
pub struct TerminalSink<W: Write> {
    writer: W,
    username: String,
    /// Redraw the timer in place instead of printing one line per tick.
    inline_timer: bool,
    timer_on_line: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(writer: W, username: impl Into<String>) -> Self {
        Self {
            writer,
            username: username.into(),
            inline_timer: false,
            timer_on_line: false,
        }
    }

    #[must_use]
    pub const fn with_inline_timer(mut self, inline: bool) -> Self {
        self.inline_timer = inline;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, text: impl Display) {
        let result = if self.timer_on_line {
            self.timer_on_line = false;
            writeln!(self.writer, "\n{text}")
        } else {
            writeln!(self.writer, "{text}")
        };
        if let Err(err) = result.and_then(|()| self.writer.flush()) {
            tracing::warn!(error = %err, "failed to write output");
        }
    }

    fn lines(&mut self, lines: &[String]) {
        for line in lines {
            self.line(line);
        }
    }
}

const fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "idle",
        SessionStatus::Running => "focus",
        SessionStatus::Suspended => "paused",
        SessionStatus::AwaitingExitConfirmation => "leave? confirm [reason] / stay",
        SessionStatus::Completed => "done",
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn render_timer(&mut self, view: &TimerView) {
        let hint = if view.urgent && view.status == SessionStatus::Running {
            " - almost there!"
        } else {
            ""
        };
        let text = format!("{} [{}]{hint}", view.text, status_label(view.status));

        if !self.inline_timer {
            self.line(text);
            return;
        }
        let result = queue!(
            self.writer,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(text)
        )
        .and_then(|()| self.writer.flush());
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to draw timer");
        }
        self.timer_on_line = true;
    }

    fn render_dashboard(&mut self, dashboard: &Dashboard) {
        self.line(format!("Hello, {}!", self.username));
        if !dashboard.ai_question.is_empty() {
            self.line(&dashboard.ai_question);
        }
        self.line("");
        self.line("Today");
        self.lines(&stats_lines(&dashboard.stats));
        self.line("");
        self.line("Plans");
        self.lines(&plan_lines(&dashboard.plans));
    }

    fn render_plans(&mut self, plans: &[Plan]) {
        self.lines(&plan_lines(plans));
    }

    fn render_chat(&mut self, messages: &[ChatMessage]) {
        let lines = chat_lines(messages, &self.username);
        self.lines(&lines);
    }

    fn show_admonition(&mut self, admonition: &Admonition) {
        let hint = match admonition.source {
            AdmonitionSource::Server => "Type `ok` to start a new session or `close` to stop.",
            AdmonitionSource::Visibility => "Type `ok` to get back to focus.",
        };
        self.line("");
        self.line(format!("!! {}", admonition.message));
        self.line(hint);
    }

    fn show_completion(&mut self, actual_minutes: u32) {
        self.line(format!(
            "You focused for {actual_minutes} minutes. Great job! Type `close` to finish."
        ));
    }

    fn show_notice(&mut self, message: &str) {
        self.line(message);
    }
}

/// Full-screen presentation via the terminal's alternate screen buffer.
#[derive(Debug, Default)]
pub struct AlternateScreen {
    enabled: bool,
    active: bool,
}

impl AlternateScreen {
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: false,
        }
    }
}

impl Presentation for AlternateScreen {
    fn enter_fullscreen(&mut self) -> Result<(), PresentationError> {
        if !self.enabled {
            return Err(PresentationError("disabled by configuration".to_string()));
        }
        let mut stdout = io::stdout();
        if !stdout.is_tty() {
            return Err(PresentationError("stdout is not a terminal".to_string()));
        }
        execute!(stdout, EnterAlternateScreen)
            .map_err(|err| PresentationError(err.to_string()))?;
        self.active = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PresentationError> {
        if !std::mem::take(&mut self.active) {
            return Ok(());
        }
        let mut stdout = io::stdout();
        execute!(stdout, LeaveAlternateScreen)
            .map_err(|err| PresentationError(err.to_string()))
    }
}

impl Drop for AlternateScreen {
    fn drop(&mut self) {
        let _ = self.exit_fullscreen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use al_core::Stats;
    use insta::assert_snapshot;

    fn render(f: impl FnOnce(&mut TerminalSink<Vec<u8>>)) -> String {
        let mut sink = TerminalSink::new(Vec::new(), "aziz");
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn dashboard_renders_stats_and_plans() {
        let dashboard = Dashboard {
            ai_question: "What will you do today?".to_string(),
            stats: Stats {
                total_minutes: 50,
                sessions: 2,
                distractions: 1,
            },
            plans: vec![Plan {
                id: 1,
                text: "Finish report".to_string(),
                completed: false,
            }],
        };
        let output = render(|sink| sink.render_dashboard(&dashboard));
        assert_snapshot!(output, @r"
        Hello, aziz!
        What will you do today?

        Today
        Focus minutes: 50
        Sessions:      2
        Distractions:  1

        Plans
        [ ] #1 Finish report
        ");
    }

    #[test]
    fn timer_shows_status_and_urgency() {
        let output = render(|sink| {
            sink.render_timer(&TimerView {
                text: "04:59".to_string(),
                status: SessionStatus::Running,
                urgent: true,
            });
            sink.render_timer(&TimerView {
                text: "04:59".to_string(),
                status: SessionStatus::AwaitingExitConfirmation,
                urgent: true,
            });
        });
        assert_eq!(
            output,
            "04:59 [focus] - almost there!\n04:59 [leave? confirm [reason] / stay]\n"
        );
    }

    #[test]
    fn inline_timer_breaks_line_before_next_message() {
        let mut sink = TerminalSink::new(Vec::new(), "aziz").with_inline_timer(true);
        sink.render_timer(&TimerView {
            text: "24:59".to_string(),
            status: SessionStatus::Running,
            urgent: false,
        });
        sink.show_notice("hello");
        let output = String::from_utf8(sink.into_inner()).unwrap();

        let mut expected = Vec::new();
        queue!(
            expected,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print("24:59 [focus]")
        )
        .unwrap();
        let expected = String::from_utf8(expected).unwrap();
        assert!(output.starts_with(&expected), "{output:?}");
        assert!(output.ends_with("24:59 [focus]\nhello\n"));
        assert!(output.contains("\x1b[2K"));
    }

    #[test]
    fn admonition_explains_how_to_continue() {
        let output = render(|sink| {
            sink.show_admonition(&Admonition {
                source: AdmonitionSource::Server,
                message: "That is a distraction!".to_string(),
            });
        });
        assert!(output.contains("!! That is a distraction!"));
        assert!(output.contains("start a new session"));
    }

    #[test]
    fn disabled_alternate_screen_refuses() {
        let mut screen = AlternateScreen::new(false);
        assert!(screen.enter_fullscreen().is_err());
        assert!(screen.exit_fullscreen().is_ok());
    }
}
