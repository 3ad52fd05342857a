//! Plain-text rendering of session, plan and chat data.
//!
//! Everything here is a pure function of its input. Output goes through a
//! [`RenderSink`], which is the only place that knows about a concrete UI.

use crate::controller::Admonition;
use crate::model::{ChatMessage, ChatRole, Dashboard, Plan, Stats};
use crate::session::{FocusSession, Remaining, SessionStatus};

/// Below this many minutes the timer is shown as urgent.
pub const URGENT_THRESHOLD_MINUTES: u32 = 5;

/// Ticks between focus quote rotations.
pub const QUOTE_ROTATION_TICKS: u32 = 30;

pub const EMPTY_PLANS_TEXT: &str = "No plans yet. Add one to get started!";

const FOCUS_QUOTES: &[&str] = &[
    "\"Every great result is the sum of small, consistent actions.\"",
    "\"Success is not a single chance, it is a choice made every day.\"",
    "\"Attention is your most valuable resource. Spend it wisely.\"",
    "\"Boredom is a sign you are standing at the edge of growth.\"",
    "\"One hour of focused work beats eight hours of distracted work.\"",
    "\"What feels hard now will feel simple tomorrow.\"",
    "\"Keep your goal in sight. Let every minute go toward it.\"",
];

/// Receives everything the client wants to show.
///
/// Implementations must not call back into the session controller.
pub trait RenderSink {
    fn render_timer(&mut self, view: &TimerView);
    fn render_dashboard(&mut self, dashboard: &Dashboard);
    fn render_plans(&mut self, plans: &[Plan]);
    fn render_chat(&mut self, messages: &[ChatMessage]);
    fn show_admonition(&mut self, admonition: &Admonition);
    fn show_completion(&mut self, actual_minutes: u32);
    fn show_notice(&mut self, message: &str);
}

/// Timer display state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerView {
    pub text: String,
    pub status: SessionStatus,
    pub urgent: bool,
}

impl TimerView {
    #[must_use]
    pub fn from_session(session: &FocusSession) -> Self {
        let remaining = session.remaining();
        Self {
            text: timer_text(remaining),
            status: session.status(),
            urgent: session.status() != SessionStatus::Idle
                && remaining.minutes() < URGENT_THRESHOLD_MINUTES,
        }
    }
}

/// `MM:SS`, zero padded.
#[must_use]
pub fn timer_text(remaining: Remaining) -> String {
    remaining.to_string()
}

#[must_use]
pub fn plan_line(plan: &Plan) -> String {
    let mark = if plan.completed { 'x' } else { ' ' };
    format!("[{mark}] #{} {}", plan.id, plan.text)
}

#[must_use]
pub fn plan_lines(plans: &[Plan]) -> Vec<String> {
    if plans.is_empty() {
        return vec![EMPTY_PLANS_TEXT.to_string()];
    }
    plans.iter().map(plan_line).collect()
}

#[must_use]
pub fn stats_lines(stats: &Stats) -> Vec<String> {
    vec![
        format!("Focus minutes: {}", stats.total_minutes),
        format!("Sessions:      {}", stats.sessions),
        format!("Distractions:  {}", stats.distractions),
    ]
}

/// Chat transcript lines. An empty history renders a greeting instead.
#[must_use]
pub fn chat_lines(messages: &[ChatMessage], username: &str) -> Vec<String> {
    if messages.is_empty() {
        return vec![format!(
            "assistant> Hello, {username}! I'm Aliman AI, here to help you focus. What shall we talk about today?"
        )];
    }
    messages
        .iter()
        .map(|message| {
            let prefix = match message.role {
                ChatRole::User => "you",
                ChatRole::Assistant => "assistant",
            };
            format!("{prefix}> {}", message.content)
        })
        .collect()
}

/// Cycles through motivational quotes while a session runs.
#[derive(Debug, Clone, Default)]
pub struct QuoteRotator {
    index: usize,
    ticks: u32,
}

impl QuoteRotator {
    #[must_use]
    pub fn current(&self) -> &'static str {
        FOCUS_QUOTES[self.index]
    }

    /// Counts one tick; returns the next quote when it is time to rotate.
    pub fn tick(&mut self) -> Option<&'static str> {
        self.ticks += 1;
        if self.ticks < QUOTE_ROTATION_TICKS {
            return None;
        }
        self.ticks = 0;
        self.index = (self.index + 1) % FOCUS_QUOTES.len();
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::SessionId;
    use crate::session::PlannedMinutes;

    #[test]
    fn timer_view_marks_last_minutes_urgent() {
        let mut session = FocusSession::new();
        session
            .begin(SessionId::new(1), PlannedMinutes::try_from(15).unwrap())
            .unwrap();
        let view = TimerView::from_session(&session);
        assert_eq!(view.text, "15:00");
        assert!(!view.urgent);

        for _ in 0..(11 * 60) {
            session.tick();
        }
        let view = TimerView::from_session(&session);
        assert_eq!(view.text, "04:00");
        assert!(view.urgent);
    }

    #[test]
    fn plan_lines_render_placeholder_when_empty() {
        assert_eq!(plan_lines(&[]), vec![EMPTY_PLANS_TEXT.to_string()]);
    }

    #[test]
    fn plan_lines_mark_completed_plans() {
        let plans = vec![
            Plan {
                id: 2,
                text: "Read chapter 3".to_string(),
                completed: true,
            },
            Plan {
                id: 1,
                text: "Write tests".to_string(),
                completed: false,
            },
        ];
        insta::assert_snapshot!(plan_lines(&plans).join("\n"), @r"
        [x] #2 Read chapter 3
        [ ] #1 Write tests
        ");
    }

    #[test]
    fn chat_lines_greet_on_empty_history() {
        let lines = chat_lines(&[], "aziz");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Hello, aziz!"));
    }

    #[test]
    fn chat_lines_prefix_roles() {
        let messages = vec![
            ChatMessage {
                role: ChatRole::User,
                content: "hi".to_string(),
            },
            ChatMessage {
                role: ChatRole::Assistant,
                content: "Hello!".to_string(),
            },
        ];
        assert_eq!(chat_lines(&messages, "aziz"), vec!["you> hi", "assistant> Hello!"]);
    }

    #[test]
    fn quote_rotator_advances_every_thirty_ticks() {
        let mut rotator = QuoteRotator::default();
        let first = rotator.current();
        for _ in 0..(QUOTE_ROTATION_TICKS - 1) {
            assert!(rotator.tick().is_none());
        }
        let next = rotator.tick().unwrap();
        assert_ne!(first, next);
    }
}
