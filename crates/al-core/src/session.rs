//! The focus session countdown and its lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::SessionId;

/// Durations a focus session may be started with.
pub const ALLOWED_MINUTES: [u32; 4] = [15, 25, 45, 60];

/// Error for a focus duration outside [`ALLOWED_MINUTES`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("focus duration must be one of 15, 25, 45 or 60 minutes, got {0}")]
pub struct InvalidDuration(pub String);

/// A planned focus duration drawn from [`ALLOWED_MINUTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PlannedMinutes(u32);

impl PlannedMinutes {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for PlannedMinutes {
    fn default() -> Self {
        Self(25)
    }
}

impl TryFrom<u32> for PlannedMinutes {
    type Error = InvalidDuration;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        if ALLOWED_MINUTES.contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(InvalidDuration(minutes.to_string()))
        }
    }
}

impl From<PlannedMinutes> for u32 {
    fn from(minutes: PlannedMinutes) -> Self {
        minutes.0
    }
}

impl FromStr for PlannedMinutes {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes: u32 = s
            .trim()
            .parse()
            .map_err(|_| InvalidDuration(s.to_string()))?;
        Self::try_from(minutes)
    }
}

impl fmt::Display for PlannedMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time left on the countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Remaining {
    minutes: u32,
    seconds: u8,
}

impl Remaining {
    #[must_use]
    pub const fn new(minutes: u32, seconds: u8) -> Self {
        let seconds = if seconds > 59 { 59 } else { seconds };
        Self { minutes, seconds }
    }

    #[must_use]
    pub const fn from_planned(planned: PlannedMinutes) -> Self {
        Self {
            minutes: planned.get(),
            seconds: 0,
        }
    }

    #[must_use]
    pub const fn minutes(&self) -> u32 {
        self.minutes
    }

    #[must_use]
    pub const fn seconds(&self) -> u8 {
        self.seconds
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }

    #[must_use]
    pub const fn total_seconds(&self) -> u64 {
        self.minutes as u64 * 60 + self.seconds as u64
    }

    /// Removes one second, borrowing from the minutes. Saturates at zero.
    fn decrement(&mut self) {
        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Lifecycle state of the focus session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    /// Paused because the client went to the background.
    Suspended,
    /// Paused while the user decides whether to leave early.
    AwaitingExitConfirmation,
    Completed,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::AwaitingExitConfirmation => "awaiting_exit_confirmation",
            Self::Completed => "completed",
        }
    }

    /// Whether a session is in progress (started and not yet finished).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Running | Self::Suspended | Self::AwaitingExitConfirmation
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {operation} while session is {status}")]
pub struct InvalidTransition {
    pub operation: &'static str,
    pub status: SessionStatus,
}

/// Result of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not running; nothing changed.
    Ignored,
    /// One second elapsed and time remains.
    Continue(Remaining),
    /// The countdown reached zero on this tick.
    Completed,
}

/// In-memory focus session.
///
/// Only the session controller owns one of these. Every mutation goes through
/// a transition method that checks the current [`SessionStatus`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusSession {
    id: Option<SessionId>,
    planned: Option<PlannedMinutes>,
    remaining: Remaining,
    status: SessionStatus,
}

impl FocusSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    pub const fn planned(&self) -> Option<PlannedMinutes> {
        self.planned
    }

    pub const fn remaining(&self) -> Remaining {
        self.remaining
    }

    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Starts a fresh countdown for a backend-issued session.
    pub fn begin(
        &mut self,
        id: SessionId,
        planned: PlannedMinutes,
    ) -> Result<(), InvalidTransition> {
        self.require("start", &[SessionStatus::Idle, SessionStatus::Completed])?;
        *self = Self {
            id: Some(id),
            planned: Some(planned),
            remaining: Remaining::from_planned(planned),
            status: SessionStatus::Running,
        };
        Ok(())
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::Running {
            return TickOutcome::Ignored;
        }
        self.remaining.decrement();
        if self.remaining.is_zero() {
            self.status = SessionStatus::Completed;
            TickOutcome::Completed
        } else {
            TickOutcome::Continue(self.remaining)
        }
    }

    pub fn suspend(&mut self) -> Result<(), InvalidTransition> {
        self.require("suspend", &[SessionStatus::Running])?;
        self.status = SessionStatus::Suspended;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), InvalidTransition> {
        self.require("resume", &[SessionStatus::Suspended])?;
        self.status = SessionStatus::Running;
        Ok(())
    }

    pub fn request_exit(&mut self) -> Result<(), InvalidTransition> {
        self.require("request exit", &[SessionStatus::Running])?;
        self.status = SessionStatus::AwaitingExitConfirmation;
        Ok(())
    }

    pub fn cancel_exit(&mut self) -> Result<(), InvalidTransition> {
        self.require("cancel exit", &[SessionStatus::AwaitingExitConfirmation])?;
        self.status = SessionStatus::Running;
        Ok(())
    }

    pub fn confirm_exit(&mut self) -> Result<(), InvalidTransition> {
        self.require("confirm exit", &[SessionStatus::AwaitingExitConfirmation])?;
        self.status = SessionStatus::Completed;
        Ok(())
    }

    /// Drops the session entirely. Returns `false` if it was already idle.
    pub fn reset(&mut self) -> bool {
        if *self == Self::default() {
            return false;
        }
        *self = Self::default();
        true
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[SessionStatus],
    ) -> Result<(), InvalidTransition> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(InvalidTransition {
                operation,
                status: self.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(minutes: u32) -> FocusSession {
        let mut session = FocusSession::new();
        session
            .begin(
                SessionId::new(1),
                PlannedMinutes::try_from(minutes).unwrap(),
            )
            .unwrap();
        session
    }

    #[test]
    fn planned_minutes_accepts_only_allowed_values() {
        for minutes in ALLOWED_MINUTES {
            assert_eq!(PlannedMinutes::try_from(minutes).unwrap().get(), minutes);
        }
        assert!(PlannedMinutes::try_from(20).is_err());
        assert!(PlannedMinutes::try_from(0).is_err());
        assert!("abc".parse::<PlannedMinutes>().is_err());
        assert_eq!("45".parse::<PlannedMinutes>().unwrap().get(), 45);
    }

    #[test]
    fn tick_borrows_from_minutes() {
        let mut session = running(15);
        assert_eq!(session.remaining(), Remaining::new(15, 0));
        assert_eq!(
            session.tick(),
            TickOutcome::Continue(Remaining::new(14, 59))
        );
        assert_eq!(session.remaining().to_string(), "14:59");
    }

    #[test]
    fn twenty_five_minutes_complete_after_1500_ticks() {
        let mut session = running(25);
        let mut previous = session.remaining();
        for _ in 0..1499 {
            assert!(matches!(session.tick(), TickOutcome::Continue(_)));
            assert!(session.remaining() < previous);
            previous = session.remaining();
        }
        assert_eq!(session.tick(), TickOutcome::Completed);
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(session.remaining().is_zero());

        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert!(session.remaining().is_zero());
    }

    #[test]
    fn ticks_are_ignored_unless_running() {
        let mut session = running(15);
        session.suspend().unwrap();
        assert_eq!(session.tick(), TickOutcome::Ignored);
        session.resume().unwrap();
        session.request_exit().unwrap();
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.remaining(), Remaining::new(15, 0));
    }

    #[test]
    fn exit_transitions_require_confirmation_state() {
        let mut session = running(15);
        let err = session.confirm_exit().unwrap_err();
        assert_eq!(err.status, SessionStatus::Running);

        session.request_exit().unwrap();
        session.cancel_exit().unwrap();
        assert_eq!(session.status(), SessionStatus::Running);

        session.request_exit().unwrap();
        session.confirm_exit().unwrap();
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn begin_is_rejected_while_active() {
        let mut session = running(15);
        assert!(
            session
                .begin(SessionId::new(2), PlannedMinutes::default())
                .is_err()
        );
    }

    #[test]
    fn reset_reports_whether_anything_changed() {
        let mut session = running(15);
        assert!(session.reset());
        assert!(!session.reset());
        assert_eq!(session.status(), SessionStatus::Idle);
    }
}
