//! Suspends and resumes the countdown as the client moves between
//! foreground and background.
//!
//! Visibility changes are a purely local nudge. Nothing here talks to the
//! backend; only confirmed early exits are recorded server-side.

use std::time::Duration;

use crate::controller::{
    Admonition, AdmonitionSource, FocusBackend, Presentation, SessionController, Ticker,
    VISIBILITY_ADMONITION,
};
use crate::session::SessionStatus;
use crate::view::RenderSink;

/// Delay before checking whether a hide was only momentary.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(100);

/// What the caller should do after a visibility event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityAction {
    None,
    /// Call [`VisibilityMonitor::grace_check`] after this delay.
    ScheduleGraceCheck(Duration),
}

/// Translates visibility events into controller operations.
#[derive(Debug, Clone)]
pub struct VisibilityMonitor {
    grace_period: Duration,
    /// One per hide; each check runs independently of the others.
    pending_checks: usize,
}

impl Default for VisibilityMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl VisibilityMonitor {
    #[must_use]
    pub const fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            pending_checks: 0,
        }
    }

    pub const fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// The client went to the background.
    pub fn became_hidden<B, T, P, R>(
        &mut self,
        controller: &mut SessionController<B, T, P, R>,
    ) -> VisibilityAction
    where
        B: FocusBackend,
        T: Ticker,
        P: Presentation,
        R: RenderSink,
    {
        if !controller.suspend() {
            return VisibilityAction::None;
        }
        self.pending_checks += 1;
        VisibilityAction::ScheduleGraceCheck(self.grace_period)
    }

    /// The client came back to the foreground.
    ///
    /// Resumes the countdown unless an admonition is on screen. Returns
    /// `true` if the countdown resumed.
    pub fn became_visible<B, T, P, R>(
        &mut self,
        controller: &mut SessionController<B, T, P, R>,
    ) -> bool
    where
        B: FocusBackend,
        T: Ticker,
        P: Presentation,
        R: RenderSink,
    {
        if controller.status() != SessionStatus::Suspended || controller.admonition().is_some() {
            return false;
        }
        controller.resume()
    }

    /// Runs the delayed check scheduled by [`Self::became_hidden`].
    ///
    /// `hidden` is the visibility at the moment the check runs. A hide that
    /// has already been reversed counts as a momentary distraction and raises
    /// one admonition.
    pub fn grace_check<B, T, P, R>(
        &mut self,
        controller: &mut SessionController<B, T, P, R>,
        hidden: bool,
    ) -> bool
    where
        B: FocusBackend,
        T: Ticker,
        P: Presentation,
        R: RenderSink,
    {
        if self.pending_checks == 0 {
            return false;
        }
        self.pending_checks -= 1;
        if hidden {
            return false;
        }
        let status = controller.status();
        if !matches!(status, SessionStatus::Running | SessionStatus::Suspended)
            || controller.admonition().is_some()
        {
            return false;
        }
        tracing::info!("brief switch away during focus session");
        controller.raise_admonition(Admonition {
            source: AdmonitionSource::Visibility,
            message: VISIBILITY_ADMONITION.to_string(),
        });
        true
    }
}
