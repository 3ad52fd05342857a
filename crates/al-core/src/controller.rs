//! Session controller: drives a [`FocusSession`] through its lifecycle.
//!
//! The controller is the single owner of the session. It talks to the backend
//! only at session boundaries (start and end), never on individual ticks.
//!
//! # Tick scheduling
//!
//! The periodic tick is owned by a [`Ticker`]. Every code path that arms the
//! tick disarms it first, so there is never more than one tick source running.
//! Two live ticks would double-decrement the countdown.

use std::error::Error as StdError;
use std::future::Future;

use thiserror::Error;

use crate::model::{Dashboard, EndFocus, ExitType, FocusEnded, FocusStarted};
use crate::session::{
    FocusSession, InvalidTransition, PlannedMinutes, Remaining, SessionStatus, TickOutcome,
};
use crate::view::{RenderSink, TimerView};

/// Reason sent to the backend when the user leaves without giving one.
pub const NO_REASON_GIVEN: &str = "No reason given";

/// Warning shown when the user tries to leave mid-session.
pub const LEAVE_WARNING: &str =
    "You are in focus mode! Leaving now will stop your focus session.";

/// Message shown after a brief switch away from the client.
pub const VISIBILITY_ADMONITION: &str = "You left the focus screen!\n\n\
Switching to another tab or window during focus mode counts as a distraction.\n\n\
Come back and keep going!";

/// Backend operations the controller needs.
pub trait FocusBackend {
    type Error: StdError + Send + Sync + 'static;

    fn start_focus(
        &self,
        planned: PlannedMinutes,
    ) -> impl Future<Output = Result<FocusStarted, Self::Error>>;

    fn end_focus(&self, request: &EndFocus) -> impl Future<Output = Result<FocusEnded, Self::Error>>;

    fn dashboard(&self) -> impl Future<Output = Result<Dashboard, Self::Error>>;
}

/// Source of the once-per-second tick.
pub trait Ticker {
    /// Starts delivering ticks. Implementations must stop any tick armed
    /// earlier.
    fn arm(&mut self);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
}

/// The environment refused an exclusive presentation mode.
#[derive(Debug, Error)]
#[error("presentation mode unavailable: {0}")]
pub struct PresentationError(pub String);

/// Exclusive full-screen presentation.
pub trait Presentation {
    fn enter_fullscreen(&mut self) -> Result<(), PresentationError>;
    fn exit_fullscreen(&mut self) -> Result<(), PresentationError>;
}

/// Where an admonition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionSource {
    /// Returned by the backend after a distracted exit.
    Server,
    /// Raised locally after a brief switch away.
    Visibility,
}

/// A message discouraging distraction. While one is shown the session is
/// blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admonition {
    pub source: AdmonitionSource,
    pub message: String,
}

/// Controller errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// An admonition must be acknowledged first.
    #[error("an admonition is waiting to be acknowledged")]
    Blocked,
    /// The backend call failed. The session was torn down.
    #[error("backend request failed: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl SessionError {
    fn backend(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Result of a confirmed early exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The session was closed.
    Closed,
    /// The backend replied with an admonition; the session is blocked until
    /// [`SessionController::acknowledge_admonition`].
    Admonished(String),
}

/// What acknowledging an admonition led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledged {
    /// Nothing was pending.
    Nothing,
    /// A server admonition was cleared; start again with this duration.
    Restart(PlannedMinutes),
    /// A visibility admonition was cleared and the countdown resumed.
    Resumed,
}

/// Owns the focus session and its collaborators.
pub struct SessionController<B, T, P, R> {
    session: FocusSession,
    admonition: Option<Admonition>,
    fullscreen: bool,
    backend: B,
    ticker: T,
    presentation: P,
    sink: R,
}

impl<B, T, P, R> SessionController<B, T, P, R>
where
    B: FocusBackend,
    T: Ticker,
    P: Presentation,
    R: RenderSink,
{
    pub fn new(backend: B, ticker: T, presentation: P, sink: R) -> Self {
        Self {
            session: FocusSession::new(),
            admonition: None,
            fullscreen: false,
            backend,
            ticker,
            presentation,
            sink,
        }
    }

    pub const fn session(&self) -> &FocusSession {
        &self.session
    }

    pub const fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub const fn remaining(&self) -> Remaining {
        self.session.remaining()
    }

    pub const fn admonition(&self) -> Option<&Admonition> {
        self.admonition.as_ref()
    }

    pub const fn ticker(&self) -> &T {
        &self.ticker
    }

    pub const fn sink(&self) -> &R {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut R {
        &mut self.sink
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Starts a new focus session.
    ///
    /// On backend failure the controller tears down and the session stays
    /// idle.
    pub async fn start(&mut self, planned: PlannedMinutes) -> Result<(), SessionError> {
        if self.admonition.is_some() {
            return Err(SessionError::Blocked);
        }
        if self.session.status().is_active() {
            return Err(InvalidTransition {
                operation: "start",
                status: self.session.status(),
            }
            .into());
        }

        let started = match self.backend.start_focus(planned).await {
            Ok(started) => started,
            Err(err) => {
                tracing::warn!(error = %err, "failed to start focus session");
                self.teardown().await;
                return Err(SessionError::backend(err));
            }
        };

        self.session.begin(started.session_id, planned)?;
        tracing::info!(
            session_id = %self.session.id().map(ToString::to_string).unwrap_or_default(),
            minutes = planned.get(),
            "focus session started"
        );

        if !self.fullscreen {
            match self.presentation.enter_fullscreen() {
                Ok(()) => self.fullscreen = true,
                Err(err) => tracing::debug!(error = %err, "continuing without fullscreen"),
            }
        }

        self.render_timer();
        self.rearm_tick();
        Ok(())
    }

    /// Advances the countdown by one second.
    ///
    /// When the countdown reaches zero the session completes and the backend
    /// is told about it.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        let outcome = self.session.tick();
        match outcome {
            TickOutcome::Ignored => {}
            TickOutcome::Continue(_) => self.render_timer(),
            TickOutcome::Completed => {
                self.ticker.disarm();
                self.render_timer();
                self.finish_completed().await?;
            }
        }
        Ok(outcome)
    }

    async fn finish_completed(&mut self) -> Result<(), SessionError> {
        let Some(session_id) = self.session.id().cloned() else {
            return Ok(());
        };
        let request = EndFocus {
            session_id,
            exit_type: ExitType::Completed,
            exit_reason: None,
        };
        match self.backend.end_focus(&request).await {
            Ok(ended) => {
                tracing::info!(actual_minutes = ended.actual_minutes, "focus session completed");
                self.sink.show_completion(ended.actual_minutes);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to record completed session");
                self.teardown().await;
                Err(SessionError::backend(err))
            }
        }
    }

    /// Pauses the countdown while the user confirms leaving early.
    pub fn request_exit(&mut self) -> Result<(), SessionError> {
        self.session.request_exit()?;
        self.ticker.disarm();
        self.render_timer();
        Ok(())
    }

    /// Returns to the countdown with the time that was left.
    pub fn cancel_exit(&mut self) -> Result<(), SessionError> {
        self.session.cancel_exit()?;
        self.rearm_tick();
        self.render_timer();
        Ok(())
    }

    /// Ends the session early, reporting `reason` to the backend.
    pub async fn confirm_exit(&mut self, reason: &str) -> Result<ExitOutcome, SessionError> {
        self.session.confirm_exit()?;
        self.ticker.disarm();

        let Some(session_id) = self.session.id().cloned() else {
            self.teardown().await;
            return Ok(ExitOutcome::Closed);
        };
        let request = EndFocus {
            session_id,
            exit_type: ExitType::Distracted,
            exit_reason: Some(normalize_reason(reason)),
        };

        let ended = match self.backend.end_focus(&request).await {
            Ok(ended) => ended,
            Err(err) => {
                tracing::warn!(error = %err, "failed to record early exit");
                self.teardown().await;
                return Err(SessionError::backend(err));
            }
        };

        match ended.ai_response.filter(|text| !text.trim().is_empty()) {
            Some(message) => {
                let admonition = Admonition {
                    source: AdmonitionSource::Server,
                    message: message.clone(),
                };
                self.sink.show_admonition(&admonition);
                self.admonition = Some(admonition);
                Ok(ExitOutcome::Admonished(message))
            }
            None => {
                self.teardown().await;
                Ok(ExitOutcome::Closed)
            }
        }
    }

    /// Clears the displayed admonition.
    pub fn acknowledge_admonition(&mut self) -> Acknowledged {
        let Some(admonition) = self.admonition.take() else {
            return Acknowledged::Nothing;
        };
        match admonition.source {
            AdmonitionSource::Server => self
                .session
                .planned()
                .map_or(Acknowledged::Nothing, Acknowledged::Restart),
            // The countdown picks up where it stopped; no new session.
            AdmonitionSource::Visibility => {
                if self.resume() {
                    Acknowledged::Resumed
                } else {
                    Acknowledged::Nothing
                }
            }
        }
    }

    /// Pauses a running countdown. Returns `true` if it was running.
    pub fn suspend(&mut self) -> bool {
        if self.session.suspend().is_err() {
            return false;
        }
        self.ticker.disarm();
        tracing::debug!(remaining = %self.session.remaining(), "countdown suspended");
        true
    }

    /// Resumes a suspended countdown unless an admonition is still shown.
    pub fn resume(&mut self) -> bool {
        if self.admonition.is_some() || self.session.resume().is_err() {
            return false;
        }
        self.rearm_tick();
        self.render_timer();
        tracing::debug!(remaining = %self.session.remaining(), "countdown resumed");
        true
    }

    /// Shows an admonition and blocks the countdown until it is acknowledged.
    pub fn raise_admonition(&mut self, admonition: Admonition) {
        self.suspend();
        self.sink.show_admonition(&admonition);
        self.admonition = Some(admonition);
    }

    /// Returns the leave warning while a session is in progress.
    pub const fn leave_warning(&self) -> Option<&'static str> {
        if self.session.status().is_active() {
            Some(LEAVE_WARNING)
        } else {
            None
        }
    }

    /// Tears the session down and refreshes the dashboard.
    ///
    /// Safe to call from any state. Returns `false`, doing nothing, if there
    /// was nothing to tear down.
    pub async fn teardown(&mut self) -> bool {
        let armed = self.ticker.is_armed();
        let had_fullscreen = self.fullscreen;
        let had_admonition = self.admonition.take().is_some();

        self.ticker.disarm();
        if self.fullscreen {
            if let Err(err) = self.presentation.exit_fullscreen() {
                tracing::debug!(error = %err, "failed to leave fullscreen");
            }
            self.fullscreen = false;
        }
        let had_session = self.session.reset();

        if !(armed || had_fullscreen || had_admonition || had_session) {
            return false;
        }
        tracing::debug!("focus session torn down");

        match self.backend.dashboard().await {
            Ok(dashboard) => self.sink.render_dashboard(&dashboard),
            Err(err) => tracing::warn!(error = %err, "failed to refresh dashboard"),
        }
        true
    }

    fn rearm_tick(&mut self) {
        self.ticker.disarm();
        self.ticker.arm();
    }

    fn render_timer(&mut self) {
        let view = TimerView::from_session(&self.session);
        self.sink.render_timer(&view);
    }
}

/// Trims the reason; an empty reason becomes [`NO_REASON_GIVEN`].
#[must_use]
pub fn normalize_reason(reason: &str) -> String {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        NO_REASON_GIVEN.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory collaborators for controller tests.

    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::model::{ChatMessage, Plan, SessionId};

    #[derive(Debug, Error)]
    #[error("backend unavailable")]
    pub struct FakeError;

    #[derive(Debug, Default)]
    pub struct FakeBackend {
        pub fail_start: Cell<bool>,
        pub fail_end: Cell<bool>,
        pub ai_response: RefCell<Option<String>>,
        pub next_id: Cell<i64>,
        pub end_requests: RefCell<Vec<EndFocus>>,
        pub dashboard_fetches: Cell<usize>,
    }

    impl FocusBackend for Rc<FakeBackend> {
        type Error = FakeError;

        async fn start_focus(&self, _planned: PlannedMinutes) -> Result<FocusStarted, FakeError> {
            if self.fail_start.get() {
                return Err(FakeError);
            }
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            Ok(FocusStarted {
                session_id: SessionId::new(id),
            })
        }

        async fn end_focus(&self, request: &EndFocus) -> Result<FocusEnded, FakeError> {
            self.end_requests.borrow_mut().push(request.clone());
            if self.fail_end.get() {
                return Err(FakeError);
            }
            let ai_response = match request.exit_type {
                ExitType::Distracted => self.ai_response.borrow().clone(),
                ExitType::Completed => None,
            };
            Ok(FocusEnded {
                actual_minutes: 25,
                ai_response,
            })
        }

        async fn dashboard(&self) -> Result<Dashboard, FakeError> {
            self.dashboard_fetches.set(self.dashboard_fetches.get() + 1);
            Ok(Dashboard::default())
        }
    }

    /// Counts arms so tests can assert a single live tick source.
    #[derive(Debug, Default)]
    pub struct ManualTicker {
        pub armed: bool,
        pub arms: usize,
        pub double_arms: usize,
    }

    impl Ticker for ManualTicker {
        fn arm(&mut self) {
            if self.armed {
                self.double_arms += 1;
            }
            self.armed = true;
            self.arms += 1;
        }

        fn disarm(&mut self) {
            self.armed = false;
        }

        fn is_armed(&self) -> bool {
            self.armed
        }
    }

    #[derive(Debug, Default)]
    pub struct FakeScreen {
        pub deny: bool,
        pub fullscreen: bool,
    }

    impl Presentation for FakeScreen {
        fn enter_fullscreen(&mut self) -> Result<(), PresentationError> {
            if self.deny {
                return Err(PresentationError("denied".to_string()));
            }
            self.fullscreen = true;
            Ok(())
        }

        fn exit_fullscreen(&mut self) -> Result<(), PresentationError> {
            self.fullscreen = false;
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub timers: Vec<TimerView>,
        pub admonitions: VecDeque<Admonition>,
        pub completions: Vec<u32>,
        pub dashboards: usize,
    }

    impl RenderSink for RecordingSink {
        fn render_timer(&mut self, view: &TimerView) {
            self.timers.push(view.clone());
        }

        fn render_dashboard(&mut self, _dashboard: &Dashboard) {
            self.dashboards += 1;
        }

        fn render_plans(&mut self, _plans: &[Plan]) {}

        fn render_chat(&mut self, _messages: &[ChatMessage]) {}

        fn show_admonition(&mut self, admonition: &Admonition) {
            self.admonitions.push_back(admonition.clone());
        }

        fn show_completion(&mut self, actual_minutes: u32) {
            self.completions.push(actual_minutes);
        }

        fn show_notice(&mut self, _message: &str) {}
    }

    pub type TestController =
        SessionController<Rc<FakeBackend>, ManualTicker, FakeScreen, RecordingSink>;

    pub fn controller() -> (TestController, Rc<FakeBackend>) {
        let backend = Rc::new(FakeBackend::default());
        let controller = SessionController::new(
            Rc::clone(&backend),
            ManualTicker::default(),
            FakeScreen::default(),
            RecordingSink::default(),
        );
        (controller, backend)
    }
}
