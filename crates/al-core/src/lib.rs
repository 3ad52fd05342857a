//! Core domain logic for the Aliman focus client.
//!
//! This crate contains:
//! - Session: the focus countdown and its lifecycle states
//! - Controller: start/tick/exit/teardown orchestration over a backend
//! - Visibility: foreground/background handling during a session
//! - View: plain-text rendering and the render sink interface
//!
//! It performs no I/O itself; the backend, tick source, presentation mode and
//! render sink are supplied by the caller.

pub mod controller;
pub mod model;
pub mod session;
pub mod view;
pub mod visibility;

pub use controller::{
    Acknowledged, Admonition, AdmonitionSource, ExitOutcome, FocusBackend, LEAVE_WARNING,
    NO_REASON_GIVEN, Presentation, PresentationError, SessionController, SessionError, Ticker,
};
pub use model::{
    ChatContext, ChatMessage, ChatRole, Credential, Dashboard, EndFocus, ExitType, FocusEnded,
    FocusStarted, Plan, SessionId, StartFocus, Stats,
};
pub use session::{
    ALLOWED_MINUTES, FocusSession, InvalidDuration, InvalidTransition, PlannedMinutes, Remaining,
    SessionStatus, TickOutcome,
};
pub use view::{QuoteRotator, RenderSink, TimerView};
pub use visibility::{VisibilityAction, VisibilityMonitor};
