//! Interactive focus session event loop.
//!
//! Ticks, stdin lines, grace checks and Ctrl-C all arrive as [`Event`]s on one
//! channel and are handled one at a time. Only this loop touches the session
//! controller.

use std::error::Error as StdError;
use std::future::Future;
use std::io::{BufRead, Write};
use std::time::Duration;

use al_api::{ApiError, Client};
use al_core::{
    Acknowledged, ChatContext, ExitOutcome, FocusBackend, PlannedMinutes, Presentation,
    QuoteRotator, RenderSink, SessionController, SessionStatus, TickOutcome, Ticker,
    VisibilityAction, VisibilityMonitor,
};
use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const TICK_PERIOD: Duration = Duration::from_secs(1);

pub const HELP: &str = "Commands: exit, stay, confirm [reason], ok, hide, show, chat <message>, close, help";

/// Everything the loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Periodic tick, stamped with the ticker generation that produced it.
    Tick(u64),
    Input(String),
    InputClosed,
    GraceCheck,
    Interrupt,
}

/// One-second ticker backed by a tokio interval task.
///
/// Arming aborts the previous task and bumps the generation. Ticks already
/// queued from an older generation are dropped by [`Self::is_current`].
pub struct TokioTicker {
    tx: UnboundedSender<Event>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
    period: Duration,
}

impl TokioTicker {
    pub const fn new(tx: UnboundedSender<Event>) -> Self {
        Self::with_period(tx, TICK_PERIOD)
    }

    pub const fn with_period(tx: UnboundedSender<Event>, period: Duration) -> Self {
        Self {
            tx,
            handle: None,
            generation: 0,
            period,
        }
    }

    /// Whether a tick from `generation` should be applied.
    pub const fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }
}

impl Ticker for TokioTicker {
    fn arm(&mut self) {
        self.disarm();
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick(generation)).is_err() {
                    break;
                }
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// A line typed during a focus session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusInput {
    RequestExit,
    CancelExit,
    ConfirmExit(String),
    Acknowledge,
    Hidden,
    Visible,
    Chat(String),
    Close,
    Help,
    Empty,
    Unknown(String),
}

impl FocusInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(command, rest)| (command, rest.trim()));
        match command.to_ascii_lowercase().as_str() {
            "" => Self::Empty,
            "exit" | "quit" => Self::RequestExit,
            "stay" | "cancel" => Self::CancelExit,
            "confirm" => Self::ConfirmExit(rest.to_string()),
            "ok" | "back" => Self::Acknowledge,
            "hide" => Self::Hidden,
            "show" => Self::Visible,
            "chat" if !rest.is_empty() => Self::Chat(rest.to_string()),
            "close" => Self::Close,
            "help" | "?" => Self::Help,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Reads stdin lines on a dedicated thread.
///
/// Blocking reads stay off the runtime so shutdown never waits on them.
pub fn spawn_stdin_reader(tx: UnboundedSender<Event>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}

fn spawn_interrupt_listener(tx: UnboundedSender<Event>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(Event::Interrupt).is_err() {
                break;
            }
        }
    });
}

/// Chat with the assistant from inside a focus session.
pub trait FocusChat {
    type Error: StdError + Send + Sync + 'static;

    fn focus_chat(&self, message: &str) -> impl Future<Output = Result<String, Self::Error>>;
}

impl FocusChat for Client {
    type Error = ApiError;

    async fn focus_chat(&self, message: &str) -> Result<String, ApiError> {
        self.chat(message, ChatContext::Focus).await
    }
}

/// Drives one focus session (and any restarts) to completion.
pub struct FocusLoop<B, P, R> {
    controller: SessionController<B, TokioTicker, P, R>,
    monitor: VisibilityMonitor,
    quotes: QuoteRotator,
    tx: UnboundedSender<Event>,
    rx: UnboundedReceiver<Event>,
    hidden: bool,
    leave_warned: bool,
}

impl<B, P, R> FocusLoop<B, P, R>
where
    B: FocusBackend + FocusChat,
    P: Presentation,
    R: RenderSink,
{
    pub fn new(backend: B, presentation: P, sink: R, grace_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = TokioTicker::new(tx.clone());
        Self {
            controller: SessionController::new(backend, ticker, presentation, sink),
            monitor: VisibilityMonitor::new(grace_period),
            quotes: QuoteRotator::default(),
            tx,
            rx,
            hidden: false,
            leave_warned: false,
        }
    }

    /// Sender for feeding events from outside (stdin, signals, tests).
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.tx.clone()
    }

    pub const fn controller(&self) -> &SessionController<B, TokioTicker, P, R> {
        &self.controller
    }

    /// Starts the session and processes events until it is torn down.
    pub async fn run(&mut self, planned: PlannedMinutes, listen_for_interrupt: bool) -> Result<()> {
        if listen_for_interrupt {
            spawn_interrupt_listener(self.tx.clone());
        }

        self.controller.start(planned).await?;
        self.notice(HELP);
        let quote = self.quotes.current();
        self.notice(quote);

        while let Some(event) = self.rx.recv().await {
            self.handle(event).await;
            if self.controller.status() == SessionStatus::Idle {
                break;
            }
        }
        Ok(())
    }

    async fn handle(&mut self, event: Event) {
        match event {
            Event::Tick(generation) => {
                if !self.controller.ticker().is_current(generation) {
                    tracing::trace!(generation, "dropping stale tick");
                    return;
                }
                let outcome = self.controller.tick().await;
                match outcome {
                    Ok(TickOutcome::Continue(_)) => {
                        if let Some(quote) = self.quotes.tick() {
                            self.notice(quote);
                        }
                    }
                    Ok(TickOutcome::Completed | TickOutcome::Ignored) => {}
                    Err(err) => self.notice(&format!("Could not finish the session: {err}")),
                }
            }
            Event::GraceCheck => {
                self.monitor.grace_check(&mut self.controller, self.hidden);
            }
            Event::Interrupt => {
                if let (Some(warning), false) = (self.controller.leave_warning(), self.leave_warned)
                {
                    self.leave_warned = true;
                    self.notice(warning);
                    self.notice("Press Ctrl-C again to leave anyway.");
                } else {
                    self.controller.teardown().await;
                }
            }
            Event::InputClosed => {
                self.controller.teardown().await;
            }
            Event::Input(line) => self.handle_input(FocusInput::parse(&line)).await,
        }
    }

    async fn handle_input(&mut self, input: FocusInput) {
        match input {
            FocusInput::RequestExit => {
                if let Err(err) = self.controller.request_exit() {
                    self.notice(&err.to_string());
                }
            }
            FocusInput::CancelExit => {
                if let Err(err) = self.controller.cancel_exit() {
                    self.notice(&err.to_string());
                }
            }
            FocusInput::ConfirmExit(reason) => {
                let outcome = self.controller.confirm_exit(&reason).await;
                match outcome {
                    Ok(ExitOutcome::Closed | ExitOutcome::Admonished(_)) => {}
                    Err(err) => self.notice(&err.to_string()),
                }
            }
            FocusInput::Acknowledge => match self.controller.acknowledge_admonition() {
                Acknowledged::Restart(planned) => {
                    self.leave_warned = false;
                    if let Err(err) = self.controller.start(planned).await {
                        self.notice(&format!("Could not start a new session: {err}"));
                    }
                }
                Acknowledged::Resumed | Acknowledged::Nothing => {}
            },
            FocusInput::Hidden => {
                self.hidden = true;
                if let VisibilityAction::ScheduleGraceCheck(delay) =
                    self.monitor.became_hidden(&mut self.controller)
                {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        time::sleep(delay).await;
                        let _ = tx.send(Event::GraceCheck);
                    });
                }
            }
            FocusInput::Visible => {
                self.hidden = false;
                self.monitor.became_visible(&mut self.controller);
            }
            FocusInput::Chat(message) => {
                let reply = self.controller.backend().focus_chat(&message).await;
                match reply {
                    Ok(reply) => self.notice(&format!("assistant> {reply}")),
                    Err(err) => self.notice(&format!("Chat failed: {err}")),
                }
            }
            FocusInput::Close => {
                if self.controller.status().is_active() {
                    self.notice("The session is still running. Use `exit` to leave early.");
                } else {
                    self.controller.teardown().await;
                }
            }
            FocusInput::Help => self.notice(HELP),
            FocusInput::Empty => {}
            FocusInput::Unknown(line) => self.notice(&format!("Unknown command: {line}. {HELP}")),
        }
    }

    fn notice(&mut self, message: &str) {
        self.controller.sink_mut().show_notice(message);
    }
}

/// Writes the closing line after the loop ends.
pub fn finish<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "Focus session ended.")?;
    Ok(())
}
