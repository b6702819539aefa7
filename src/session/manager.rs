//! Session actor and its handle
//!
//! All session state lives on one spawned task. Callers talk to it through
//! an unbounded command channel and receive [`SessionEvent`]s on another.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::config::SessionConfig;
use super::error::SessionError;

/// Why a session ended on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    Idle,
    MaxLifetime,
}

/// Notification sent by a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session expires in `remaining` unless extended
    Warning { remaining: Duration },
    /// The session was extended and now expires in `expires_in`
    Extended { expires_in: Duration },
    /// The session expired and the user must log in again
    Expired { reason: ExpiryReason },
    LoggedOut,
}

/// Point-in-time view of the session record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub started_at: Instant,
    pub last_activity: Instant,
    pub expires_at: Instant,
    pub warning_issued: bool,
    pub remaining: Duration,
}

#[derive(Debug)]
enum Command {
    Activity,
    Extend,
    Logout,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Stop,
}

/// Handle to a session actor
///
/// Must be started from within a Tokio runtime.
#[derive(Debug)]
pub struct SessionManager {
    config: SessionConfig,
    commands: Option<mpsc::UnboundedSender<Command>>,
    task: Option<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config,
            commands: None,
            task: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a new session and return its event stream
    ///
    /// A session that expired or logged out may be started again.
    pub fn start(&mut self) -> Result<mpsc::UnboundedReceiver<SessionEvent>, SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let actor = SessionActor::new(self.config.clone(), event_tx);
        tracing::info!(
            idle_timeout_secs = self.config.idle_timeout_secs,
            max_lifetime_secs = self.config.max_lifetime_secs,
            "Session started"
        );

        self.task = Some(tokio::spawn(actor.run(command_rx)));
        self.commands = Some(command_tx);
        Ok(event_rx)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Note user activity; picked up by the next check
    pub fn record_activity(&self) -> Result<(), SessionError> {
        self.send(Command::Activity)
    }

    /// Restart the idle window now, within the lifetime cap
    pub fn extend(&self) -> Result<(), SessionError> {
        self.send(Command::Extend)
    }

    /// End the session on behalf of the user
    pub fn logout(&self) -> Result<(), SessionError> {
        self.send(Command::Logout)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot(reply_tx))?;
        reply_rx.await.map_err(|_| SessionError::NotRunning)
    }

    /// Stop the actor without emitting an event and wait for it to finish
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        let commands = self.commands.take().ok_or(SessionError::NotRunning)?;
        // The actor may already have exited after expiry or logout
        let _ = commands.send(Command::Stop);

        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!("Session task ended abnormally: {}", err);
            }
        }
        Ok(())
    }

    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .as_ref()
            .ok_or(SessionError::NotRunning)?
            .send(command)
            .map_err(|_| SessionError::NotRunning)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SessionRecord {
    started_at: Instant,
    last_activity: Instant,
    expires_at: Instant,
    warning_issued: bool,
}

/// What woke the actor loop
enum Wake {
    Command(Option<Command>),
    PeriodicCheck,
    LifetimeCheck,
    WarningDue,
    ExpirationDue,
}

/// What the loop does after handling a wake-up
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Reschedule,
    Stop,
}

struct SessionActor {
    config: SessionConfig,
    record: SessionRecord,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionActor {
    fn new(config: SessionConfig, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        let now = Instant::now();
        let mut actor = Self {
            config,
            record: SessionRecord {
                started_at: now,
                last_activity: now,
                expires_at: now,
                warning_issued: false,
            },
            events,
        };
        actor.record.expires_at = actor.compute_expiry();
        actor
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let started = self.record.started_at;

        let mut periodic = time::interval_at(
            started + self.config.check_interval(),
            self.config.check_interval(),
        );
        periodic.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut lifetime = time::interval_at(
            started + self.config.lifetime_check_interval(),
            self.config.lifetime_check_interval(),
        );
        lifetime.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let warning = time::sleep_until(self.warning_at());
        let expiration = time::sleep_until(self.record.expires_at);
        tokio::pin!(warning, expiration);

        loop {
            let wake = tokio::select! {
                command = commands.recv() => Wake::Command(command),
                _ = periodic.tick() => Wake::PeriodicCheck,
                _ = lifetime.tick() => Wake::LifetimeCheck,
                _ = &mut warning, if !self.record.warning_issued => Wake::WarningDue,
                _ = &mut expiration => Wake::ExpirationDue,
            };

            let flow = match wake {
                Wake::Command(Some(command)) => self.handle_command(command),
                Wake::Command(None) => Flow::Stop,
                Wake::PeriodicCheck | Wake::WarningDue | Wake::ExpirationDue => self.evaluate(),
                Wake::LifetimeCheck => {
                    tracing::debug!(
                        age_secs = started.elapsed().as_secs(),
                        "Session lifetime check"
                    );
                    self.evaluate()
                }
            };

            match flow {
                Flow::Continue => {}
                Flow::Reschedule => {
                    warning.as_mut().reset(self.warning_at());
                    expiration.as_mut().reset(self.record.expires_at);
                }
                Flow::Stop => break,
            }
        }

        tracing::debug!("Session actor stopped");
    }

    fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Activity => {
                self.record.last_activity = Instant::now();
                Flow::Continue
            }
            Command::Extend => {
                let now = Instant::now();
                self.record.last_activity = now;
                self.refresh();

                let expires_in = self.record.expires_at.saturating_duration_since(now);
                tracing::info!(expires_in_secs = expires_in.as_secs(), "Session extended");
                self.emit(SessionEvent::Extended { expires_in });
                Flow::Reschedule
            }
            Command::Logout => {
                tracing::info!("Session logged out");
                self.emit(SessionEvent::LoggedOut);
                Flow::Stop
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
                Flow::Continue
            }
            Command::Stop => Flow::Stop,
        }
    }

    /// Recompute expiry, then warn or expire as the clock requires
    fn evaluate(&mut self) -> Flow {
        let rescheduled = self.refresh();
        let now = Instant::now();

        if now >= self.record.expires_at {
            let reason = self.expiry_reason();
            tracing::info!(?reason, "Session expired");
            self.emit(SessionEvent::Expired { reason });
            return Flow::Stop;
        }

        if !self.record.warning_issued && now >= self.warning_at() {
            self.record.warning_issued = true;
            let remaining = self.record.expires_at - now;
            tracing::info!(remaining_secs = remaining.as_secs(), "Session expiring soon");
            self.emit(SessionEvent::Warning { remaining });
        }

        if rescheduled {
            Flow::Reschedule
        } else {
            Flow::Continue
        }
    }

    /// Update `expires_at`; returns whether it moved
    fn refresh(&mut self) -> bool {
        let expires_at = self.compute_expiry();
        if expires_at == self.record.expires_at {
            return false;
        }
        self.record.expires_at = expires_at;
        self.record.warning_issued = false;
        true
    }

    fn compute_expiry(&self) -> Instant {
        self.idle_deadline().min(self.lifetime_deadline())
    }

    fn idle_deadline(&self) -> Instant {
        self.record.last_activity + self.config.idle_timeout()
    }

    fn lifetime_deadline(&self) -> Instant {
        self.record.started_at + self.config.max_lifetime()
    }

    fn expiry_reason(&self) -> ExpiryReason {
        if self.idle_deadline() <= self.lifetime_deadline() {
            ExpiryReason::Idle
        } else {
            ExpiryReason::MaxLifetime
        }
    }

    fn warning_at(&self) -> Instant {
        self.record
            .expires_at
            .checked_sub(self.config.warning_lead())
            .map_or(self.record.started_at, |at| at.max(self.record.started_at))
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            started_at: self.record.started_at,
            last_activity: self.record.last_activity,
            expires_at: self.record.expires_at,
            warning_issued: self.record.warning_issued,
            remaining: self.record.expires_at.saturating_duration_since(Instant::now()),
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Session event dropped, receiver is gone");
        }
    }
}
