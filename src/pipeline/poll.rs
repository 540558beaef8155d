// src/pipeline/poll.rs

//! Background polling controller.
//!
//! A single task owns the [`ViewState`], the countdown and at most one
//! in-flight request. Everything else talks to it through commands and
//! reads published [`DashboardSnapshot`]s, so fetch completions, timer ticks
//! and user input are serialized without shared locks.
//!
//! Timing contract:
//! - one fetch right after start;
//! - the countdown starts at the period and drops by one every second;
//! - when it would reach zero a fetch is started and it resets to the period;
//! - a manual refresh resets the countdown and starts a fetch;
//! - a tick or refresh that arrives while a request is in flight does not
//!   start a second one.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, OptionFuture};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::countdown::Countdown;
use super::fetch::poll_once;
use crate::models::{PollOutcome, PollingConfig, Toast, ToastLevel, ViewState};
use crate::services::{AvailabilitySource, PayloadParser};

const TOAST_BUFFER: usize = 16;

/// Poller tuning.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub period_secs: u64,
    pub retain_on_error: bool,
}

impl From<&PollingConfig> for PollSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            period_secs: config.period_secs,
            retain_on_error: config.retain_on_error,
        }
    }
}

/// What a renderer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub view: ViewState,
    pub remaining_secs: u64,
    pub in_flight: bool,
    /// Requests started since the poller was created.
    pub fetches_started: u64,
    /// Most recent notification, if any poll has completed.
    pub last_toast: Option<Toast>,
}

#[derive(Debug)]
enum Command {
    RefreshNow,
    SetSearch(String),
    Stop,
}

/// Handle to the polling task.
///
/// Dropping the handle aborts the task and with it any in-flight request.
pub struct Poller {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<DashboardSnapshot>,
    toasts: broadcast::Sender<Toast>,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn the polling task. Must be called inside a tokio runtime.
    pub fn start(
        source: Arc<dyn AvailabilitySource>,
        parser: Arc<dyn PayloadParser>,
        settings: PollSettings,
    ) -> Self {
        let countdown = Countdown::new(settings.period_secs);
        let view = ViewState::new(settings.retain_on_error);

        let (snapshot_tx, snapshot_rx) = watch::channel(DashboardSnapshot {
            view: view.clone(),
            remaining_secs: countdown.remaining(),
            in_flight: false,
            fetches_started: 0,
            last_toast: None,
        });
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (toast_tx, _) = broadcast::channel(TOAST_BUFFER);

        log::info!(
            "Polling {} every {}s",
            source.describe(),
            countdown.period()
        );

        let driver = Driver {
            source,
            parser,
            view,
            countdown,
            in_flight: None,
            fetches_started: 0,
            last_toast: None,
            snapshots: snapshot_tx,
            toasts: toast_tx.clone(),
        };
        let task = tokio::spawn(driver.run(command_rx));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            toasts: toast_tx,
            task: Some(task),
        }
    }

    /// Fetch now and restart the countdown.
    pub fn refresh_now(&self) {
        self.send(Command::RefreshNow);
    }

    pub fn set_search(&self, term: impl Into<String>) {
        self.send(Command::SetSearch(term.into()));
    }

    /// Latest published state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    /// Notifications raised after this call. Slow receivers skip ahead.
    pub fn notifications(&self) -> broadcast::Receiver<Toast> {
        self.toasts.subscribe()
    }

    /// Stop polling and wait for the task to exit. Any in-flight request is
    /// cancelled and its result never applied.
    pub async fn stop(mut self) {
        self.send(Command::Stop);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Poller task ended abnormally: {}", e);
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Poller already stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Driver {
    source: Arc<dyn AvailabilitySource>,
    parser: Arc<dyn PayloadParser>,
    view: ViewState,
    countdown: Countdown,
    in_flight: Option<BoxFuture<'static, PollOutcome>>,
    fetches_started: u64,
    last_toast: Option<Toast>,
    snapshots: watch::Sender<DashboardSnapshot>,
    toasts: broadcast::Sender<Toast>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut ticker = time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        self.begin_fetch();
        self.publish();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.countdown.tick() {
                        self.begin_fetch();
                    }
                    self.publish();
                }
                command = commands.recv() => match command {
                    Some(Command::RefreshNow) => {
                        self.countdown.reset();
                        self.begin_fetch();
                        self.publish();
                    }
                    Some(Command::SetSearch(term)) => {
                        self.view.set_search(term);
                        self.publish();
                    }
                    Some(Command::Stop) | None => break,
                },
                Some(outcome) = OptionFuture::from(self.in_flight.as_mut()) => {
                    self.in_flight = None;
                    self.finish_fetch(outcome);
                    self.publish();
                }
            }
        }

        if self.in_flight.take().is_some() {
            log::debug!("Dropped in-flight request on stop");
        }
        log::info!("Polling stopped");
    }

    fn begin_fetch(&mut self) {
        if self.in_flight.is_some() {
            log::debug!("Refresh skipped, request already in flight");
            return;
        }

        let source = Arc::clone(&self.source);
        let parser = Arc::clone(&self.parser);
        self.in_flight = Some(
            async move { poll_once(source.as_ref(), parser.as_ref()).await }.boxed(),
        );
        self.fetches_started += 1;
        self.view.begin_refresh();
    }

    fn finish_fetch(&mut self, outcome: PollOutcome) {
        let toast = self.view.apply(outcome, chrono::Utc::now());
        match toast.level {
            ToastLevel::Success => log::debug!("{}", toast.message),
            ToastLevel::Warning => log::warn!("{}", toast.message),
            ToastLevel::Error => log::error!("{}", toast.message),
        }
        // No subscribers is fine; the snapshot still carries the toast.
        let _ = self.toasts.send(toast.clone());
        self.last_toast = Some(toast);
    }

    fn publish(&self) {
        self.snapshots.send_replace(DashboardSnapshot {
            view: self.view.clone(),
            remaining_secs: self.countdown.remaining(),
            in_flight: self.in_flight.is_some(),
            fetches_started: self.fetches_started,
            last_toast: self.last_toast.clone(),
        });
    }
}
