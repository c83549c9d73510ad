//! The poll loop: fetch, normalize, aggregate and render once per tick.
//!
//! [`Poller`] performs a single tick. [`Scheduler`] drives ticks through the
//! `Idle → Polling → Waiting → Polling …` cycle until the [`Shutdown`]
//! handle fires, sleeping through an injectable [`Clock`] so the loop can be
//! exercised on virtual time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::arrival::ArrivalRecord;
use crate::feeds::ArrivalSource;
use crate::render::Renderer;

/// Time source for the loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, period: Duration);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Creates a linked trigger / listener pair for cooperative cancellation.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

#[derive(Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the trigger fires. Never resolves if the trigger was
    /// dropped without firing.
    pub async fn triggered(&mut self) {
        if self.0.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// What one source contributed to a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceBoard {
    pub arrivals: Vec<ArrivalRecord>,
    /// Set when the fetch or parse failed; `arrivals` is then empty.
    pub failure: Option<String>,
}

/// Everything the renderer needs for one tick. Sources that are not
/// configured are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    pub polled_at: DateTime<Utc>,
    pub bus: Option<SourceBoard>,
    pub train: Option<SourceBoard>,
}

/// Runs one tick against the configured sources.
pub struct Poller {
    bus: Option<Box<dyn ArrivalSource>>,
    train: Option<Box<dyn ArrivalSource>>,
    max_bus: usize,
    max_train: usize,
}

impl Poller {
    pub fn new(
        bus: Option<Box<dyn ArrivalSource>>,
        train: Option<Box<dyn ArrivalSource>>,
        max_bus: usize,
        max_train: usize,
    ) -> Self {
        Self {
            bus,
            train,
            max_bus,
            max_train,
        }
    }

    /// Fetches both sources concurrently against the single `now` sample.
    ///
    /// A failing source only empties its own board.
    pub async fn tick(&self, now: DateTime<Utc>) -> Board {
        let (mut bus, mut train) = tokio::join!(
            collect(self.bus.as_deref(), now),
            collect(self.train.as_deref(), now)
        );

        let (bus_view, train_view) = aggregate(
            take_arrivals(&mut bus),
            take_arrivals(&mut train),
            self.max_bus,
            self.max_train,
        );
        debug!(
            bus = bus_view.len(),
            train = train_view.len(),
            "Tick aggregated"
        );

        if let Some(board) = &mut bus {
            board.arrivals = bus_view;
        }
        if let Some(board) = &mut train {
            board.arrivals = train_view;
        }

        Board {
            polled_at: now,
            bus,
            train,
        }
    }
}

fn take_arrivals(board: &mut Option<SourceBoard>) -> Vec<ArrivalRecord> {
    board
        .as_mut()
        .map(|b| std::mem::take(&mut b.arrivals))
        .unwrap_or_default()
}

async fn collect(source: Option<&dyn ArrivalSource>, now: DateTime<Utc>) -> Option<SourceBoard> {
    let source = source?;
    let board = match source.arrivals(now).await {
        Ok(arrivals) => {
            debug!(source = %source.source(), records = arrivals.len(), "Source normalized");
            SourceBoard {
                arrivals,
                failure: None,
            }
        }
        Err(e) => {
            warn!(source = %source.source(), error = %e, "Source failed this tick");
            SourceBoard {
                arrivals: Vec::new(),
                failure: Some(e.to_string()),
            }
        }
    };
    Some(board)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Waiting,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
}

pub struct Scheduler<K> {
    poller: Poller,
    clock: K,
    interval: Duration,
    max_ticks: Option<u64>,
}

impl<K: Clock> Scheduler<K> {
    pub fn new(poller: Poller, clock: K, interval: Duration) -> Self {
        Self {
            poller,
            clock,
            interval,
            max_ticks: None,
        }
    }

    /// Stop after `ticks` ticks instead of waiting for cancellation.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Polls until `shutdown` fires (or the tick limit is reached).
    ///
    /// Cancellation interrupts a wait immediately; a tick already in
    /// progress is completed and rendered first.
    ///
    /// # Errors
    ///
    /// Only renderer failures end the loop with an error.
    pub async fn run<R: Renderer>(
        &self,
        renderer: &mut R,
        mut shutdown: Shutdown,
    ) -> anyhow::Result<RunSummary> {
        let mut ticks = 0u64;
        let mut state = PollState::Idle;

        loop {
            debug!(?state, ticks, "Poll loop state");
            state = match state {
                PollState::Idle if shutdown.is_triggered() => PollState::Stopped,
                PollState::Idle => PollState::Polling,
                PollState::Polling => {
                    let board = self.poller.tick(self.clock.now()).await;
                    renderer.render(&board)?;
                    ticks += 1;

                    let limit_reached = self.max_ticks.is_some_and(|max| ticks >= max);
                    if shutdown.is_triggered() || limit_reached {
                        PollState::Stopped
                    } else {
                        PollState::Waiting
                    }
                }
                PollState::Waiting => {
                    tokio::select! {
                        _ = self.clock.sleep(self.interval) => PollState::Polling,
                        _ = shutdown.triggered() => PollState::Stopped,
                    }
                }
                PollState::Stopped => break,
            };
        }

        info!(ticks, "Polling stopped");
        Ok(RunSummary { ticks })
    }
}
