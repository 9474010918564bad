//! Async brew session
//!
//! A single driver task owns the [`StepTimer`]. Commands arrive over an mpsc
//! channel, timer firings arrive from spawned ticker tasks, and every change
//! is published as a [`TimerSnapshot`] on a watch channel. Whenever the
//! engine asks for a different timer, the old ticker task is aborted before
//! its replacement is spawned.

use crate::domain::recipe::{RecipeStep, StepEdit, StepList};
use crate::domain::timer::{StepTimer, TimerHandle, TimerId, TimerSnapshot};
use crate::error::{Error, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

/// Pending commands the driver will buffer before callers wait
const COMMAND_BUFFER: usize = 32;

/// A request a caller can make of the session
#[derive(Debug, Clone)]
pub enum Command {
    TogglePlayPause,
    Pause,
    NextStep,
    PreviousStep,
    Reset,
    AddStep(RecipeStep),
    EditStep { index: usize, edit: StepEdit },
    RemoveStep(usize),
    ReplaceSteps(StepList),
}

#[derive(Debug)]
struct Request {
    command: Command,
    reply: oneshot::Sender<Result<TimerSnapshot>>,
}

#[derive(Debug, Clone, Copy)]
enum TimerEvent {
    Tick(TimerId),
    GramsTick(TimerId),
}

/// Handle to a running brew session
#[derive(Debug)]
pub struct BrewSession {
    commands: mpsc::Sender<Request>,
    snapshots: watch::Receiver<TimerSnapshot>,
    driver: JoinHandle<()>,
}

impl BrewSession {
    /// Spawn the driver task for `timer`.
    pub fn spawn(timer: StepTimer) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(timer.snapshot());

        let driver = Driver {
            timer,
            commands: commands_rx,
            events_tx,
            events_rx,
            tick_task: TimerTask::default(),
            grams_task: TimerTask::default(),
            snapshots: snapshots_tx,
        };
        let driver = tokio::spawn(driver.run());

        Self {
            commands: commands_tx,
            snapshots: snapshots_rx,
            driver,
        }
    }

    pub async fn send(&self, command: Command) -> Result<TimerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)?
    }

    pub async fn toggle_play_pause(&self) -> Result<TimerSnapshot> {
        self.send(Command::TogglePlayPause).await
    }

    pub async fn pause(&self) -> Result<TimerSnapshot> {
        self.send(Command::Pause).await
    }

    pub async fn next_step(&self) -> Result<TimerSnapshot> {
        self.send(Command::NextStep).await
    }

    pub async fn previous_step(&self) -> Result<TimerSnapshot> {
        self.send(Command::PreviousStep).await
    }

    pub async fn reset(&self) -> Result<TimerSnapshot> {
        self.send(Command::Reset).await
    }

    pub async fn add_step(&self, step: RecipeStep) -> Result<TimerSnapshot> {
        self.send(Command::AddStep(step)).await
    }

    pub async fn edit_step(&self, index: usize, edit: StepEdit) -> Result<TimerSnapshot> {
        self.send(Command::EditStep { index, edit }).await
    }

    pub async fn remove_step(&self, index: usize) -> Result<TimerSnapshot> {
        self.send(Command::RemoveStep(index)).await
    }

    pub async fn replace_steps(&self, steps: StepList) -> Result<TimerSnapshot> {
        self.send(Command::ReplaceSteps(steps)).await
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the driver and every ticker it owns.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(e) = self.driver.await {
            warn!("Brew session driver ended abnormally: {}", e);
        }
    }
}

/// The ticker task backing one of the engine's timers
#[derive(Debug, Default)]
struct TimerTask {
    id: Option<TimerId>,
    handle: Option<JoinHandle<()>>,
}

impl TimerTask {
    /// Make the running ticker match `wanted`, aborting a stale one first.
    fn sync(
        &mut self,
        wanted: Option<TimerHandle>,
        events: &mpsc::UnboundedSender<TimerEvent>,
        event: fn(TimerId) -> TimerEvent,
    ) {
        let wanted_id = wanted.map(|timer| timer.id);
        if self.id == wanted_id {
            return;
        }

        self.cancel();
        self.id = wanted_id;
        if let Some(timer) = wanted {
            self.handle = Some(spawn_ticker(timer, events.clone(), event));
        }
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.id = None;
    }
}

fn spawn_ticker(
    timer: TimerHandle,
    events: mpsc::UnboundedSender<TimerEvent>,
    event: fn(TimerId) -> TimerEvent,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + timer.period, timer.period);
        loop {
            ticks.tick().await;
            if events.send(event(timer.id)).is_err() {
                break;
            }
        }
    })
}

struct Driver {
    timer: StepTimer,
    commands: mpsc::Receiver<Request>,
    events_tx: mpsc::UnboundedSender<TimerEvent>,
    events_rx: mpsc::UnboundedReceiver<TimerEvent>,
    tick_task: TimerTask,
    grams_task: TimerTask,
    snapshots: watch::Sender<TimerSnapshot>,
}

impl Driver {
    async fn run(mut self) {
        info!("Brew session started");

        loop {
            tokio::select! {
                request = self.commands.recv() => {
                    let Some(Request { command, reply }) = request else {
                        break;
                    };
                    let result = self.apply(command);
                    self.sync_timers();
                    let snapshot = self.publish();
                    // Caller may have stopped waiting.
                    let _ = reply.send(result.map(|()| snapshot));
                }
                Some(event) = self.events_rx.recv() => {
                    let live = match event {
                        TimerEvent::Tick(id) => self.timer.on_tick(id),
                        TimerEvent::GramsTick(id) => self.timer.on_grams_tick(id),
                    };
                    if !live {
                        debug!(?event, "Ignoring stale timer event");
                        continue;
                    }
                    self.sync_timers();
                    self.publish();
                }
            }
        }

        self.tick_task.cancel();
        self.grams_task.cancel();
        info!("Brew session stopped");
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        debug!(?command, "Applying command");
        match command {
            Command::TogglePlayPause => {
                self.timer.toggle_play_pause();
            }
            Command::Pause => {
                self.timer.pause();
            }
            Command::NextStep => {
                self.timer.next_step();
            }
            Command::PreviousStep => {
                self.timer.previous_step();
            }
            Command::Reset => self.timer.reset(),
            Command::AddStep(step) => {
                self.timer.add_step(step)?;
            }
            Command::EditStep { index, edit } => self.timer.edit_step(index, edit)?,
            Command::RemoveStep(index) => {
                self.timer.remove_step(index)?;
            }
            Command::ReplaceSteps(steps) => self.timer.replace_steps(steps),
        }
        Ok(())
    }

    fn sync_timers(&mut self) {
        let state = self.timer.state();
        let tick = state.tick_timer();
        let grams = state.grams_timer().map(|grams| grams.handle);

        self.tick_task.sync(tick, &self.events_tx, TimerEvent::Tick);
        self.grams_task
            .sync(grams, &self.events_tx, TimerEvent::GramsTick);
    }

    fn publish(&self) -> TimerSnapshot {
        let next = self.timer.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });
        next
    }
}
