//! Background player task
//!
//! Runs builds and the playback timer off the caller's thread. The caller
//! talks to it through a [`PlayerHandle`] and receives [`PlayerUpdate`]s on
//! an unbounded channel.

use std::future::pending;
use std::pin::Pin;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Sleep;

use crate::backend::{BackendRegistry, SourceFile};
use crate::protocol::{Command, TraceError};
use crate::view::View;

use super::scheduler::{BuildTicket, PlayerConfig, PlayerState, PlayerUpdate, Scheduler};

type BuildResult = Result<Vec<Command>, TraceError>;

/// Point-in-time view of the player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    pub cursor: usize,
    pub chunk_count: usize,
    pub line: Option<u32>,
    pub speed: f64,
    pub root: Option<View>,
}

/// Commands to the player task
#[derive(Debug)]
pub enum PlayerCommand {
    /// Switch to a document, resetting if it differs from the current one
    Open { document: String },
    /// Trace a source file, superseding any build in flight
    Build { source: SourceFile },
    Play,
    Pause,
    Next { reply: oneshot::Sender<bool> },
    Prev { reply: oneshot::Sender<bool> },
    Seek {
        progress: f64,
        reply: oneshot::Sender<bool>,
    },
    SetSpeed { speed: f64 },
    Reset,
    /// Drag-resize a layout's children
    Resize {
        key: String,
        weights: Vec<f64>,
        reply: oneshot::Sender<Result<(), TraceError>>,
    },
    Snapshot { reply: oneshot::Sender<PlayerSnapshot> },
    Shutdown,
}

/// Handle to control the player task
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    cmd_tx: mpsc::UnboundedSender<PlayerCommand>,
}

impl PlayerHandle {
    pub fn open(&self, document: impl Into<String>) {
        let _ = self.cmd_tx.send(PlayerCommand::Open {
            document: document.into(),
        });
    }

    pub fn build(&self, source: SourceFile) {
        let _ = self.cmd_tx.send(PlayerCommand::Build { source });
    }

    pub fn play(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Play);
    }

    pub fn pause(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Pause);
    }

    /// Step forward. Returns false at the end or if the task is gone.
    pub async fn next(&self) -> bool {
        self.ask(|reply| PlayerCommand::Next { reply })
            .await
            .unwrap_or(false)
    }

    pub async fn prev(&self) -> bool {
        self.ask(|reply| PlayerCommand::Prev { reply })
            .await
            .unwrap_or(false)
    }

    pub async fn seek(&self, progress: f64) -> bool {
        self.ask(|reply| PlayerCommand::Seek { progress, reply })
            .await
            .unwrap_or(false)
    }

    pub fn set_speed(&self, speed: f64) {
        let _ = self.cmd_tx.send(PlayerCommand::SetSpeed { speed });
    }

    pub fn reset(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Reset);
    }

    pub async fn resize(&self, key: impl Into<String>, weights: Vec<f64>) -> Result<(), TraceError> {
        let key = key.into();
        self.ask(|reply| PlayerCommand::Resize {
            key,
            weights,
            reply,
        })
        .await
        .unwrap_or_else(|| Err(TraceError::protocol("player is not running")))
    }

    /// `None` once the task has shut down.
    pub async fn snapshot(&self) -> Option<PlayerSnapshot> {
        self.ask(|reply| PlayerCommand::Snapshot { reply }).await
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Shutdown);
    }

    async fn ask<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> PlayerCommand) -> Option<T> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx.send(command(reply)).ok()?;
        rx.await.ok()
    }
}

/// Background player
pub struct PlayerTask {
    scheduler: Scheduler,
    backends: BackendRegistry,
    /// In-flight build and the ticket it answers to
    build: Option<(BuildTicket, JoinHandle<BuildResult>)>,
    /// Armed timer and its epoch
    timer: Option<(u64, Pin<Box<Sleep>>)>,
    cmd_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    update_tx: mpsc::UnboundedSender<PlayerUpdate>,
}

impl PlayerTask {
    /// Spawn the player and return a handle to control it
    pub fn spawn(
        config: PlayerConfig,
        backends: BackendRegistry,
        update_tx: mpsc::UnboundedSender<PlayerUpdate>,
    ) -> PlayerHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let task = Self {
            scheduler: Scheduler::new(config),
            backends,
            build: None,
            timer: None,
            cmd_rx,
            update_tx,
        };

        tokio::spawn(task.run());

        PlayerHandle { cmd_tx }
    }

    /// Main loop for the player
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        None | Some(PlayerCommand::Shutdown) => break,
                        Some(cmd) => self.handle(cmd),
                    }
                }
                (ticket, result) = build_done(&mut self.build) => {
                    self.build = None;
                    self.scheduler.finish_build(ticket, result);
                }
                epoch = timer_fired(&mut self.timer) => {
                    self.timer = None;
                    self.scheduler.on_timer(epoch);
                }
            }
            self.sync_timer();
            self.flush();
        }

        self.cancel_build();
        tracing::debug!("Player task stopped");
    }

    fn handle(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::Open { document } => {
                if self.scheduler.switch_document(&document) {
                    self.cancel_build();
                }
            }
            PlayerCommand::Build { source } => {
                self.cancel_build();
                let ticket = self.scheduler.begin_build();
                let backends = self.backends.clone();
                tracing::debug!(file = %source.name, "Starting build");
                let handle = tokio::spawn(async move { backends.trace(&source).await });
                self.build = Some((ticket, handle));
            }
            PlayerCommand::Play => {
                self.scheduler.play();
            }
            PlayerCommand::Pause => self.scheduler.pause(),
            PlayerCommand::Next { reply } => {
                let _ = reply.send(self.scheduler.next());
            }
            PlayerCommand::Prev { reply } => {
                let _ = reply.send(self.scheduler.prev());
            }
            PlayerCommand::Seek { progress, reply } => {
                let _ = reply.send(self.scheduler.seek(progress));
            }
            PlayerCommand::SetSpeed { speed } => self.scheduler.set_speed(speed),
            PlayerCommand::Reset => {
                self.cancel_build();
                self.scheduler.reset();
            }
            PlayerCommand::Resize {
                key,
                weights,
                reply,
            } => {
                let _ = reply.send(self.scheduler.resize(&key, weights));
            }
            PlayerCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            PlayerCommand::Shutdown => {}
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.scheduler.state(),
            cursor: self.scheduler.cursor(),
            chunk_count: self.scheduler.chunk_count(),
            line: self.scheduler.line_indicator(),
            speed: self.scheduler.speed(),
            root: self.scheduler.render_root(),
        }
    }

    fn cancel_build(&mut self) {
        if let Some((_, handle)) = self.build.take() {
            handle.abort();
        }
    }

    /// Match the armed sleep to the scheduler's current timer request.
    fn sync_timer(&mut self) {
        match self.scheduler.timer() {
            Some(request) => {
                let current = self.timer.as_ref().map(|(epoch, _)| *epoch);
                if current != Some(request.epoch) {
                    self.timer = Some((
                        request.epoch,
                        Box::pin(tokio::time::sleep(request.interval)),
                    ));
                }
            }
            None => self.timer = None,
        }
    }

    fn flush(&mut self) {
        for update in self.scheduler.drain_updates() {
            let _ = self.update_tx.send(update);
        }
    }
}

async fn build_done(
    slot: &mut Option<(BuildTicket, JoinHandle<BuildResult>)>,
) -> (BuildTicket, BuildResult) {
    match slot {
        Some((ticket, handle)) => {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(TraceError::Cancelled),
                Err(e) => Err(TraceError::build(format!("build task failed: {e}"))),
            };
            (*ticket, result)
        }
        None => pending().await,
    }
}

async fn timer_fired(slot: &mut Option<(u64, Pin<Box<Sleep>>)>) -> u64 {
    match slot {
        Some((epoch, sleep)) => {
            sleep.as_mut().await;
            *epoch
        }
        None => pending().await,
    }
}
