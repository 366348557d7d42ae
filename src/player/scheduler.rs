//! Playback state machine.
//!
//! The scheduler owns the replay engine and decides what happens on each
//! user action, build completion and timer tick. It never sleeps or spawns:
//! it hands out [`BuildTicket`]s and [`TimerRequest`]s and the driving task
//! reports back with the same ticket or epoch. Stale tickets and epochs are
//! ignored, so at most one build and one timer are ever live.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{clamp_speed, PlaybackConfig};
use crate::protocol::{chunk_commands, Chunk, Command, TraceError};
use crate::replay::{ApplyReport, ChunkFailure, ReplayEngine};
use crate::view::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Building,
    Paused,
    Playing,
}

/// Identifies one build request. Only the latest ticket is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildTicket(u64);

/// A single-shot timer the driver should arm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerRequest {
    pub epoch: u64,
    pub interval: Duration,
}

/// Changes reported to the presentation side
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerUpdate {
    State(PlayerState),
    Cursor {
        cursor: usize,
        chunk_count: usize,
        line: Option<u32>,
    },
    /// User-visible failure message
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub base_interval: Duration,
    pub speed: f64,
    pub checkpoint_interval: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for PlayerConfig {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            base_interval: config.base_interval,
            speed: clamp_speed(config.speed),
            checkpoint_interval: config.checkpoint_interval,
        }
    }
}

#[derive(Debug)]
pub struct Scheduler {
    engine: ReplayEngine,
    state: PlayerState,
    base_interval: Duration,
    speed: f64,
    build_generation: u64,
    timer_epoch: u64,
    timer_armed: bool,
    document: Option<String>,
    updates: Vec<PlayerUpdate>,
}

impl Scheduler {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            engine: ReplayEngine::new(config.checkpoint_interval),
            state: PlayerState::Idle,
            base_interval: config.base_interval,
            speed: clamp_speed(config.speed),
            build_generation: 0,
            timer_epoch: 0,
            timer_armed: false,
            document: None,
            updates: Vec::new(),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    pub fn cursor(&self) -> usize {
        self.engine.cursor()
    }

    pub fn chunk_count(&self) -> usize {
        self.engine.chunk_count()
    }

    pub fn line_indicator(&self) -> Option<u32> {
        self.engine.line_indicator()
    }

    pub fn render_root(&self) -> Option<View> {
        self.engine.render_root()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Delay between automatic steps: `base / e^speed`.
    pub fn interval(&self) -> Duration {
        self.base_interval.div_f64(self.speed.exp())
    }

    /// The timer the driver should currently have armed, if any.
    pub fn timer(&self) -> Option<TimerRequest> {
        self.timer_armed.then(|| TimerRequest {
            epoch: self.timer_epoch,
            interval: self.interval(),
        })
    }

    pub fn is_current(&self, ticket: BuildTicket) -> bool {
        ticket.0 == self.build_generation
    }

    /// Take the updates produced since the last drain.
    pub fn drain_updates(&mut self) -> Vec<PlayerUpdate> {
        std::mem::take(&mut self.updates)
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = clamp_speed(speed);
        if self.timer_armed {
            self.arm_timer();
        }
    }

    /// Start a new build, superseding any in flight.
    pub fn begin_build(&mut self) -> BuildTicket {
        self.build_generation += 1;
        self.disarm_timer();
        self.load(Vec::new());
        self.set_state(PlayerState::Building);
        BuildTicket(self.build_generation)
    }

    /// Accept the result for `ticket`. Returns false if the ticket was stale.
    pub fn finish_build(
        &mut self,
        ticket: BuildTicket,
        result: Result<Vec<Command>, TraceError>,
    ) -> bool {
        if !self.is_current(ticket) || self.state != PlayerState::Building {
            debug!(ticket = ticket.0, "Discarding stale build result");
            return false;
        }
        match result {
            Ok(commands) => {
                let chunks = chunk_commands(commands);
                info!(chunks = chunks.len(), "Build finished");
                self.load(chunks);
                self.set_state(PlayerState::Paused);
                self.move_engine(1, false);
            }
            Err(error) if error.is_silent() => {
                debug!("Build cancelled");
                self.set_state(PlayerState::Idle);
            }
            Err(error) => {
                warn!(error = %error, "Build failed");
                self.updates.push(PlayerUpdate::Error(error.to_string()));
                self.set_state(PlayerState::Idle);
            }
        }
        true
    }

    /// Start automatic stepping. Restarts from the first step when at the end.
    pub fn play(&mut self) -> bool {
        if self.state == PlayerState::Building || self.chunk_count() == 0 {
            return false;
        }
        if self.cursor() >= self.chunk_count() {
            self.move_engine(1, true);
        }
        self.set_state(PlayerState::Playing);
        self.arm_timer();
        true
    }

    pub fn pause(&mut self) {
        self.disarm_timer();
        if self.state == PlayerState::Playing {
            self.set_state(PlayerState::Paused);
        }
    }

    pub fn next(&mut self) -> bool {
        self.pause();
        self.step_to(self.cursor() + 1)
    }

    pub fn prev(&mut self) -> bool {
        self.pause();
        match self.cursor().checked_sub(1) {
            Some(target) => self.step_to(target),
            None => false,
        }
    }

    /// Jump to a fraction of the way through the stream.
    pub fn seek(&mut self, progress: f64) -> bool {
        self.pause();
        let count = self.chunk_count();
        if count == 0 || self.state == PlayerState::Building {
            return false;
        }
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let target = ((progress * count as f64).round() as usize).clamp(1, count);
        self.move_engine(target, true)
    }

    /// Handle a fired timer. Returns whether a step was taken.
    pub fn on_timer(&mut self, epoch: u64) -> bool {
        if !self.timer_armed || epoch != self.timer_epoch || self.state != PlayerState::Playing {
            debug!(epoch, "Ignoring stale timer");
            return false;
        }
        self.timer_armed = false;
        let target = self.cursor() + 1;
        if target > self.chunk_count() {
            self.set_state(PlayerState::Paused);
            return false;
        }
        self.move_engine(target, false);
        self.arm_timer();
        true
    }

    /// Cancel everything and drop the loaded stream.
    pub fn reset(&mut self) {
        self.build_generation += 1;
        self.disarm_timer();
        self.load(Vec::new());
        self.set_state(PlayerState::Idle);
    }

    /// Reset when `document` differs from the open one.
    pub fn switch_document(&mut self, document: &str) -> bool {
        if self.document.as_deref() == Some(document) {
            return false;
        }
        self.document = Some(document.to_string());
        self.reset();
        true
    }

    pub fn resize(&mut self, key: &str, weights: Vec<f64>) -> Result<(), TraceError> {
        self.engine.resize(key, weights)
    }

    /// Valid cursor positions are `1..=chunk_count`.
    fn step_to(&mut self, target: usize) -> bool {
        if self.state == PlayerState::Building || target == 0 || target > self.chunk_count() {
            return false;
        }
        self.move_engine(target, false)
    }

    fn move_engine(&mut self, target: usize, rebuild: bool) -> bool {
        let result = if rebuild {
            self.engine.seek(target)
        } else {
            self.engine.move_to(target)
        };
        match result {
            Ok(report) => {
                self.report(report);
                self.push_cursor();
                true
            }
            Err(error) => {
                debug!(target, error = %error, "Cursor move rejected");
                false
            }
        }
    }

    fn report(&mut self, report: ApplyReport) {
        for failure in report.failures {
            self.updates.push(PlayerUpdate::Error(failure_message(&failure)));
        }
    }

    fn load(&mut self, chunks: Vec<Chunk>) {
        self.engine.load(chunks);
        self.push_cursor();
    }

    fn push_cursor(&mut self) {
        self.updates.push(PlayerUpdate::Cursor {
            cursor: self.cursor(),
            chunk_count: self.chunk_count(),
            line: self.line_indicator(),
        });
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            self.state = state;
            self.updates.push(PlayerUpdate::State(state));
        }
    }

    fn arm_timer(&mut self) {
        self.timer_epoch += 1;
        self.timer_armed = true;
    }

    fn disarm_timer(&mut self) {
        self.timer_armed = false;
    }
}

fn failure_message(failure: &ChunkFailure) -> String {
    match &failure.key {
        Some(key) => format!("{} on '{}': {}", failure.method, key, failure.error),
        None => format!("{}: {}", failure.method, failure.error),
    }
}
