//! Stateful visualization objects driven by trace commands.
//!
//! Each tracer type implements [`Tracer`]; the registry stores them as trait
//! objects and dispatches instance methods by name. Operations that touch a
//! second object (a graph logging its traversal, an array mirroring into a
//! chart) return [`Effect`]s which the registry routes to the target key.

pub mod args;
pub mod array;
pub mod graph;
pub mod grid;
pub mod log;
pub mod markdown;
pub mod placement;
pub mod printf;

use std::fmt;

use crate::protocol::TraceError;
use crate::view::View;

pub use args::Args;
pub use array::{Array1DTracer, Array2DTracer, ChartTracer, ScatterTracer};
pub use graph::GraphTracer;
pub use grid::{Cell, Grid};
pub use log::LogTracer;
pub use markdown::MarkdownTracer;

/// Constructible tracer types, named as they appear in constructor commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TracerKind {
    Array2D,
    Array1D,
    Graph,
    Log,
    Markdown,
    Chart,
    Scatter,
}

impl TracerKind {
    pub const ALL: [TracerKind; 7] = [
        TracerKind::Array2D,
        TracerKind::Array1D,
        TracerKind::Graph,
        TracerKind::Log,
        TracerKind::Markdown,
        TracerKind::Chart,
        TracerKind::Scatter,
    ];

    pub fn constructor_name(&self) -> &'static str {
        match self {
            TracerKind::Array2D => "Array2DTracer",
            TracerKind::Array1D => "Array1DTracer",
            TracerKind::Graph => "GraphTracer",
            TracerKind::Log => "LogTracer",
            TracerKind::Markdown => "MarkdownTracer",
            TracerKind::Chart => "ChartTracer",
            TracerKind::Scatter => "ScatterTracer",
        }
    }

    pub fn from_constructor(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.constructor_name() == name)
    }

    /// Create a fresh instance in its initial state.
    pub fn construct(&self, key: &str, title: &str) -> Box<dyn Tracer> {
        let base = TracerBase::new(key, title);
        match self {
            TracerKind::Array2D => Box::new(Array2DTracer::new(base)),
            TracerKind::Array1D => Box::new(Array1DTracer::new(base)),
            TracerKind::Graph => Box::new(GraphTracer::new(base)),
            TracerKind::Log => Box::new(LogTracer::new(base)),
            TracerKind::Markdown => Box::new(MarkdownTracer::new(base)),
            TracerKind::Chart => Box::new(ChartTracer::new(base)),
            TracerKind::Scatter => Box::new(ScatterTracer::new(base)),
        }
    }
}

impl fmt::Display for TracerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constructor_name())
    }
}

/// Identity shared by every tracer.
#[derive(Debug, Clone, PartialEq)]
pub struct TracerBase {
    pub key: String,
    pub title: String,
}

impl TracerBase {
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
        }
    }
}

/// Cross-object side effects produced while applying a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a line to the log tracer at `target`.
    Println { target: String, line: String },
    /// Replace the grid of the array-family tracer at `target`.
    MirrorGrid { target: String, grid: Grid },
}

pub trait Tracer: fmt::Debug + Send + Sync {
    fn kind(&self) -> TracerKind;

    fn base(&self) -> &TracerBase;

    fn key(&self) -> &str {
        &self.base().key
    }

    fn title(&self) -> &str {
        &self.base().title
    }

    /// Apply an instance method by name.
    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError>;

    /// Presentation state with all values formatted.
    fn render(&self) -> View;

    /// Grid storage, for tracers that can receive mirrored data.
    fn grid_mut(&mut self) -> Option<&mut Grid> {
        None
    }

    /// Append to the text buffer, for tracers that can receive log lines.
    fn append_text(&mut self, _text: &str) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn Tracer>;
}

impl Clone for Box<dyn Tracer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub(crate) fn unknown_method(kind: TracerKind, method: &str) -> TraceError {
    TraceError::protocol(format!("{kind} has no method '{method}'"))
}
