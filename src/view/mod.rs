//! Presentation model handed to renderers.
//!
//! Every tracer and layout renders into a [`View`]. Values are formatted
//! before they leave the core, so renderers only place strings and shapes.

pub mod format;

use serde::Serialize;

pub use format::{format_number, format_value, text_of};

use crate::tracers::graph::Dimensions;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum View {
    Array(ArrayView),
    Chart(ChartView),
    Scatter(ScatterView),
    Graph(GraphView),
    Log(TextView),
    Markdown(TextView),
    Layout(LayoutView),
}

impl View {
    pub fn title(&self) -> Option<&str> {
        match self {
            View::Array(v) => Some(&v.title),
            View::Chart(v) => Some(&v.title),
            View::Scatter(v) => Some(&v.title),
            View::Graph(v) => Some(&v.title),
            View::Log(v) | View::Markdown(v) => Some(&v.title),
            View::Layout(_) => None,
        }
    }
}

/// Highlight state of a cell, in rendering precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Normal,
    Selected,
    Patched,
}

impl CellState {
    pub fn of(selected: bool, patched: bool) -> Self {
        if patched {
            CellState::Patched
        } else if selected {
            CellState::Selected
        } else {
            CellState::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub text: String,
    pub selected: bool,
    pub patched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayView {
    pub title: String,
    /// Header indices, sized by the longest row.
    pub column_indices: Vec<usize>,
    /// Row index gutter. Absent for single-row arrays.
    pub row_indices: Option<Vec<usize>>,
    pub rows: Vec<Vec<CellView>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarView {
    pub label: String,
    pub value: Option<f64>,
    pub state: CellState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub title: String,
    pub bars: Vec<BarView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub color: String,
    pub radius: f64,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub title: String,
    pub series: Vec<SeriesView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: i64,
    pub weight: Option<String>,
    pub x: f64,
    pub y: f64,
    pub visited_count: i64,
    pub selected_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub source: i64,
    pub target: i64,
    pub weight: Option<String>,
    pub visited_count: i64,
    pub selected_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub title: String,
    pub directed: bool,
    pub weighted: bool,
    pub dimensions: Dimensions,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextView {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaneView {
    pub key: String,
    /// Fraction of the parent's extent, over visible siblings only.
    pub share: f64,
    pub view: View,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutView {
    pub key: String,
    pub horizontal: bool,
    pub panes: Vec<PaneView>,
}
