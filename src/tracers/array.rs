//! Array tracers and their chart/scatter presentations.

use serde_json::Value;

use crate::protocol::TraceError;
use crate::view::{format_value, BarView, CellState, ChartView, ScatterView, SeriesView, View};

use super::{unknown_method, Args, Effect, Grid, Tracer, TracerBase, TracerKind};

const SCATTER_COLORS: [&str; 6] = ["white", "green", "blue", "red", "yellow", "cyan"];

/// Two-dimensional cell array.
#[derive(Debug, Clone)]
pub struct Array2DTracer {
    base: TracerBase,
    grid: Grid,
}

impl Array2DTracer {
    pub fn new(base: TracerBase) -> Self {
        Self {
            base,
            grid: Grid::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Shared by [`ScatterTracer`], reporting errors under `kind`.
    fn apply_as(&mut self, kind: TracerKind, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        let grid = &mut self.grid;
        match args.method() {
            "set" => {
                *grid = match args.array(0)? {
                    Some(rows) => Grid::from_values(rows, args.method())?,
                    None => Grid::default(),
                };
            }
            "reset" => *grid = Grid::default(),
            "patch" => grid.patch(args.index(0)?, args.index(1)?, args.raw(2).cloned())?,
            "depatch" => grid.depatch(args.index(0)?, args.index(1)?)?,
            "select" | "deselect" => {
                let (sx, sy) = (args.index(0)?, args.index(1)?);
                let ex = args.opt_index(2)?.unwrap_or(sx);
                let ey = args.opt_index(3)?.unwrap_or(sy);
                grid.mark_selected((sx, sy), (ex, ey), args.method() == "select")?;
            }
            "selectRow" | "deselectRow" => {
                let (x, sy) = (args.index(0)?, args.index(1)?);
                let ey = args.opt_index(2)?.unwrap_or(sy);
                grid.mark_selected((x, sy), (x, ey), args.method() == "selectRow")?;
            }
            "selectCol" | "deselectCol" => {
                let (y, sx) = (args.index(0)?, args.index(1)?);
                let ex = args.opt_index(2)?.unwrap_or(sx);
                grid.mark_selected((sx, y), (ex, y), args.method() == "selectCol")?;
            }
            other => return Err(unknown_method(kind, other)),
        }
        Ok(Vec::new())
    }
}

impl Tracer for Array2DTracer {
    fn kind(&self) -> TracerKind {
        TracerKind::Array2D
    }

    fn base(&self) -> &TracerBase {
        &self.base
    }

    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        self.apply_as(TracerKind::Array2D, args)
    }

    fn render(&self) -> View {
        View::Array(self.grid.array_view(&self.base.title, true))
    }

    fn grid_mut(&mut self) -> Option<&mut Grid> {
        Some(&mut self.grid)
    }

    fn clone_box(&self) -> Box<dyn Tracer> {
        Box::new(self.clone())
    }
}

/// Single-row array addressed by column, optionally mirrored into a chart.
#[derive(Debug, Clone)]
pub struct Array1DTracer {
    base: TracerBase,
    grid: Grid,
    chart: Option<String>,
}

impl Array1DTracer {
    pub fn new(base: TracerBase) -> Self {
        Self {
            base,
            grid: Grid::single_row(&[]),
            chart: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn chart_key(&self) -> Option<&str> {
        self.chart.as_deref()
    }

    pub fn values(&self) -> Vec<Value> {
        self.grid
            .rows()
            .first()
            .map(|row| row.iter().map(|cell| cell.value.clone()).collect())
            .unwrap_or_default()
    }

    fn apply_as(&mut self, kind: TracerKind, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        match args.method() {
            "set" => {
                let values = args.array(0)?.map(Vec::as_slice).unwrap_or(&[]);
                self.grid = Grid::single_row(values);
            }
            "reset" => self.grid = Grid::single_row(&[]),
            "patch" => self.grid.patch(0, args.index(0)?, args.raw(1).cloned())?,
            "depatch" => self.grid.depatch(0, args.index(0)?)?,
            "select" | "deselect" => {
                let sx = args.index(0)?;
                let ex = args.opt_index(1)?.unwrap_or(sx);
                self.grid
                    .mark_selected((0, sx), (0, ex), args.method() == "select")?;
            }
            "chart" => self.chart = args.opt_key(0),
            other => return Err(unknown_method(kind, other)),
        }
        Ok(self.mirror())
    }

    fn mirror(&self) -> Vec<Effect> {
        match &self.chart {
            Some(target) if target != &self.base.key => vec![Effect::MirrorGrid {
                target: target.clone(),
                grid: self.grid.clone(),
            }],
            _ => Vec::new(),
        }
    }
}

impl Tracer for Array1DTracer {
    fn kind(&self) -> TracerKind {
        TracerKind::Array1D
    }

    fn base(&self) -> &TracerBase {
        &self.base
    }

    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        self.apply_as(TracerKind::Array1D, args)
    }

    fn render(&self) -> View {
        View::Array(self.grid.array_view(&self.base.title, false))
    }

    fn grid_mut(&mut self) -> Option<&mut Grid> {
        Some(&mut self.grid)
    }

    fn clone_box(&self) -> Box<dyn Tracer> {
        Box::new(self.clone())
    }
}

/// Bar chart over one row of values.
#[derive(Debug, Clone)]
pub struct ChartTracer {
    inner: Array1DTracer,
}

impl ChartTracer {
    pub fn new(base: TracerBase) -> Self {
        Self {
            inner: Array1DTracer::new(base),
        }
    }

    pub fn grid(&self) -> &Grid {
        self.inner.grid()
    }
}

impl Tracer for ChartTracer {
    fn kind(&self) -> TracerKind {
        TracerKind::Chart
    }

    fn base(&self) -> &TracerBase {
        self.inner.base()
    }

    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        self.inner.apply_as(TracerKind::Chart, args)
    }

    fn render(&self) -> View {
        let bars = self
            .inner
            .grid()
            .rows()
            .first()
            .map(|row| {
                row.iter()
                    .map(|cell| BarView {
                        label: format_value(&cell.value),
                        value: cell.value.as_f64(),
                        state: CellState::of(cell.selected, cell.patched),
                    })
                    .collect()
            })
            .unwrap_or_default();
        View::Chart(ChartView {
            title: self.title().to_string(),
            bars,
        })
    }

    fn grid_mut(&mut self) -> Option<&mut Grid> {
        self.inner.grid_mut()
    }

    fn clone_box(&self) -> Box<dyn Tracer> {
        Box::new(self.clone())
    }
}

/// Scatter plot where each row is a series of `[x, y]` points.
#[derive(Debug, Clone)]
pub struct ScatterTracer {
    inner: Array2DTracer,
}

impl ScatterTracer {
    pub fn new(base: TracerBase) -> Self {
        Self {
            inner: Array2DTracer::new(base),
        }
    }
}

fn point_of(value: &Value) -> Option<[f64; 2]> {
    match value.as_array()?.as_slice() {
        [x, y, ..] => Some([x.as_f64()?, y.as_f64()?]),
        _ => None,
    }
}

impl Tracer for ScatterTracer {
    fn kind(&self) -> TracerKind {
        TracerKind::Scatter
    }

    fn base(&self) -> &TracerBase {
        self.inner.base()
    }

    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        self.inner.apply_as(TracerKind::Scatter, args)
    }

    fn render(&self) -> View {
        let series = self
            .inner
            .grid()
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| SeriesView {
                color: SCATTER_COLORS[i % SCATTER_COLORS.len()].to_string(),
                radius: (i as f64 + 1.0) * 2.0,
                points: row.iter().filter_map(|cell| point_of(&cell.value)).collect(),
            })
            .collect();
        View::Scatter(ScatterView {
            title: self.title().to_string(),
            series,
        })
    }

    fn grid_mut(&mut self) -> Option<&mut Grid> {
        self.inner.grid_mut()
    }

    fn clone_box(&self) -> Box<dyn Tracer> {
        Box::new(self.clone())
    }
}
