//! Node/edge graph with remembered layout.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;

use crate::protocol::TraceError;
use crate::view::{format_value, EdgeView, GraphView, NodeView, View};

use super::args::is_truthy;
use super::placement::{self, Rect};
use super::{unknown_method, Args, Effect, Tracer, TracerBase, TracerKind};

/// Drawing geometry in unscaled units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimensions {
    pub base_width: f64,
    pub base_height: f64,
    pub padding: f64,
    pub node_radius: f64,
    pub arrow_gap: f64,
    pub node_weight_gap: f64,
    pub edge_weight_gap: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            base_width: 320.0,
            base_height: 320.0,
            padding: 32.0,
            node_radius: 12.0,
            arrow_gap: 4.0,
            node_weight_gap: 4.0,
            edge_weight_gap: 4.0,
        }
    }
}

impl Dimensions {
    /// Padded drawing rectangle centred on the origin.
    pub fn rect(&self) -> Rect {
        Rect {
            left: -self.base_width / 2.0 + self.padding,
            top: -self.base_height / 2.0 + self.padding,
            right: self.base_width / 2.0 - self.padding,
            bottom: self.base_height / 2.0 - self.padding,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub weight: Option<Value>,
    pub x: f64,
    pub y: f64,
    pub visited_count: i64,
    pub selected_count: i64,
}

impl Node {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            weight: None,
            x: 0.0,
            y: 0.0,
            visited_count: 0,
            selected_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: i64,
    pub target: i64,
    pub weight: Option<Value>,
    pub visited_count: i64,
    pub selected_count: i64,
}

impl Edge {
    pub fn new(source: i64, target: i64) -> Self {
        Self {
            source,
            target,
            weight: None,
            visited_count: 0,
            selected_count: 0,
        }
    }
}

/// The most recently requested placement, re-run after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMethod {
    Circle,
    Tree { root: i64, sorted: bool },
    Random,
}

#[derive(Debug, Clone)]
pub struct GraphTracer {
    base: TracerBase,
    dimensions: Dimensions,
    directed: bool,
    weighted: bool,
    layout: LayoutMethod,
    log: Option<String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    rng: StdRng,
}

/// Stable per-key seed so random layouts replay identically.
fn seed_for(key: &str) -> u64 {
    key.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

impl GraphTracer {
    pub fn new(base: TracerBase) -> Self {
        let rng = StdRng::seed_from_u64(seed_for(&base.key));
        Self {
            base,
            dimensions: Dimensions::default(),
            directed: true,
            weighted: false,
            layout: LayoutMethod::Circle,
            log: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            rng,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    pub fn layout_method(&self) -> LayoutMethod {
        self.layout
    }

    pub fn log_key(&self) -> Option<&str> {
        self.log.as_deref()
    }

    pub fn find_node(&self, id: i64) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_index(&self, id: i64) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Edge lookup; either orientation matches in undirected mode.
    pub fn find_edge(&self, source: i64, target: i64) -> Option<&Edge> {
        self.edge_index(source, target).map(|i| &self.edges[i])
    }

    fn edge_index(&self, source: i64, target: i64) -> Option<usize> {
        self.edges.iter().position(|e| {
            (e.source == source && e.target == target)
                || (!self.directed && e.source == target && e.target == source)
        })
    }

    fn run_layout(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let rect = self.dimensions.rect();
        match self.layout {
            LayoutMethod::Circle => placement::circle(&mut self.nodes, rect),
            LayoutMethod::Tree { root, sorted } => {
                placement::tree(&mut self.nodes, &self.edges, rect, root, sorted)
            }
            LayoutMethod::Random => placement::random(&mut self.nodes, rect, &mut self.rng),
        }
    }

    fn set_matrix(&mut self, args: Args<'_>) -> Result<(), TraceError> {
        self.nodes.clear();
        self.edges.clear();
        let rows = args.array(0)?.map(Vec::as_slice).unwrap_or(&[]);
        let n = rows.len();
        for (i, row) in rows.iter().enumerate() {
            let Value::Array(row) = row else {
                return Err(TraceError::argument(
                    args.method(),
                    format!("row {i} of the adjacency matrix must be an array"),
                ));
            };
            self.nodes.push(Node::new(i as i64));
            for (j, value) in row.iter().take(n).enumerate() {
                if !is_truthy(value) {
                    continue;
                }
                let (source, target) = (i as i64, j as i64);
                if self.edge_index(source, target).is_some() {
                    continue;
                }
                let mut edge = Edge::new(source, target);
                if self.weighted {
                    edge.weight = Some(value.clone());
                }
                self.edges.push(edge);
            }
        }
        self.run_layout();
        Ok(())
    }

    fn add_node(&mut self, args: Args<'_>) -> Result<(), TraceError> {
        let id = args.int(0)?;
        if self.node_index(id).is_some() {
            return Ok(());
        }
        self.nodes.push(Node {
            id,
            weight: args.get(1).cloned(),
            x: args.opt_f64(2)?.unwrap_or(0.0),
            y: args.opt_f64(3)?.unwrap_or(0.0),
            visited_count: args.opt_int(4)?.unwrap_or(0),
            selected_count: args.opt_int(5)?.unwrap_or(0),
        });
        self.run_layout();
        Ok(())
    }

    fn update_node(&mut self, args: Args<'_>) -> Result<(), TraceError> {
        let id = args.int(0)?;
        let index = self
            .node_index(id)
            .ok_or_else(|| TraceError::index(format!("updateNode: no node {id}")))?;
        let x = args.opt_f64(2)?;
        let y = args.opt_f64(3)?;
        let visited = args.opt_int(4)?;
        let selected = args.opt_int(5)?;
        let node = &mut self.nodes[index];
        if let Some(weight) = args.get(1) {
            node.weight = Some(weight.clone());
        }
        if let Some(x) = x {
            node.x = x;
        }
        if let Some(y) = y {
            node.y = y;
        }
        if let Some(count) = visited {
            node.visited_count = count;
        }
        if let Some(count) = selected {
            node.selected_count = count;
        }
        if x.is_none() && y.is_none() {
            self.run_layout();
        }
        Ok(())
    }

    fn add_edge(&mut self, args: Args<'_>) -> Result<(), TraceError> {
        let (source, target) = (args.int(0)?, args.int(1)?);
        if self.edge_index(source, target).is_some() {
            return Ok(());
        }
        self.edges.push(Edge {
            source,
            target,
            weight: args.get(2).cloned(),
            visited_count: args.opt_int(3)?.unwrap_or(0),
            selected_count: args.opt_int(4)?.unwrap_or(0),
        });
        self.run_layout();
        Ok(())
    }

    fn update_edge(&mut self, args: Args<'_>) -> Result<(), TraceError> {
        let (source, target) = (args.int(0)?, args.int(1)?);
        let index = self.edge_index(source, target).ok_or_else(|| {
            TraceError::index(format!("updateEdge: no edge {source} -> {target}"))
        })?;
        let visited = args.opt_int(3)?;
        let selected = args.opt_int(4)?;
        let edge = &mut self.edges[index];
        if let Some(weight) = args.get(2) {
            edge.weight = Some(weight.clone());
        }
        if let Some(count) = visited {
            edge.visited_count = count;
        }
        if let Some(count) = selected {
            edge.selected_count = count;
        }
        self.run_layout();
        Ok(())
    }

    /// Shared by visit/leave and select/deselect: adjusts the edge from
    /// `source` (when given) and the target node, then logs the transition.
    fn mark(
        &mut self,
        args: Args<'_>,
        arrow: &str,
        delta: i64,
        visiting: bool,
    ) -> Result<Vec<Effect>, TraceError> {
        let target = args.int(0)?;
        let source = args.opt_int(1)?;
        if let Some(index) = source.and_then(|s| self.edge_index(s, target)) {
            let edge = &mut self.edges[index];
            if visiting {
                edge.visited_count += delta;
            } else {
                edge.selected_count += delta;
            }
        }
        let weight = if visiting { args.get(2).cloned() } else { None };
        if let Some(index) = self.node_index(target) {
            let node = &mut self.nodes[index];
            if let Some(weight) = weight {
                node.weight = Some(weight);
            }
            if visiting {
                node.visited_count += delta;
            } else {
                node.selected_count += delta;
            }
        }
        Ok(self
            .log
            .iter()
            .map(|log| Effect::Println {
                target: log.clone(),
                // A source of 0 is printed; only an absent source is blank.
                line: format!(
                    "{} {arrow} {target}",
                    source.map(|s| s.to_string()).unwrap_or_default()
                ),
            })
            .collect())
    }
}

impl Tracer for GraphTracer {
    fn kind(&self) -> TracerKind {
        TracerKind::Graph
    }

    fn base(&self) -> &TracerBase {
        &self.base
    }

    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        match args.method() {
            "set" | "reset" => self.set_matrix(args)?,
            "directed" => self.directed = args.flag(0, true),
            "weighted" => self.weighted = args.flag(0, true),
            "addNode" => self.add_node(args)?,
            "updateNode" => self.update_node(args)?,
            "removeNode" => {
                let id = args.int(0)?;
                if let Some(index) = self.node_index(id) {
                    self.nodes.remove(index);
                    self.run_layout();
                }
            }
            "addEdge" => self.add_edge(args)?,
            "updateEdge" => self.update_edge(args)?,
            "removeEdge" => {
                let (source, target) = (args.int(0)?, args.int(1)?);
                if let Some(index) = self.edge_index(source, target) {
                    self.edges.remove(index);
                    self.run_layout();
                }
            }
            "layoutCircle" => {
                self.layout = LayoutMethod::Circle;
                self.run_layout();
            }
            "layoutTree" => {
                self.layout = LayoutMethod::Tree {
                    root: args.opt_int(0)?.unwrap_or(0),
                    sorted: args.flag(1, false),
                };
                self.run_layout();
            }
            "layoutRandom" => {
                self.layout = LayoutMethod::Random;
                self.run_layout();
            }
            "visit" => return self.mark(args, "->", 1, true),
            "leave" => return self.mark(args, "<-", -1, true),
            "select" => return self.mark(args, "=>", 1, false),
            "deselect" => return self.mark(args, "<=", -1, false),
            "log" => self.log = args.opt_key(0),
            other => return Err(unknown_method(TracerKind::Graph, other)),
        }
        Ok(Vec::new())
    }

    fn render(&self) -> View {
        View::Graph(GraphView {
            title: self.base.title.clone(),
            directed: self.directed,
            weighted: self.weighted,
            dimensions: self.dimensions.clone(),
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeView {
                    id: n.id,
                    weight: n.weight.as_ref().map(format_value),
                    x: n.x,
                    y: n.y,
                    visited_count: n.visited_count,
                    selected_count: n.selected_count,
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeView {
                    source: e.source,
                    target: e.target,
                    weight: e.weight.as_ref().map(format_value),
                    visited_count: e.visited_count,
                    selected_count: e.selected_count,
                })
                .collect(),
        })
    }

    fn clone_box(&self) -> Box<dyn Tracer> {
        Box::new(self.clone())
    }
}
