//! Weighted panel composition.
//!
//! A layout holds child keys, not objects. Children are resolved against the
//! registry at render time, so a layout may name keys that do not exist yet.

use crate::protocol::TraceError;
use crate::tracers::Args;

pub const LAYOUT: &str = "Layout";
pub const HORIZONTAL_LAYOUT: &str = "HorizontalLayout";
pub const VERTICAL_LAYOUT: &str = "VerticalLayout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Orientation for a layout constructor name, `None` if not a layout.
    pub fn from_constructor(name: &str) -> Option<Self> {
        match name {
            HORIZONTAL_LAYOUT => Some(Orientation::Horizontal),
            LAYOUT | VERTICAL_LAYOUT => Some(Orientation::Vertical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    key: String,
    orientation: Orientation,
    children: Vec<String>,
    weights: Vec<f64>,
}

impl Layout {
    pub fn new(key: &str, orientation: Orientation, children: Vec<String>) -> Self {
        let weights = vec![1.0; children.len()];
        Self {
            key: key.to_string(),
            orientation,
            children,
            weights,
        }
    }

    /// Build from constructor arguments `[childKeys[]]`.
    pub fn construct(
        key: &str,
        orientation: Orientation,
        args: Args<'_>,
    ) -> Result<Self, TraceError> {
        let children = match args.array(0)? {
            None => Vec::new(),
            Some(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        TraceError::argument(
                            args.method(),
                            format!("child key must be a string, got {item}"),
                        )
                    })
                })
                .collect::<Result<_, _>>()?,
        };
        Ok(Self::new(key, orientation, children))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Insert a child with weight 1. Positions past the end append.
    pub fn add(&mut self, key: &str, index: Option<usize>) {
        let index = index.unwrap_or(self.children.len()).min(self.children.len());
        self.children.insert(index, key.to_string());
        self.weights.insert(index, 1.0);
    }

    /// Remove the first child with `key`. Returns whether one was found.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.children.iter().position(|child| child == key) {
            Some(index) => {
                self.children.remove(index);
                self.weights.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn remove_all(&mut self) {
        self.children.clear();
        self.weights.clear();
    }

    /// Replace all weights at once, as a drag-resize does.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<(), TraceError> {
        if weights.len() != self.children.len() {
            return Err(TraceError::index(format!(
                "layout '{}' has {} children but {} weights were given",
                self.key,
                self.children.len(),
                weights.len()
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(TraceError::argument(
                "resize",
                format!("weights must be finite and non-negative, got {bad}"),
            ));
        }
        self.weights = weights;
        Ok(())
    }

    /// Display share of each child: `weight / Σ visible weights`, `None`
    /// for hidden children. Zero total weight splits evenly.
    pub fn shares(&self, shown: &[bool]) -> Vec<Option<f64>> {
        let total: f64 = self
            .weights
            .iter()
            .zip(shown)
            .filter(|(_, shown)| **shown)
            .map(|(w, _)| w)
            .sum();
        let count = shown.iter().filter(|s| **s).count() as f64;
        self.weights
            .iter()
            .zip(shown)
            .map(|(w, shown)| shown.then(|| if total > 0.0 { w / total } else { 1.0 / count }))
            .collect()
    }

    pub fn apply(&mut self, args: Args<'_>) -> Result<(), TraceError> {
        match args.method() {
            "add" => {
                let key = args.str(0)?;
                let index = args.opt_index(1)?;
                self.add(key, index);
            }
            "remove" => {
                self.remove(args.str(0)?);
            }
            "removeAll" => self.remove_all(),
            other => {
                return Err(TraceError::protocol(format!(
                    "Layout has no method '{other}'"
                )))
            }
        }
        Ok(())
    }
}
