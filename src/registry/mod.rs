//! Keyed store of live tracers and layouts.
//!
//! Commands address objects by key. Constructor commands create (or replace)
//! the object under their key, `destroy` removes it and any other method is
//! dispatched to the existing object. Cross-object effects returned by
//! tracers are routed here, and keys that are missing at that point are
//! skipped, so objects may reference keys created later.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;

use crate::layout::{Layout, Orientation};
use crate::protocol::{Command, TraceError, DELAY, DESTROY, SET_ROOT};
use crate::tracers::{Args, Effect, Tracer, TracerKind};
use crate::view::{LayoutView, PaneView, View};

#[derive(Debug, Clone)]
pub enum Entry {
    Tracer(Box<dyn Tracer>),
    Layout(Layout),
}

impl Entry {
    pub fn as_tracer(&self) -> Option<&dyn Tracer> {
        match self {
            Entry::Tracer(tracer) => Some(tracer.as_ref()),
            Entry::Layout(_) => None,
        }
    }

    pub fn as_layout(&self) -> Option<&Layout> {
        match self {
            Entry::Layout(layout) => Some(layout),
            Entry::Tracer(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    entries: HashMap<String, Entry>,
    root: Option<String>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, entry: Entry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn delete(&mut self, key: &str) -> Option<Entry> {
        self.entries.remove(key)
    }

    /// Drop every entry and the root designation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.root = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Key named by the last `setRoot`, whether or not it exists.
    pub fn root_key(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn tracer(&self, key: &str) -> Option<&dyn Tracer> {
        self.get(key).and_then(Entry::as_tracer)
    }

    pub fn layout(&self, key: &str) -> Option<&Layout> {
        self.get(key).and_then(Entry::as_layout)
    }

    /// Apply one command.
    pub fn apply(&mut self, command: &Command) -> Result<(), TraceError> {
        let method = command.method.as_str();
        let args = Args::new(method, &command.args);
        let Some(key) = command.key.as_deref() else {
            return self.apply_global(args);
        };
        trace!(key, method, "Applying command");

        if method == DESTROY {
            self.entries.remove(key);
            return Ok(());
        }
        if let Some(orientation) = Orientation::from_constructor(method) {
            let layout = Layout::construct(key, orientation, args)?;
            self.entries.insert(key.to_string(), Entry::Layout(layout));
            return Ok(());
        }
        if let Some(kind) = TracerKind::from_constructor(method) {
            let title = args.get(0).and_then(|v| v.as_str()).unwrap_or(method);
            self.entries
                .insert(key.to_string(), Entry::Tracer(kind.construct(key, title)));
            return Ok(());
        }

        let effects = match self.entries.get_mut(key) {
            Some(Entry::Tracer(tracer)) => tracer.apply(args)?,
            Some(Entry::Layout(layout)) => {
                layout.apply(args)?;
                Vec::new()
            }
            None => {
                return Err(TraceError::protocol(format!(
                    "'{method}' is not a constructor and no object has key '{key}'"
                )))
            }
        };
        for effect in effects {
            self.route(effect);
        }
        Ok(())
    }

    fn apply_global(&mut self, args: Args<'_>) -> Result<(), TraceError> {
        match args.method() {
            SET_ROOT => {
                let key = args.str(0)?;
                self.root = Some(key.to_string());
                Ok(())
            }
            DELAY => Ok(()),
            // Nothing is addressed, so there is nothing to drop.
            DESTROY => Ok(()),
            other => Err(TraceError::protocol(format!(
                "'{other}' is not a global operation"
            ))),
        }
    }

    fn route(&mut self, effect: Effect) {
        match effect {
            Effect::Println { target, line } => {
                if let Some(Entry::Tracer(tracer)) = self.entries.get_mut(&target) {
                    tracer.append_text(&format!("{line}\n"));
                }
            }
            Effect::MirrorGrid { target, grid } => {
                if let Some(slot) = self
                    .entries
                    .get_mut(&target)
                    .and_then(|entry| match entry {
                        Entry::Tracer(tracer) => tracer.grid_mut(),
                        Entry::Layout(_) => None,
                    })
                {
                    *slot = grid;
                }
            }
        }
    }

    /// Replace the weights of the layout at `key`.
    pub fn resize(&mut self, key: &str, weights: Vec<f64>) -> Result<(), TraceError> {
        match self.entries.get_mut(key) {
            Some(Entry::Layout(layout)) => layout.set_weights(weights),
            Some(Entry::Tracer(_)) => Err(TraceError::protocol(format!(
                "'{key}' is a tracer, not a layout"
            ))),
            None => Err(TraceError::index(format!("no layout with key '{key}'"))),
        }
    }

    /// View of the current root, `None` when unset or unresolved.
    pub fn render_root(&self) -> Option<View> {
        let root = self.root.as_deref()?;
        self.render(root)
    }

    pub fn render(&self, key: &str) -> Option<View> {
        let mut visiting = HashSet::new();
        self.render_entry(key, &mut visiting)
    }

    fn render_entry(&self, key: &str, visiting: &mut HashSet<String>) -> Option<View> {
        match self.entries.get(key)? {
            Entry::Tracer(tracer) => Some(tracer.render()),
            Entry::Layout(layout) => {
                // A layout reachable from itself renders once.
                if !visiting.insert(key.to_string()) {
                    return None;
                }
                let views: Vec<Option<View>> = layout
                    .children()
                    .iter()
                    .map(|child| self.render_entry(child, visiting))
                    .collect();
                visiting.remove(key);

                let shown: Vec<bool> = views.iter().map(Option::is_some).collect();
                let panes = layout
                    .children()
                    .iter()
                    .zip(views)
                    .zip(layout.shares(&shown))
                    .filter_map(|((child, view), share)| {
                        Some(PaneView {
                            key: child.clone(),
                            share: share?,
                            view: view?,
                        })
                    })
                    .collect();
                Some(View::Layout(LayoutView {
                    key: key.to_string(),
                    horizontal: layout.is_horizontal(),
                    panes,
                }))
            }
        }
    }

    /// Every entry rendered standalone, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, View> {
        self.entries
            .keys()
            .filter_map(|key| Some((key.clone(), self.render(key)?)))
            .collect()
    }
}
