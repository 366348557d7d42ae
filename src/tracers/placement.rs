//! Node placement algorithms for the graph tracer.
//!
//! All coordinates are relative to a drawing rectangle centred on the origin.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use rand::Rng;

use super::graph::{Edge, Node};

/// Minimum distance kept between randomly placed nodes.
pub const MIN_SEPARATION: f64 = 48.0;
/// Resampling budget per node before accepting a crowded position.
const MAX_RANDOM_ATTEMPTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

pub fn distance(a: &Node, b: &Node) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Evenly around the inscribed ellipse, clockwise from the top.
pub fn circle(nodes: &mut [Node], rect: Rect) {
    let unit_angle = 2.0 * PI / nodes.len() as f64;
    let mut angle = -PI / 2.0;
    for node in nodes.iter_mut() {
        node.x = angle.cos() * rect.width() / 2.0;
        node.y = angle.sin() * rect.height() / 2.0;
        angle += unit_angle;
    }
}

/// Neighbour ids of every node ignoring edge direction, in edge order.
fn adjacency(edges: &[Edge]) -> HashMap<i64, Vec<i64>> {
    let mut linked: HashMap<i64, Vec<i64>> = HashMap::new();
    for edge in edges {
        linked.entry(edge.source).or_default().push(edge.target);
        if edge.target != edge.source {
            linked.entry(edge.target).or_default().push(edge.source);
        }
    }
    linked
}

fn linked_ids(adjacency: &HashMap<i64, Vec<i64>>, id: i64) -> Vec<i64> {
    adjacency.get(&id).cloned().unwrap_or_default()
}

/// Layered tree rooted at `root`. Horizontal bands are split by leaf count,
/// depth sets the row. Nodes unreachable from the root keep their position.
pub fn tree(nodes: &mut [Node], edges: &[Edge], rect: Rect, root: i64, sorted: bool) {
    if let [only] = nodes {
        (only.x, only.y) = rect.center();
        return;
    }

    let linked = adjacency(edges);
    let (leaf_counts, max_depth) = count_leaves(&linked, root);

    let root_leaves = leaf_counts.get(&root).copied().unwrap_or(1);
    let h_gap = rect.width() / f64::from(root_leaves);
    let v_gap = if max_depth == 0 {
        0.0
    } else {
        rect.height() / f64::from(max_depth)
    };

    let index_of: HashMap<i64, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id, i))
        .collect();
    if !index_of.contains_key(&root) {
        return;
    }

    let bands = Bands {
        rect,
        h_gap,
        v_gap,
        max_depth,
        leaf_counts: &leaf_counts,
        index_of: &index_of,
        adjacency: &linked,
        sorted,
    };
    bands.place(nodes, root);
}

/// Depth-first walk state for one node. Traversal uses an explicit stack so
/// long chains cannot exhaust the call stack.
struct Visit<T> {
    depth: u32,
    linked: Vec<i64>,
    next: usize,
    acc: T,
}

impl<T> Visit<T> {
    fn new(depth: u32, linked: Vec<i64>, acc: T) -> Self {
        Self {
            depth,
            linked,
            next: 0,
            acc,
        }
    }
}

struct Bands<'a> {
    rect: Rect,
    h_gap: f64,
    v_gap: f64,
    max_depth: u32,
    leaf_counts: &'a HashMap<i64, u32>,
    index_of: &'a HashMap<i64, usize>,
    adjacency: &'a HashMap<i64, Vec<i64>>,
    sorted: bool,
}

impl Bands<'_> {
    fn leaves(&self, id: i64) -> f64 {
        f64::from(self.leaf_counts.get(&id).copied().unwrap_or(1))
    }

    /// Position `id` at band offset `h` and collect its neighbours.
    fn enter(&self, nodes: &mut [Node], id: i64, h: f64, depth: u32) -> Visit<f64> {
        let Some(&index) = self.index_of.get(&id) else {
            return Visit::new(depth, Vec::new(), h);
        };
        nodes[index].x = self.rect.left + (h + self.leaves(id) / 2.0) * self.h_gap;
        nodes[index].y = if self.max_depth == 0 {
            self.rect.center().1
        } else {
            self.rect.top + f64::from(depth) * self.v_gap
        };

        let mut children: Vec<i64> = linked_ids(self.adjacency, id)
            .into_iter()
            .filter(|child| self.index_of.contains_key(child))
            .collect();
        if self.sorted {
            children.sort_unstable();
        }
        Visit::new(depth, children, h)
    }

    fn place(&self, nodes: &mut [Node], root: i64) {
        let mut marked = HashSet::from([root]);
        let mut stack = vec![self.enter(nodes, root, 0.0, 0)];
        while let Some(visit) = stack.last_mut() {
            let Some(child) = visit.linked.get(visit.next).copied() else {
                stack.pop();
                continue;
            };
            visit.next += 1;
            if !marked.insert(child) {
                continue;
            }
            // The child's band starts where the previous sibling's ended.
            let (h, depth) = (visit.acc, visit.depth + 1);
            visit.acc += self.leaves(child);
            stack.push(self.enter(nodes, child, h, depth));
        }
    }
}

/// Leaf count of every node reachable from `root`, and the deepest level.
fn count_leaves(adjacency: &HashMap<i64, Vec<i64>>, root: i64) -> (HashMap<i64, u32>, u32) {
    let mut leaf_counts = HashMap::new();
    let mut max_depth = 0;
    let mut marked = HashSet::from([root]);
    let mut stack = vec![(root, Visit::new(0, linked_ids(adjacency, root), 0u32))];
    while let Some((id, visit)) = stack.last_mut() {
        match visit.linked.get(visit.next).copied() {
            Some(linked) => {
                visit.next += 1;
                let depth = visit.depth + 1;
                if marked.insert(linked) {
                    max_depth = max_depth.max(depth);
                    stack.push((linked, Visit::new(depth, linked_ids(adjacency, linked), 0)));
                }
            }
            None => {
                let (id, leaves) = (*id, visit.acc.max(1));
                stack.pop();
                leaf_counts.insert(id, leaves);
                if let Some((_, parent)) = stack.last_mut() {
                    parent.acc += leaves;
                }
            }
        }
    }
    (leaf_counts, max_depth)
}

/// Uniformly random positions, resampled while closer than
/// [`MIN_SEPARATION`] to any node already placed.
pub fn random<R: Rng>(nodes: &mut [Node], rect: Rect, rng: &mut R) {
    for i in 0..nodes.len() {
        let (placed, rest) = nodes.split_at_mut(i);
        let node = &mut rest[0];
        for _ in 0..MAX_RANDOM_ATTEMPTS {
            node.x = rect.left + rng.random::<f64>() * rect.width();
            node.y = rect.top + rng.random::<f64>() * rect.height();
            if placed.iter().all(|other| distance(node, other) >= MIN_SEPARATION) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rect() -> Rect {
        Rect {
            left: -128.0,
            top: -128.0,
            right: 128.0,
            bottom: 128.0,
        }
    }

    fn nodes(n: i64) -> Vec<Node> {
        (0..n).map(Node::new).collect()
    }

    fn edge(source: i64, target: i64) -> Edge {
        Edge::new(source, target)
    }

    #[test]
    fn circle_starts_at_top_and_spaces_evenly() {
        let mut ns = nodes(5);
        circle(&mut ns, rect());
        assert!((ns[0].x - 0.0).abs() < 1e-9);
        assert!((ns[0].y + 128.0).abs() < 1e-9);
        let step = 2.0 * PI / 5.0;
        for (i, node) in ns.iter().enumerate() {
            let expected = -PI / 2.0 + step * i as f64;
            assert!((node.x - expected.cos() * 128.0).abs() < 1e-9);
            assert!((node.y - expected.sin() * 128.0).abs() < 1e-9);
        }
    }

    #[test]
    fn tree_centers_single_node() {
        let mut ns = nodes(1);
        tree(&mut ns, &[], rect(), 0, false);
        assert_eq!((ns[0].x, ns[0].y), (0.0, 0.0));
    }

    #[test]
    fn tree_splits_bands_by_leaf_count() {
        // 0 -> {1, 2}, 1 -> {3, 4}: three leaves, depth 2.
        let mut ns = nodes(5);
        let es = vec![edge(0, 1), edge(0, 2), edge(1, 3), edge(1, 4)];
        tree(&mut ns, &es, rect(), 0, false);
        let h_gap = 256.0 / 3.0;
        let v_gap = 256.0 / 2.0;
        assert!((ns[0].x - (-128.0 + 1.5 * h_gap)).abs() < 1e-9);
        assert_eq!(ns[0].y, -128.0);
        assert!((ns[1].x - (-128.0 + 1.0 * h_gap)).abs() < 1e-9);
        assert_eq!(ns[1].y, -128.0 + v_gap);
        assert!((ns[3].x - (-128.0 + 0.5 * h_gap)).abs() < 1e-9);
        assert!((ns[4].x - (-128.0 + 1.5 * h_gap)).abs() < 1e-9);
        assert!((ns[2].x - (-128.0 + 2.5 * h_gap)).abs() < 1e-9);
        assert_eq!(ns[3].y, 128.0);
    }

    #[test]
    fn tree_sorted_orders_siblings_by_id() {
        let mut unsorted = nodes(3);
        let es = vec![edge(0, 2), edge(0, 1)];
        tree(&mut unsorted, &es, rect(), 0, false);
        assert!(unsorted[2].x < unsorted[1].x);

        let mut sorted = nodes(3);
        tree(&mut sorted, &es, rect(), 0, true);
        assert!(sorted[1].x < sorted[2].x);
    }

    #[test]
    fn tree_leaves_unreachable_nodes_alone() {
        let mut ns = nodes(3);
        ns[2].x = 7.0;
        ns[2].y = 9.0;
        tree(&mut ns, &[edge(0, 1)], rect(), 0, false);
        assert_eq!((ns[2].x, ns[2].y), (7.0, 9.0));
    }

    #[test]
    fn tree_handles_long_chains() {
        let n = 100_000;
        let mut ns = nodes(n);
        let es: Vec<Edge> = (1..n).map(|i| edge(i - 1, i)).collect();
        let (leaf_counts, max_depth) = count_leaves(&adjacency(&es), 0);
        assert_eq!(max_depth, (n - 1) as u32);
        assert_eq!(leaf_counts[&0], 1);

        tree(&mut ns, &es, rect(), 0, false);
        assert_eq!(ns[0].y, -128.0);
        assert!((ns[n as usize - 1].y - 128.0).abs() < 1e-6);
        assert!(ns.iter().all(|node| node.x == 0.0));
        assert!(ns.windows(2).all(|pair| pair[0].y < pair[1].y));
    }

    #[test]
    fn random_respects_min_separation() {
        let mut ns = nodes(8);
        let mut rng = StdRng::seed_from_u64(7);
        random(&mut ns, rect(), &mut rng);
        for (i, a) in ns.iter().enumerate() {
            assert!(a.x >= -128.0 && a.x <= 128.0);
            for b in &ns[..i] {
                assert!(distance(a, b) >= MIN_SEPARATION);
            }
        }
    }
}
