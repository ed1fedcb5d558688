//! Dynamic vantage-point tree.
//!
//! ## Layout
//!
//! Every stored point is the vantage point of exactly one tree node. A node
//! keeps up to `arity` children sorted by strictly increasing distance bounds
//! `b_0 < b_1 < ...`, and child `i` holds exactly the points `x` of the
//! subtree with `b_{i-1} < distance(vantage, x) <= b_i` (`b_{-1} = -inf`).
//! With arity 2 this is the classic inside/outside split around one radius.
//!
//! ## Insertion
//!
//! A new point walks down from the root and enters the first child whose
//! bound covers it. Past the last bound it becomes a new child if the node
//! has room; otherwise the last bound grows to cover it. The layout above
//! holds after every insertion.
//!
//! ## Rebalancing
//!
//! Scapegoat style. When a new leaf lands deeper than `log_{1/α}(len) + 1`,
//! the lowest ancestor whose heaviest child holds more than `α` of its
//! subtree is rebuilt with median splits. A rebuilt subtree is left alone
//! until it has grown by half again: points tied at one distance cannot be
//! split, and without that rule they would trigger a rebuild on every insert.

use std::collections::BinaryHeap;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::chooser::{self, VpChooser};
use super::{Neighbor, Ranking};
use crate::config::DvpConfig;
use crate::model::VertexId;
use crate::topology::MetricSpace;
use crate::{Error, Result};

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeIdx(u32);

impl NodeIdx {
    const DETACHED: NodeIdx = NodeIdx(u32::MAX);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Child {
    node: NodeIdx,
    bound: f64,
}

#[derive(Debug)]
struct TreeNode {
    key: VertexId,
    parent: Option<NodeIdx>,
    children: SmallVec<[Child; 4]>,
    /// Points in this subtree, the vantage point included.
    size: usize,
    /// `size` when this subtree was last rebuilt, 0 if never.
    built_size: usize,
}

struct Entry<P, V> {
    point: P,
    payload: V,
    node: NodeIdx,
}

/// Metric-space index owning a point and a payload per entry.
///
/// Entry handles are stable across rebuilds: the tree relocates its nodes,
/// never its entries.
pub struct DvpTree<S: MetricSpace, V> {
    space: S,
    arity: usize,
    balance_factor: f64,
    chooser: Box<dyn VpChooser>,
    entries: Vec<Option<Entry<S::Point, V>>>,
    free_entries: Vec<VertexId>,
    nodes: Vec<Option<TreeNode>>,
    free_nodes: Vec<NodeIdx>,
    root: Option<NodeIdx>,
    len: usize,
    rebuilds: usize,
}

impl<S: MetricSpace, V> DvpTree<S, V> {
    pub fn new(space: S, config: &DvpConfig) -> Result<Self> {
        Self::with_chooser(space, config, chooser::from_config(config))
    }

    /// Like [`DvpTree::new`] with a caller-supplied vantage-point policy.
    pub fn with_chooser(space: S, config: &DvpConfig, chooser: Box<dyn VpChooser>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            space,
            arity: config.arity,
            balance_factor: config.balance_factor,
            chooser,
            entries: Vec::new(),
            free_entries: Vec::new(),
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            root: None,
            len: 0,
            rebuilds: 0,
        })
    }

    pub fn space(&self) -> &S {
        &self.space
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Subtree rebuilds performed so far, explicit ones included.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.entry(id).is_some()
    }

    pub fn get(&self, id: VertexId) -> Option<&V> {
        self.entry(id).map(|e| &e.payload)
    }

    pub fn get_mut(&mut self, id: VertexId) -> Option<&mut V> {
        self.entries.get_mut(id.index()).and_then(Option::as_mut).map(|e| &mut e.payload)
    }

    pub fn point(&self, id: VertexId) -> Option<&S::Point> {
        self.entry(id).map(|e| &e.point)
    }

    /// Live entries in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &S::Point, &V)> + '_ {
        self.entries.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().map(|e| (VertexId(i as u32), &e.point, &e.payload))
        })
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add a point. O(log N) amortized.
    ///
    /// # Panics
    ///
    /// If the tree has handed out all `u32::MAX` entry handles and none has
    /// been freed by [`DvpTree::remove`].
    pub fn insert(&mut self, point: S::Point, payload: V) -> VertexId {
        let id = self.alloc_entry(point, payload);
        self.len += 1;
        self.place(id);
        id
    }

    /// Remove an entry, handing back its point and payload.
    ///
    /// A leaf is simply detached. An inner node's descendants are rebuilt
    /// into the slot it occupied, which they all still fit.
    pub fn remove(&mut self, id: VertexId) -> Option<(S::Point, V)> {
        let idx = self.entry(id)?.node;
        let parent = self.node(idx).parent;
        let slot = parent.map(|p| self.child_slot(p, idx));

        let mut up = parent;
        while let Some(a) = up {
            let node = self.node_mut(a);
            node.size -= 1;
            up = node.parent;
        }

        let mut orphans = Vec::with_capacity(self.node(idx).size);
        self.release_subtree(idx, &mut orphans);
        orphans.retain(|&k| k != id);

        let entry = self.entries[id.index()].take()?;
        self.free_entries.push(id);
        self.len -= 1;

        match (parent, slot) {
            (Some(p), Some(i)) if orphans.is_empty() => {
                self.node_mut(p).children.remove(i);
            }
            (Some(p), Some(i)) => {
                let rebuilt = self.build(orphans, Some(p));
                self.node_mut(p).children[i].node = rebuilt;
            }
            _ if orphans.is_empty() => self.root = None,
            _ => {
                let rebuilt = self.build(orphans, None);
                self.root = Some(rebuilt);
            }
        }
        trace!(vertex = %id, "removed point from dvp tree");
        Some((entry.point, entry.payload))
    }

    /// Rebuild the whole tree with median splits.
    pub fn rebuild(&mut self) {
        if let Some(root) = self.root {
            self.rebuild_subtree(root);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Closest entry to `query`, `None` on an empty tree.
    pub fn find_nearest(&self, query: &S::Point) -> Option<VertexId> {
        self.find_nearest_k(query, 1, f64::INFINITY).first().map(|n| n.vertex)
    }

    /// Up to `k` entries within `radius` of `query`, closest first.
    /// Ties are broken by the lower handle.
    pub fn find_nearest_k(&self, query: &S::Point, k: usize, radius: f64) -> Vec<Neighbor> {
        self.find_nearest_filtered(query, k, radius, Ranking::Symmetric, |_, _| true)
    }

    /// Every entry within `radius` of `query`, closest first.
    pub fn find_in_range(&self, query: &S::Point, radius: f64) -> Vec<Neighbor> {
        self.find_nearest_k(query, self.len, radius)
    }

    /// Best predecessor candidate and best successor candidate, each the
    /// closest entry whose payload passes its own filter.
    pub fn find_nearest_pred_succ<FP, FS>(
        &self,
        query: &S::Point,
        has_pred: FP,
        has_succ: FS,
    ) -> (Option<VertexId>, Option<VertexId>)
    where
        FP: Fn(&V) -> bool,
        FS: Fn(&V) -> bool,
    {
        let pred = self
            .find_nearest_filtered(query, 1, f64::INFINITY, Ranking::IntoQuery, |_, v| has_pred(v))
            .first()
            .map(|n| n.vertex);
        let succ = self
            .find_nearest_filtered(query, 1, f64::INFINITY, Ranking::FromQuery, |_, v| has_succ(v))
            .first()
            .map(|n| n.vertex);
        (pred, succ)
    }

    /// Branch-and-bound k-nearest search restricted to entries passing `filter`.
    ///
    /// Subtrees whose distance interval cannot beat the current k-th best (or
    /// the radius cutoff) are skipped. Ranking orientation only matters for
    /// asymmetric metrics, whose pruning is then a heuristic.
    pub fn find_nearest_filtered<F>(
        &self,
        query: &S::Point,
        k: usize,
        radius: f64,
        ranking: Ranking,
        filter: F,
    ) -> Vec<Neighbor>
    where
        F: Fn(VertexId, &V) -> bool,
    {
        let Some(root) = self.root else { return Vec::new() };
        if k == 0 || !(radius >= 0.0) {
            return Vec::new();
        }

        let mut best = BinaryHeap::with_capacity(k.min(self.len));
        let mut stack: Vec<(f64, NodeIdx)> = vec![(0.0, root)];

        while let Some((gap, idx)) = stack.pop() {
            if gap > search_limit(&best, k, radius) {
                continue;
            }
            let node = self.node(idx);
            let entry = self.live_entry(node.key);
            let d = self.space.distance(&entry.point, query);

            if filter(node.key, &entry.payload) {
                let score = match ranking {
                    Ranking::FromQuery if !self.space.is_symmetric() => {
                        self.space.distance(query, &entry.point)
                    }
                    _ => d,
                };
                if score <= radius {
                    offer(&mut best, k, Neighbor { vertex: node.key, distance: score });
                }
            }

            // Lower bound on the distance from `query` to anything in each child.
            let mut order: SmallVec<[(f64, NodeIdx); 4]> = SmallVec::new();
            let mut lower = f64::NEG_INFINITY;
            for child in &node.children {
                let gap = if d <= lower {
                    lower - d
                } else if d > child.bound {
                    d - child.bound
                } else {
                    0.0
                };
                order.push((gap, child.node));
                lower = child.bound;
            }
            // Farthest first on the stack so the closest child is explored next.
            order.sort_by(|a, b| b.0.total_cmp(&a.0));
            let limit = search_limit(&best, k, radius);
            stack.extend(order.into_iter().filter(|(gap, _)| *gap <= limit));
        }

        best.into_sorted_vec()
    }

    /// Height of the tree. Full traversal.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else { return 0 };
        let mut deepest = 0;
        let mut stack = vec![(root, 1usize)];
        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.node(idx).children.iter().map(|c| (c.node, depth + 1)));
        }
        deepest
    }

    /// Typical spacing between neighboring points: the mean nearest-neighbor
    /// distance over an evenly strided sample of at most 32 entries. Zero for
    /// fewer than two points.
    pub fn characteristic_size(&self) -> f64 {
        const SAMPLE: usize = 32;
        if self.len < 2 {
            return 0.0;
        }
        let stride = (self.len / SAMPLE).max(1);
        let mut total = 0.0;
        let mut count = 0usize;
        for (_, point, _) in self.iter().step_by(stride).take(SAMPLE) {
            // The first hit is the point itself (or a duplicate of it).
            if let Some(next) = self.find_nearest_k(point, 2, f64::INFINITY).get(1) {
                total += next.distance;
                count += 1;
            }
        }
        if count == 0 { 0.0 } else { total / count as f64 }
    }

    /// Distance from the root vantage point to the farthest entry, a rough
    /// extent of the point cloud. Zero for fewer than two points.
    pub fn extent(&self) -> f64 {
        self.root
            .and_then(|r| self.node(r).children.last().map(|c| c.bound))
            .unwrap_or(0.0)
    }

    /// Verify the vantage-point layout, subtree sizes and handle mapping.
    pub fn check_invariant(&self) -> Result<()> {
        let violation = |msg: String| -> Result<()> { Err(Error::ConstraintViolation(msg)) };

        let mut live = 0;
        for (i, slot) in self.nodes.iter().enumerate() {
            let Some(node) = slot else { continue };
            live += 1;
            let idx = NodeIdx(i as u32);
            let Some(entry) = self.entry(node.key) else {
                return violation(format!("tree node {i} points at dead entry {}", node.key));
            };
            if entry.node != idx {
                return violation(format!("entry {} maps to the wrong tree node", node.key));
            }
            if node.children.len() > self.arity {
                return violation(format!("node of {} has {} children", node.key, node.children.len()));
            }

            let mut lower = f64::NEG_INFINITY;
            let mut below = 0;
            for child in &node.children {
                if !(child.bound > lower) {
                    return violation(format!("bounds under {} are not increasing", node.key));
                }
                let child_node = self.node(child.node);
                if child_node.parent != Some(idx) {
                    return violation(format!("{} has a stale parent link", child_node.key));
                }
                below += child_node.size;

                let mut stack = vec![child.node];
                while let Some(j) = stack.pop() {
                    let n = self.node(j);
                    let d = self.space.distance(&entry.point, &self.live_entry(n.key).point);
                    if !(d > lower && d <= child.bound) {
                        return violation(format!(
                            "{} at distance {d} from vantage {} escapes ({lower}, {}]",
                            n.key, node.key, child.bound
                        ));
                    }
                    stack.extend(n.children.iter().map(|c| c.node));
                }
                lower = child.bound;
            }
            if node.size != below + 1 {
                return violation(format!("size of {} is {}, expected {}", node.key, node.size, below + 1));
            }
        }
        if live != self.len {
            return violation(format!("{live} tree nodes for {} entries", self.len));
        }
        if let Some(root) = self.root {
            if self.node(root).parent.is_some() {
                return violation("root has a parent".into());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn entry(&self, id: VertexId) -> Option<&Entry<S::Point, V>> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    fn live_entry(&self, id: VertexId) -> &Entry<S::Point, V> {
        self.entry(id).expect("tree node refers to a live entry")
    }

    fn node(&self, idx: NodeIdx) -> &TreeNode {
        self.nodes[idx.index()].as_ref().expect("tree link refers to a live node")
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut TreeNode {
        self.nodes[idx.index()].as_mut().expect("tree link refers to a live node")
    }

    fn child_slot(&self, parent: NodeIdx, child: NodeIdx) -> usize {
        self.node(parent)
            .children
            .iter()
            .position(|c| c.node == child)
            .expect("child is listed by its parent")
    }

    fn alloc_entry(&mut self, point: S::Point, payload: V) -> VertexId {
        let entry = Entry { point, payload, node: NodeIdx::DETACHED };
        match self.free_entries.pop() {
            Some(id) => {
                self.entries[id.index()] = Some(entry);
                id
            }
            None => {
                let id = VertexId(u32::try_from(self.entries.len()).expect("vertex handles exhausted"));
                self.entries.push(Some(entry));
                id
            }
        }
    }

    fn alloc_node(&mut self, key: VertexId, parent: Option<NodeIdx>) -> NodeIdx {
        let node = TreeNode { key, parent, children: SmallVec::new(), size: 1, built_size: 0 };
        let idx = match self.free_nodes.pop() {
            Some(idx) => {
                self.nodes[idx.index()] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                NodeIdx((self.nodes.len() - 1) as u32)
            }
        };
        if let Some(Some(entry)) = self.entries.get_mut(key.index()) {
            entry.node = idx;
        }
        idx
    }

    /// Walk `id` down from the root into a new leaf.
    fn place(&mut self, id: VertexId) {
        let Some(mut cur) = self.root else {
            let idx = self.alloc_node(id, None);
            self.root = Some(idx);
            return;
        };

        let arity = self.arity;
        let mut depth = 0;
        let leaf = loop {
            let vp = self.node(cur).key;
            let d = self.space.distance(&self.live_entry(vp).point, &self.live_entry(id).point);
            depth += 1;

            let node = self.node_mut(cur);
            node.size += 1;
            if let Some(child) = node.children.iter().find(|c| d <= c.bound) {
                cur = child.node;
                continue;
            }
            if node.children.len() < arity {
                let parent = cur;
                let leaf = self.alloc_node(id, Some(parent));
                self.node_mut(parent).children.push(Child { node: leaf, bound: d });
                break leaf;
            }
            let last = node.children.last_mut().expect("a full node has children");
            last.bound = d;
            cur = last.node;
        };

        trace!(vertex = %id, depth, "placed point in dvp tree");
        self.rebalance_after(leaf, depth);
    }

    fn depth_limit(&self) -> usize {
        let n = self.len.max(2) as f64;
        (n.ln() / (1.0 / self.balance_factor).ln()).floor() as usize + 1
    }

    fn rebalance_after(&mut self, leaf: NodeIdx, depth: usize) {
        let limit = self.depth_limit();
        if depth <= limit {
            return;
        }
        let mut cur = self.node(leaf).parent;
        while let Some(idx) = cur {
            let node = self.node(idx);
            let heaviest = node.children.iter().map(|c| self.node(c.node).size).max().unwrap_or(0);
            let unbalanced = heaviest as f64 > self.balance_factor * node.size as f64;
            let grown = 2 * node.size > 3 * node.built_size;
            if unbalanced && grown {
                debug!(depth, limit, size = node.size, "dvp subtree out of balance, rebuilding");
                self.rebuild_subtree(idx);
                return;
            }
            cur = node.parent;
        }
        trace!(depth, limit, "no rebuildable scapegoat on the insertion path");
    }

    fn rebuild_subtree(&mut self, idx: NodeIdx) {
        let parent = self.node(idx).parent;
        let slot = parent.map(|p| self.child_slot(p, idx));

        let mut keys = Vec::with_capacity(self.node(idx).size);
        self.release_subtree(idx, &mut keys);
        let size = keys.len();
        let rebuilt = self.build(keys, parent);

        match (parent, slot) {
            (Some(p), Some(i)) => self.node_mut(p).children[i].node = rebuilt,
            _ => self.root = Some(rebuilt),
        }
        self.rebuilds += 1;
        debug!(size, "rebuilt dvp subtree");
    }

    /// Free every node of a subtree, collecting the keys they held.
    fn release_subtree(&mut self, idx: NodeIdx, keys: &mut Vec<VertexId>) {
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            let node = self.nodes[i.index()].take().expect("tree link refers to a live node");
            keys.push(node.key);
            stack.extend(node.children.iter().map(|c| c.node));
            self.free_nodes.push(i);
        }
    }

    /// Median-split construction over `keys` (non-empty), hung under `parent`.
    fn build(&mut self, keys: Vec<VertexId>, parent: Option<NodeIdx>) -> NodeIdx {
        let mut top = None;
        // (keys, parent, slot in the parent's child list; None for the top call)
        let mut work = vec![(keys, parent, None::<usize>)];

        while let Some((mut keys, parent, slot)) = work.pop() {
            let pick = self.choose_vantage(&keys);
            let vp = keys.swap_remove(pick);
            let node = self.alloc_node(vp, parent);
            match (parent, slot) {
                (Some(p), Some(i)) => self.node_mut(p).children[i].node = node,
                _ => top = Some(node),
            }

            let mut rest: Vec<(f64, VertexId)> = keys
                .into_iter()
                .map(|k| {
                    let d = self.space.distance(&self.live_entry(vp).point, &self.live_entry(k).point);
                    (d, k)
                })
                .collect();
            rest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let size = rest.len() + 1;
            let per = rest.len().div_ceil(self.arity).max(1);
            let mut start = 0;
            while start < rest.len() {
                let mut end = (start + per).min(rest.len());
                // Equal distances must not straddle a bound.
                while end < rest.len() && rest[end].0 == rest[end - 1].0 {
                    end += 1;
                }
                let bound = rest[end - 1].0;
                let group: Vec<VertexId> = rest[start..end].iter().map(|&(_, k)| k).collect();
                let children = &mut self.node_mut(node).children;
                children.push(Child { node: NodeIdx::DETACHED, bound });
                work.push((group, Some(node), Some(children.len() - 1)));
                start = end;
            }

            let n = self.node_mut(node);
            n.size = size;
            n.built_size = size;
        }

        top.expect("build is never called without keys")
    }

    fn choose_vantage(&mut self, keys: &[VertexId]) -> usize {
        if keys.len() <= 1 {
            return 0;
        }
        let space = &self.space;
        let entries = &self.entries;
        let distance = |i: usize, j: usize| {
            let a = &entries[keys[i].index()].as_ref().expect("live entry").point;
            let b = &entries[keys[j].index()].as_ref().expect("live entry").point;
            space.distance(a, b)
        };
        self.chooser.choose(keys.len(), &distance).min(keys.len() - 1)
    }
}

fn search_limit(best: &BinaryHeap<Neighbor>, k: usize, radius: f64) -> f64 {
    match best.peek() {
        Some(worst) if best.len() >= k => worst.distance.min(radius),
        _ => radius,
    }
}

fn offer(best: &mut BinaryHeap<Neighbor>, k: usize, candidate: Neighbor) {
    if best.len() < k {
        best.push(candidate);
    } else if best.peek().is_some_and(|worst| candidate < *worst) {
        best.pop();
        best.push(candidate);
    }
}

// ============================================================================
// Tests
// ============================================================================
