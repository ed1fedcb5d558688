//! # Motion Graph
//!
//! An adjacency-list graph whose vertex storage *is* the DVP-tree: every
//! vertex record (search properties plus incident edge lists) is the payload
//! of one tree entry, and a [`VertexId`] is the tree's own entry handle.
//! Spatial queries and graph traversal therefore resolve the same handles
//! without any mapping table, and tree rebuilds never disturb them.
//!
//! Edges live in a slab next to the tree. In an undirected graph each edge is
//! listed once in the out-list of both endpoints and `in_edges == out_edges`.
//!
//! ## Invariants
//!
//! - An edge never references a vertex absent from the tree.
//! - `remove_vertex` refuses a vertex with incident edges; call
//!   [`MotionGraph::clear_vertex`] first.

pub mod observer;

use std::ops::{Index, IndexMut};

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::GraphConfig;
use crate::index::{DvpTree, Neighbor, Ranking};
use crate::model::{Directedness, Edge, EdgeId, EdgeProperty, VertexId, VertexProps};
use crate::topology::MetricSpace;
use crate::{Error, Result};

pub use observer::{Mutation, MutationLog, MutationObserver};

// ============================================================================
// Vertex storage
// ============================================================================

/// Payload stored in the DVP-tree for each vertex.
#[derive(Debug, Clone, Default)]
pub struct VertexRecord {
    pub props: VertexProps,
    out_edges: SmallVec<[EdgeId; 8]>,
    /// Directed graphs only.
    in_edges: SmallVec<[EdgeId; 4]>,
}

impl VertexRecord {
    pub fn out_edges(&self) -> &[EdgeId] {
        &self.out_edges
    }
}

// ============================================================================
// MotionGraph
// ============================================================================

/// Roadmap of sampled configurations and feasible travels between them.
pub struct MotionGraph<S: MetricSpace, E> {
    tree: DvpTree<S, VertexRecord>,
    edges: Vec<Option<Edge<E>>>,
    free_edges: Vec<EdgeId>,
    edge_count: usize,
    config: GraphConfig,
    observer: Option<Box<dyn MutationObserver>>,
}

impl<S: MetricSpace, E> MotionGraph<S, E> {
    pub fn new(space: S, config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let tree = DvpTree::new(space, &config.dvp)?;
        Ok(Self {
            tree,
            edges: Vec::new(),
            free_edges: Vec::new(),
            edge_count: 0,
            config,
            observer: None,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn is_directed(&self) -> bool {
        self.config.directedness == Directedness::Directed
    }

    pub fn space(&self) -> &S {
        self.tree.space()
    }

    /// The backing spatial index, read-only.
    pub fn tree(&self) -> &DvpTree<S, VertexRecord> {
        &self.tree
    }

    /// Register the observer that will hear about every structural change,
    /// replacing the previous one.
    pub fn set_observer(&mut self, observer: Box<dyn MutationObserver>) {
        self.observer = Some(observer);
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn MutationObserver>> {
        self.observer.take()
    }

    // ========================================================================
    // Counts and iteration
    // ========================================================================

    pub fn vertex_count(&self) -> usize {
        self.tree.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.tree.contains(v)
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edge(e).is_some()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.tree.iter().map(|(v, _, _)| v)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge<E>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (EdgeId(i as u32), e)))
    }

    // ========================================================================
    // Property access
    // ========================================================================

    pub fn vertex(&self, v: VertexId) -> Option<&VertexRecord> {
        self.tree.get(v)
    }

    pub fn props(&self, v: VertexId) -> Option<&VertexProps> {
        self.tree.get(v).map(|r| &r.props)
    }

    pub fn props_mut(&mut self, v: VertexId) -> Option<&mut VertexProps> {
        self.tree.get_mut(v).map(|r| &mut r.props)
    }

    pub fn position(&self, v: VertexId) -> Option<&S::Point> {
        self.tree.point(v)
    }

    pub fn distance(&self, v: VertexId) -> f64 {
        self.props(v).map_or(f64::INFINITY, |p| p.distance)
    }

    pub fn fwd_distance(&self, v: VertexId) -> f64 {
        self.props(v).map_or(f64::INFINITY, |p| p.fwd_distance)
    }

    pub fn predecessor(&self, v: VertexId) -> Option<VertexId> {
        self.props(v).and_then(|p| p.predecessor)
    }

    pub fn successor(&self, v: VertexId) -> Option<VertexId> {
        self.props(v).and_then(|p| p.successor)
    }

    /// Make `v` a start root: its own predecessor at distance zero.
    pub fn set_root(&mut self, v: VertexId) -> Result<()> {
        let props = self.props_mut(v).ok_or(Error::InvalidVertex(v))?;
        props.distance = 0.0;
        props.predecessor = Some(v);
        Ok(())
    }

    /// Make `v` a goal root: its own successor at forward distance zero.
    pub fn set_goal(&mut self, v: VertexId) -> Result<()> {
        let props = self.props_mut(v).ok_or(Error::InvalidVertex(v))?;
        props.fwd_distance = 0.0;
        props.successor = Some(v);
        Ok(())
    }

    /// Predecessor chain from `v` up to its root, both included.
    ///
    /// `None` if `v` is unreached or the chain is broken.
    pub fn path_to_root(&self, v: VertexId) -> Option<Vec<VertexId>> {
        self.follow(v, |p| p.predecessor)
    }

    /// Successor chain from `v` down to its goal, both included.
    pub fn path_to_goal(&self, v: VertexId) -> Option<Vec<VertexId>> {
        self.follow(v, |p| p.successor)
    }

    fn follow(&self, v: VertexId, link: impl Fn(&VertexProps) -> Option<VertexId>) -> Option<Vec<VertexId>> {
        let mut path = vec![v];
        let mut cur = v;
        loop {
            let next = link(self.props(cur)?)?;
            if next == cur {
                return Some(path);
            }
            // A chain longer than the graph has a cycle.
            if path.len() > self.vertex_count() {
                return None;
            }
            path.push(next);
            cur = next;
        }
    }

    // ========================================================================
    // Adjacency
    // ========================================================================

    /// Outgoing edges; every incident edge in an undirected graph.
    /// Empty for an unknown vertex.
    pub fn out_edges(&self, v: VertexId) -> &[EdgeId] {
        match self.tree.get(v) {
            Some(rec) => &rec.out_edges,
            None => &[],
        }
    }

    /// Incoming edges; same as [`MotionGraph::out_edges`] when undirected.
    pub fn in_edges(&self, v: VertexId) -> &[EdgeId] {
        match self.config.directedness {
            Directedness::Directed => match self.tree.get(v) {
                Some(rec) => &rec.in_edges,
                None => &[],
            },
            Directedness::Undirected => self.out_edges(v),
        }
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.out_edges(v).len()
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.in_edges(v).len()
    }

    pub fn edge(&self, e: EdgeId) -> Option<&Edge<E>> {
        self.edges.get(e.index()).and_then(Option::as_ref)
    }

    pub fn edge_mut(&mut self, e: EdgeId) -> Option<&mut Edge<E>> {
        self.edges.get_mut(e.index()).and_then(Option::as_mut)
    }

    /// An edge travelling from `u` to `v` (either way round when undirected).
    pub fn find_edge(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        let directed = self.is_directed();
        self.out_edges(u).iter().copied().find(|&e| {
            self.edge(e).is_some_and(|edge| {
                if directed { edge.target == v } else { edge.other_end(u) == Some(v) }
            })
        })
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert a vertex at `point` with unreached search properties.
    ///
    /// # Panics
    ///
    /// If all `u32::MAX` vertex handles are in use, like [`DvpTree::insert`].
    pub fn add_vertex(&mut self, point: S::Point) -> VertexId {
        let v = self.tree.insert(point, VertexRecord::default());
        trace!(vertex = %v, "vertex added");
        if let Some(obs) = self.observer.as_mut() {
            obs.vertex_added(v);
        }
        v
    }

    /// Add an edge from `u` to `v`.
    ///
    /// Fails if either end is unknown, or if an edge between the pair exists
    /// and the graph does not allow parallel edges.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId, property: E) -> Result<EdgeId> {
        for end in [u, v] {
            if !self.tree.contains(end) {
                return Err(Error::InvalidVertex(end));
            }
        }
        if !self.config.allow_parallel_edges && self.find_edge(u, v).is_some() {
            return Err(Error::ParallelEdge { from: u, to: v });
        }

        let edge = Edge::new(u, v, property);
        let e = match self.free_edges.pop() {
            Some(e) => {
                self.edges[e.index()] = Some(edge);
                e
            }
            None => {
                let e = EdgeId(u32::try_from(self.edges.len())
                    .map_err(|_| Error::ConstraintViolation("edge handles exhausted".into()))?);
                self.edges.push(Some(edge));
                e
            }
        };
        self.edge_count += 1;

        let directed = self.is_directed();
        if let Some(rec) = self.tree.get_mut(u) {
            rec.out_edges.push(e);
        }
        if let Some(rec) = self.tree.get_mut(v) {
            if directed {
                rec.in_edges.push(e);
            } else if u != v {
                rec.out_edges.push(e);
            }
        }

        trace!(edge = %e, from = %u, to = %v, "edge added");
        if let Some(obs) = self.observer.as_mut() {
            obs.edge_added(e, u, v);
        }
        Ok(e)
    }

    /// Remove one edge from `u` to `v`. Returns whether there was one.
    pub fn remove_edge(&mut self, u: VertexId, v: VertexId) -> bool {
        match self.find_edge(u, v) {
            Some(e) => self.remove_edge_by_id(e).is_ok(),
            None => false,
        }
    }

    pub fn remove_edge_by_id(&mut self, e: EdgeId) -> Result<Edge<E>> {
        let edge = self
            .edges
            .get_mut(e.index())
            .and_then(Option::take)
            .ok_or(Error::InvalidEdge(e))?;
        self.free_edges.push(e);
        self.edge_count -= 1;

        let directed = self.is_directed();
        if let Some(rec) = self.tree.get_mut(edge.source) {
            rec.out_edges.retain(|x| *x != e);
        }
        if let Some(rec) = self.tree.get_mut(edge.target) {
            if directed {
                rec.in_edges.retain(|x| *x != e);
            } else {
                rec.out_edges.retain(|x| *x != e);
            }
        }

        trace!(edge = %e, from = %edge.source, to = %edge.target, "edge removed");
        if let Some(obs) = self.observer.as_mut() {
            obs.edge_removed(e, edge.source, edge.target);
        }
        Ok(edge)
    }

    /// Remove every edge incident to `v`. Returns how many were removed.
    pub fn clear_vertex(&mut self, v: VertexId) -> Result<usize> {
        let rec = self.tree.get(v).ok_or(Error::InvalidVertex(v))?;
        let mut incident: SmallVec<[EdgeId; 16]> = rec.out_edges.iter().chain(&rec.in_edges).copied().collect();
        incident.sort_unstable();
        incident.dedup();
        for &e in &incident {
            self.remove_edge_by_id(e)?;
        }
        Ok(incident.len())
    }

    /// Remove an isolated vertex and hand back its position.
    ///
    /// Other vertices' predecessor/successor links are not touched; the
    /// caller makes sure none point here.
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<S::Point> {
        let rec = self.tree.get(v).ok_or(Error::InvalidVertex(v))?;
        let degree = rec.out_edges.len() + rec.in_edges.len();
        if degree != 0 {
            return Err(Error::ConstraintViolation(format!(
                "Cannot remove vertex {v} with {degree} incident edges. Clear it first."
            )));
        }
        let (point, _) = self.tree.remove(v).ok_or(Error::InvalidVertex(v))?;
        debug!(vertex = %v, "vertex removed");
        if let Some(obs) = self.observer.as_mut() {
            obs.vertex_removed(v);
        }
        Ok(point)
    }

    // ========================================================================
    // Spatial queries
    // ========================================================================

    pub fn find_nearest(&self, point: &S::Point) -> Option<VertexId> {
        self.tree.find_nearest(point)
    }

    pub fn find_nearest_k(&self, point: &S::Point, k: usize, radius: f64) -> Vec<Neighbor> {
        self.tree.find_nearest_k(point, k, radius)
    }

    pub fn find_in_range(&self, point: &S::Point, radius: f64) -> Vec<Neighbor> {
        self.tree.find_in_range(point, radius)
    }

    /// Nearest vertex already reached from the start, and nearest vertex
    /// already reaching the goal.
    pub fn find_nearest_pred_succ(&self, point: &S::Point) -> (Option<VertexId>, Option<VertexId>) {
        self.tree.find_nearest_pred_succ(
            point,
            |r| r.props.has_predecessor(),
            |r| r.props.has_successor(),
        )
    }

    /// Candidate lists for a new vertex at `point`: predecessors ranked by
    /// the travel cost into `point`, successors by the cost out of it.
    pub fn find_nearest_pred_succ_k(
        &self,
        point: &S::Point,
        k: usize,
        radius: f64,
    ) -> (Vec<Neighbor>, Vec<Neighbor>) {
        let pred = self.tree.find_nearest_filtered(point, k, radius, Ranking::IntoQuery, |_, _| true);
        let succ = self.tree.find_nearest_filtered(point, k, radius, Ranking::FromQuery, |_, _| true);
        (pred, succ)
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Typical spacing between neighboring vertices; see
    /// [`DvpTree::characteristic_size`].
    pub fn characteristic_size(&self) -> f64 {
        self.tree.characteristic_size()
    }
}

impl<S: MetricSpace, E: EdgeProperty> MotionGraph<S, E> {
    /// Travel cost of an edge.
    pub fn weight(&self, e: EdgeId) -> Option<f64> {
        self.edge(e).map(Edge::weight)
    }
}

impl<S: MetricSpace, E> Index<VertexId> for MotionGraph<S, E> {
    type Output = VertexProps;

    fn index(&self, v: VertexId) -> &VertexProps {
        match self.props(v) {
            Some(props) => props,
            None => panic!("no vertex {v} in the motion graph"),
        }
    }
}

impl<S: MetricSpace, E> IndexMut<VertexId> for MotionGraph<S, E> {
    fn index_mut(&mut self, v: VertexId) -> &mut VertexProps {
        match self.props_mut(v) {
            Some(props) => props,
            None => panic!("no vertex {v} in the motion graph"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
