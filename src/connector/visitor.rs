//! Connector visitor: the instrumentation hooks of a connect call.

use serde::{Deserialize, Serialize};

use crate::graph::MotionGraph;
use crate::model::{EdgeId, VertexId};
use crate::topology::MetricSpace;

/// Callbacks fired while a sample is being connected.
///
/// Only `create_vertex` influences the algorithm; every other hook is a
/// notification and defaults to doing nothing. Travels are always reported
/// in travel direction, `(from, to)`.
pub trait ConnectorVisitor<S: MetricSpace, E> {
    /// Materialize the new vertex. The default simply adds it to the graph.
    fn create_vertex(&mut self, point: S::Point, g: &mut MotionGraph<S, E>) -> VertexId {
        g.add_vertex(point)
    }

    fn travel_explored(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {}

    fn travel_succeeded(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {}

    fn travel_failed(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {}

    /// A vertex was touched by travel attempts or had its cost changed.
    fn affected_vertex(&mut self, _v: VertexId, _g: &MotionGraph<S, E>) {}

    fn edge_added(&mut self, _e: EdgeId, _g: &MotionGraph<S, E>) {}

    /// A superseded edge `(from, to)` was evicted by a cheaper one.
    fn edge_pruned(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {}

    fn vertex_to_be_removed(&mut self, _v: VertexId, _g: &MotionGraph<S, E>) {}
}

/// Visitor that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVisitor;

impl<S: MetricSpace, E> ConnectorVisitor<S, E> for NullVisitor {}

/// Visitor tallying what the connector did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStats {
    pub vertices_created: u64,
    pub travels_explored: u64,
    pub travels_succeeded: u64,
    pub travels_failed: u64,
    pub vertices_affected: u64,
    pub edges_added: u64,
    pub edges_pruned: u64,
    pub rollbacks: u64,
}

impl<S: MetricSpace, E> ConnectorVisitor<S, E> for ConnectorStats {
    fn create_vertex(&mut self, point: S::Point, g: &mut MotionGraph<S, E>) -> VertexId {
        self.vertices_created += 1;
        g.add_vertex(point)
    }

    fn travel_explored(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {
        self.travels_explored += 1;
    }

    fn travel_succeeded(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {
        self.travels_succeeded += 1;
    }

    fn travel_failed(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {
        self.travels_failed += 1;
    }

    fn affected_vertex(&mut self, _v: VertexId, _g: &MotionGraph<S, E>) {
        self.vertices_affected += 1;
    }

    fn edge_added(&mut self, _e: EdgeId, _g: &MotionGraph<S, E>) {
        self.edges_added += 1;
    }

    fn edge_pruned(&mut self, _from: VertexId, _to: VertexId, _g: &MotionGraph<S, E>) {
        self.edges_pruned += 1;
    }

    fn vertex_to_be_removed(&mut self, _v: VertexId, _g: &MotionGraph<S, E>) {
        self.rollbacks += 1;
    }
}
