//! Synchronous mutation notifications.
//!
//! The graph calls its observer right after each structural change, before
//! the mutating method returns. There is no buffering.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::{EdgeId, VertexId};

/// Receives every structural change of a [`MotionGraph`](super::MotionGraph).
pub trait MutationObserver: Send + Sync {
    fn vertex_added(&mut self, _vertex: VertexId) {}

    /// Called after the vertex has left the spatial index.
    fn vertex_removed(&mut self, _vertex: VertexId) {}

    fn edge_added(&mut self, _edge: EdgeId, _source: VertexId, _target: VertexId) {}

    fn edge_removed(&mut self, _edge: EdgeId, _source: VertexId, _target: VertexId) {}
}

/// One recorded structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    VertexAdded(VertexId),
    VertexRemoved(VertexId),
    EdgeAdded { edge: EdgeId, source: VertexId, target: VertexId },
    EdgeRemoved { edge: EdgeId, source: VertexId, target: VertexId },
}

/// Observer that appends every change to a shared log.
///
/// Clones share the log, so a test can keep one clone and hand the other to
/// the graph.
#[derive(Debug, Clone, Default)]
pub struct MutationLog {
    events: Arc<Mutex<Vec<Mutation>>>,
}

impl MutationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Mutation> {
        self.events.lock().clone()
    }

    /// Take all recorded changes, leaving the log empty.
    pub fn drain(&self) -> Vec<Mutation> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl MutationObserver for MutationLog {
    fn vertex_added(&mut self, vertex: VertexId) {
        self.events.lock().push(Mutation::VertexAdded(vertex));
    }

    fn vertex_removed(&mut self, vertex: VertexId) {
        self.events.lock().push(Mutation::VertexRemoved(vertex));
    }

    fn edge_added(&mut self, edge: EdgeId, source: VertexId, target: VertexId) {
        self.events.lock().push(Mutation::EdgeAdded { edge, source, target });
    }

    fn edge_removed(&mut self, edge: EdgeId, source: VertexId, target: VertexId) {
        self.events.lock().push(Mutation::EdgeRemoved { edge, source, target });
    }
}
