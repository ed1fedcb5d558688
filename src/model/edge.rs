//! Edge (travel) in the motion graph.

use serde::{Deserialize, Serialize};
use super::VertexId;

/// Opaque edge handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Whether edges are one-way travels or serve both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directedness {
    Directed,
    #[default]
    Undirected,
}

/// Anything the steering oracle hands back for a feasible travel.
///
/// The connector only ever reads the scalar travel cost.
pub trait EdgeProperty {
    fn weight(&self) -> f64;
}

impl EdgeProperty for f64 {
    fn weight(&self) -> f64 {
        *self
    }
}

/// An edge of the motion graph together with its bundled property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<E> {
    pub source: VertexId,
    pub target: VertexId,
    pub property: E,
}

impl<E> Edge<E> {
    pub fn new(source: VertexId, target: VertexId, property: E) -> Self {
        Self { source, target, property }
    }

    /// The "other" end of the edge seen from `from`. Self-loops return `from`.
    pub fn other_end(&self, from: VertexId) -> Option<VertexId> {
        if from == self.source { Some(self.target) }
        else if from == self.target { Some(self.source) }
        else { None }
    }

    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

impl<E: EdgeProperty> Edge<E> {
    pub fn weight(&self) -> f64 {
        self.property.weight()
    }
}
