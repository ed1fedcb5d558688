//! Vertex in the motion graph.

use serde::{Deserialize, Serialize};

/// Opaque vertex handle.
///
/// Handles are indices into the storage owned by the spatial index. They stay
/// valid until the vertex is removed; a removed handle may be reused later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Search properties carried by every motion-graph vertex.
///
/// `predecessor` and `successor` are non-owning handles. A root is marked by
/// being its own predecessor (a goal by being its own successor), so
/// `predecessor.is_some()` reads as "reached from the start".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexProps {
    /// Accumulated cost-to-come from the start root.
    pub distance: f64,
    /// Accumulated cost-to-go toward the goal root.
    pub fwd_distance: f64,
    pub predecessor: Option<VertexId>,
    pub successor: Option<VertexId>,
}

impl Default for VertexProps {
    fn default() -> Self {
        Self {
            distance: f64::INFINITY,
            fwd_distance: f64::INFINITY,
            predecessor: None,
            successor: None,
        }
    }
}

impl VertexProps {
    /// Reached from the start root.
    pub fn has_predecessor(&self) -> bool {
        self.predecessor.is_some()
    }

    /// Reaches the goal root.
    pub fn has_successor(&self) -> bool {
        self.successor.is_some()
    }
}
