//! # Spatial Index
//!
//! A dynamic vantage-point tree (DVP-tree) over points of a [`MetricSpace`].
//! The tree owns the point and payload of every entry; callers hold
//! [`VertexId`] handles that survive subtree rebuilds.
//!
//! [`MetricSpace`]: crate::topology::MetricSpace
//! [`VertexId`]: crate::model::VertexId

pub mod chooser;
pub mod dvp;

use std::cmp::Ordering;

use crate::model::VertexId;

pub use chooser::{VpChooser, RandomVpChooser, BestSpreadVpChooser};
pub use dvp::DvpTree;

/// A query hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub vertex: VertexId,
    pub distance: f64,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ascending distance, ties broken by the lower handle.
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.vertex.cmp(&other.vertex))
    }
}

/// Which oriented distance ranks a stored point `x` against the query `q`.
///
/// Pruning always uses the tree's own `distance(vantage, q)`; the ranking
/// only differs from it for asymmetric metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ranking {
    /// `distance(x, q)`, the tree's own orientation.
    #[default]
    Symmetric,
    /// `distance(x, q)`: how far `x` is from reaching the query (predecessor candidates).
    IntoQuery,
    /// `distance(q, x)`: how far the query is from reaching `x` (successor candidates).
    FromQuery,
}
