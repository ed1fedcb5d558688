//! # Neighborhood Selection
//!
//! Strategies that turn a freshly sampled point into the candidate list the
//! connector evaluates. Both shipped strategies delegate to the graph's
//! DVP-tree; anything implementing [`NeighborhoodSelector`] will do.
//!
//! | Selector | Candidates |
//! |----------|------------|
//! | [`FixedNeighborhood`] | `k` nearest within a fixed radius |
//! | [`StarNeighborhood`] | `k` nearest within the shrinking RRT* radius |

use crate::graph::MotionGraph;
use crate::index::Neighbor;
use crate::model::VertexId;
use crate::topology::MetricSpace;
use crate::{Error, Result};

/// Picks connection candidates for a new point, closest first.
pub trait NeighborhoodSelector<S: MetricSpace, E> {
    /// Candidates for an undirected graph.
    fn select(&self, point: &S::Point, g: &MotionGraph<S, E>) -> Vec<VertexId>;

    /// Predecessor candidates (ranked by travel cost into `point`) and
    /// successor candidates (ranked by travel cost out of it).
    fn select_pred_succ(&self, point: &S::Point, g: &MotionGraph<S, E>) -> (Vec<VertexId>, Vec<VertexId>);
}

fn handles(hits: Vec<Neighbor>) -> Vec<VertexId> {
    hits.into_iter().map(|n| n.vertex).collect()
}

// ============================================================================
// Fixed neighborhood
// ============================================================================

/// At most `max_neighbors` vertices within `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedNeighborhood {
    pub max_neighbors: usize,
    pub radius: f64,
}

impl FixedNeighborhood {
    pub fn new(max_neighbors: usize, radius: f64) -> Result<Self> {
        if !(radius >= 0.0) {
            return Err(Error::Config(format!("Neighborhood radius must be non-negative, got {radius}")));
        }
        Ok(Self { max_neighbors, radius })
    }

    /// Plain k-nearest, no radius cutoff.
    pub fn k_nearest(max_neighbors: usize) -> Self {
        Self { max_neighbors, radius: f64::INFINITY }
    }
}

impl<S: MetricSpace, E> NeighborhoodSelector<S, E> for FixedNeighborhood {
    fn select(&self, point: &S::Point, g: &MotionGraph<S, E>) -> Vec<VertexId> {
        handles(g.find_nearest_k(point, self.max_neighbors, self.radius))
    }

    fn select_pred_succ(&self, point: &S::Point, g: &MotionGraph<S, E>) -> (Vec<VertexId>, Vec<VertexId>) {
        let (pred, succ) = g.find_nearest_pred_succ_k(point, self.max_neighbors, self.radius);
        (handles(pred), handles(succ))
    }
}

// ============================================================================
// Star neighborhood
// ============================================================================

/// RRT*-style neighborhood whose radius shrinks as the graph fills the space:
/// `r(n) = gamma * (ln n / n)^(1 / dimensions)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarNeighborhood {
    pub max_neighbors: usize,
    pub gamma: f64,
    pub dimensions: usize,
}

impl StarNeighborhood {
    pub fn new(max_neighbors: usize, gamma: f64, dimensions: usize) -> Result<Self> {
        if !(gamma > 0.0) {
            return Err(Error::Config(format!("Star neighborhood gamma must be positive, got {gamma}")));
        }
        if dimensions == 0 {
            return Err(Error::Config("Star neighborhood needs at least one dimension".into()));
        }
        Ok(Self { max_neighbors, gamma, dimensions })
    }

    /// Search radius for a graph of `n` vertices. Unbounded below two vertices.
    pub fn radius(&self, n: usize) -> f64 {
        if n < 2 {
            return f64::INFINITY;
        }
        let n = n as f64;
        self.gamma * (n.ln() / n).powf(1.0 / self.dimensions as f64)
    }
}

impl<S: MetricSpace, E> NeighborhoodSelector<S, E> for StarNeighborhood {
    fn select(&self, point: &S::Point, g: &MotionGraph<S, E>) -> Vec<VertexId> {
        let radius = self.radius(g.vertex_count());
        handles(g.find_nearest_k(point, self.max_neighbors, radius))
    }

    fn select_pred_succ(&self, point: &S::Point, g: &MotionGraph<S, E>) -> (Vec<VertexId>, Vec<VertexId>) {
        let radius = self.radius(g.vertex_count());
        let (pred, succ) = g.find_nearest_pred_succ_k(point, self.max_neighbors, radius);
        (handles(pred), handles(succ))
    }
}
