//! # Topologies and Metric Spaces
//!
//! The capability set the roadmap is generic over. Kinematic models plug in
//! here by supplying their point type and distance metric; nothing else in
//! the crate knows what a point is.
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`Topology`] | `difference`, `adjust`, `origin` |
//! | [`MetricSpace`] | `distance`, `norm`, `move_position_toward` |
//! | [`PointDistribution`] | `random_point` |
//!
//! The vantage-point tree prunes with the triangle inequality, so any metric
//! used for indexing must satisfy it. Quasi-metrics (asymmetric travel costs)
//! should be indexed through [`SymmetrizedMetric`], whose `max` of both
//! directions is a true metric.

pub mod euclidean;
pub mod symmetrized;

use rand::Rng;

pub use euclidean::EuclideanSpace;
pub use symmetrized::SymmetrizedMetric;

/// A space of points with a notion of displacement.
pub trait Topology {
    type Point: Clone + std::fmt::Debug;
    type Difference: Clone + std::fmt::Debug;

    /// Displacement taking `b` to `a`.
    fn difference(&self, a: &Self::Point, b: &Self::Point) -> Self::Difference;

    fn adjust(&self, a: &Self::Point, delta: &Self::Difference) -> Self::Point;

    fn origin(&self) -> Self::Point;
}

/// A topology equipped with a distance metric.
pub trait MetricSpace: Topology {
    /// Travel distance from `a` to `b`. May be asymmetric; see [`MetricSpace::is_symmetric`].
    fn distance(&self, a: &Self::Point, b: &Self::Point) -> f64;

    fn norm(&self, delta: &Self::Difference) -> f64;

    /// Point at `fraction` of the way from `a` toward `b`.
    fn move_position_toward(&self, a: &Self::Point, fraction: f64, b: &Self::Point) -> Self::Point;

    fn is_symmetric(&self) -> bool {
        true
    }
}

/// A topology that can be sampled.
pub trait PointDistribution: Topology {
    fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Point;
}
