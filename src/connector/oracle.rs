//! Steering / feasibility oracles.
//!
//! The connector never inspects geometry itself. It asks an oracle whether a
//! direct travel between two existing vertices is possible and what edge
//! property (at least a cost) that travel carries. Lazy planners can return an
//! optimistic property and verify later; the connector does not care.

use crate::graph::MotionGraph;
use crate::model::VertexId;
use crate::topology::MetricSpace;

pub trait SteeringOracle<S: MetricSpace, E> {
    /// Edge property of the travel `from -> to`, or `None` if infeasible.
    fn can_be_connected(&self, from: VertexId, to: VertexId, g: &MotionGraph<S, E>) -> Option<E>;
}

impl<S, E, F> SteeringOracle<S, E> for F
where
    S: MetricSpace,
    F: Fn(VertexId, VertexId, &MotionGraph<S, E>) -> Option<E>,
{
    fn can_be_connected(&self, from: VertexId, to: VertexId, g: &MotionGraph<S, E>) -> Option<E> {
        self(from, to, g)
    }
}

/// Obstacle-free space: every travel is feasible and costs the metric distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl<S: MetricSpace> SteeringOracle<S, f64> for StraightLine {
    fn can_be_connected(&self, from: VertexId, to: VertexId, g: &MotionGraph<S, f64>) -> Option<f64> {
        let a = g.position(from)?;
        let b = g.position(to)?;
        Some(g.space().distance(a, b))
    }
}

/// Straight-line travel checked against a point-wise free-space predicate.
///
/// The segment is sampled every `resolution` units of distance, both ends
/// included. Cost is the metric distance.
#[derive(Debug, Clone, Copy)]
pub struct SegmentChecker<F> {
    pub resolution: f64,
    pub is_free: F,
}

impl<F> SegmentChecker<F> {
    pub fn new(resolution: f64, is_free: F) -> Self {
        Self { resolution, is_free }
    }
}

impl<S, F> SteeringOracle<S, f64> for SegmentChecker<F>
where
    S: MetricSpace,
    F: Fn(&S::Point) -> bool,
{
    fn can_be_connected(&self, from: VertexId, to: VertexId, g: &MotionGraph<S, f64>) -> Option<f64> {
        let space = g.space();
        let a = g.position(from)?;
        let b = g.position(to)?;
        let length = space.distance(a, b);
        let steps = if self.resolution > 0.0 {
            (length / self.resolution).ceil().max(1.0) as usize
        } else {
            1
        };
        for i in 0..=steps {
            let p = space.move_position_toward(a, i as f64 / steps as f64, b);
            if !(self.is_free)(&p) {
                return None;
            }
        }
        Some(length)
    }
}
