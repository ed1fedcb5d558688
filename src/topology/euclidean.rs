//! Box-bounded Euclidean space over `[f64; N]`.

use rand::Rng;

use super::{MetricSpace, PointDistribution, Topology};
use crate::{Error, Result};

/// An axis-aligned box in `R^N` with the Euclidean metric.
#[derive(Debug, Clone, PartialEq)]
pub struct EuclideanSpace<const N: usize> {
    lower: [f64; N],
    upper: [f64; N],
}

impl<const N: usize> EuclideanSpace<N> {
    pub fn new(lower: [f64; N], upper: [f64; N]) -> Result<Self> {
        if let Some(axis) = (0..N).find(|&i| !(lower[i] <= upper[i])) {
            return Err(Error::Config(format!(
                "Empty bounds on axis {axis}: [{}, {}]", lower[axis], upper[axis]
            )));
        }
        Ok(Self { lower, upper })
    }

    /// The unit hypercube `[0, 1]^N`.
    pub fn unit() -> Self {
        Self { lower: [0.0; N], upper: [1.0; N] }
    }

    pub fn lower(&self) -> &[f64; N] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64; N] {
        &self.upper
    }

    pub fn contains(&self, p: &[f64; N]) -> bool {
        (0..N).all(|i| self.lower[i] <= p[i] && p[i] <= self.upper[i])
    }
}

impl<const N: usize> Topology for EuclideanSpace<N> {
    type Point = [f64; N];
    type Difference = [f64; N];

    fn difference(&self, a: &[f64; N], b: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| a[i] - b[i])
    }

    fn adjust(&self, a: &[f64; N], delta: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| a[i] + delta[i])
    }

    fn origin(&self) -> [f64; N] {
        [0.0; N]
    }
}

impl<const N: usize> MetricSpace for EuclideanSpace<N> {
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64 {
        self.norm(&self.difference(a, b))
    }

    fn norm(&self, delta: &[f64; N]) -> f64 {
        delta.iter().map(|d| d * d).sum::<f64>().sqrt()
    }

    fn move_position_toward(&self, a: &[f64; N], fraction: f64, b: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| a[i] + fraction * (b[i] - a[i]))
    }
}

impl<const N: usize> PointDistribution for EuclideanSpace<N> {
    fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> [f64; N] {
        std::array::from_fn(|i| {
            if self.lower[i] < self.upper[i] {
                rng.gen_range(self.lower[i]..self.upper[i])
            } else {
                self.lower[i]
            }
        })
    }
}
