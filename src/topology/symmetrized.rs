//! Symmetric view over a quasi-metric space.

use rand::Rng;

use super::{MetricSpace, PointDistribution, Topology};

/// Wraps a possibly asymmetric metric as `max(d(a, b), d(b, a))`.
///
/// Directed planners index their vertices through this view so that the
/// vantage-point tree sees a true metric. If the wrapped quasi-metric obeys
/// the oriented triangle inequality, the maximum obeys the symmetric one;
/// the cheaper direction does not. The steering oracle keeps charging the
/// oriented travel cost of the wrapped space.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetrizedMetric<S>(pub S);

impl<S> SymmetrizedMetric<S> {
    pub fn inner(&self) -> &S {
        &self.0
    }
}

impl<S: Topology> Topology for SymmetrizedMetric<S> {
    type Point = S::Point;
    type Difference = S::Difference;

    fn difference(&self, a: &S::Point, b: &S::Point) -> S::Difference {
        self.0.difference(a, b)
    }

    fn adjust(&self, a: &S::Point, delta: &S::Difference) -> S::Point {
        self.0.adjust(a, delta)
    }

    fn origin(&self) -> S::Point {
        self.0.origin()
    }
}

impl<S: MetricSpace> MetricSpace for SymmetrizedMetric<S> {
    fn distance(&self, a: &S::Point, b: &S::Point) -> f64 {
        let d_left = self.0.distance(a, b);
        let d_right = self.0.distance(b, a);
        d_left.max(d_right)
    }

    fn norm(&self, delta: &S::Difference) -> f64 {
        self.0.norm(delta)
    }

    fn move_position_toward(&self, a: &S::Point, fraction: f64, b: &S::Point) -> S::Point {
        self.0.move_position_toward(a, fraction, b)
    }
}

impl<S: PointDistribution> PointDistribution for SymmetrizedMetric<S> {
    fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> S::Point {
        self.0.random_point(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Going "uphill" along the line costs double.
    #[derive(Debug)]
    struct Slope;

    impl Topology for Slope {
        type Point = f64;
        type Difference = f64;
        fn difference(&self, a: &f64, b: &f64) -> f64 { a - b }
        fn adjust(&self, a: &f64, d: &f64) -> f64 { a + d }
        fn origin(&self) -> f64 { 0.0 }
    }

    impl MetricSpace for Slope {
        fn distance(&self, a: &f64, b: &f64) -> f64 {
            if b >= a { 2.0 * (b - a) } else { a - b }
        }
        fn norm(&self, d: &f64) -> f64 { d.abs() }
        fn move_position_toward(&self, a: &f64, t: f64, b: &f64) -> f64 { a + t * (b - a) }
        fn is_symmetric(&self) -> bool { false }
    }

    /// Moving toward +x or +y costs 1 per unit, toward -x or -y costs 10.
    #[derive(Debug)]
    struct Downhill;

    impl Topology for Downhill {
        type Point = [f64; 2];
        type Difference = [f64; 2];
        fn difference(&self, a: &[f64; 2], b: &[f64; 2]) -> [f64; 2] { [a[0] - b[0], a[1] - b[1]] }
        fn adjust(&self, a: &[f64; 2], d: &[f64; 2]) -> [f64; 2] { [a[0] + d[0], a[1] + d[1]] }
        fn origin(&self) -> [f64; 2] { [0.0, 0.0] }
    }

    impl MetricSpace for Downhill {
        fn distance(&self, a: &[f64; 2], b: &[f64; 2]) -> f64 {
            (0..2).map(|i| {
                let step = b[i] - a[i];
                if step >= 0.0 { step } else { -10.0 * step }
            }).sum()
        }
        fn norm(&self, d: &[f64; 2]) -> f64 { d[0].abs() + d[1].abs() }
        fn move_position_toward(&self, a: &[f64; 2], t: f64, b: &[f64; 2]) -> [f64; 2] {
            [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])]
        }
        fn is_symmetric(&self) -> bool { false }
    }

    #[test]
    fn symmetrized_takes_costlier_direction() {
        let s = SymmetrizedMetric(Slope);
        assert_eq!(s.inner().distance(&0.0, &1.0), 2.0);
        assert_eq!(s.distance(&0.0, &1.0), 2.0);
        assert_eq!(s.distance(&1.0, &0.0), 2.0);
        assert!(s.is_symmetric());
    }

    #[test]
    fn symmetrized_obeys_triangle_inequality() {
        let s = SymmetrizedMetric(Downhill);
        let (a, b, c) = ([0.0, 0.0], [1.0, 0.0], [1.0, -1.0]);
        assert_eq!(s.distance(&a, &b), 10.0);
        assert_eq!(s.distance(&b, &c), 10.0);
        assert_eq!(s.distance(&a, &c), 11.0);
        assert!(s.distance(&a, &c) <= s.distance(&a, &b) + s.distance(&b, &c));
    }
}
