//! Vantage-point choosers used when a subtree is (re)built.

use rand::SeedableRng;
use rand::Rng;
use rand::rngs::StdRng;

use crate::config::{DvpConfig, VpChooserKind};

/// Picks the vantage point among `count` candidates.
///
/// `distance(i, j)` measures candidate `i` against candidate `j`. The
/// returned index must be `< count`; `count` is never zero.
pub trait VpChooser: Send + Sync {
    fn choose(&mut self, count: usize, distance: &dyn Fn(usize, usize) -> f64) -> usize;
}

/// Uniformly random vantage point.
#[derive(Debug, Clone)]
pub struct RandomVpChooser {
    rng: StdRng,
}

impl RandomVpChooser {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl VpChooser for RandomVpChooser {
    fn choose(&mut self, count: usize, _distance: &dyn Fn(usize, usize) -> f64) -> usize {
        self.rng.gen_range(0..count)
    }
}

/// Among a random sample of candidates, the one whose distances to a second
/// random sample have the largest variance. A high spread means the median
/// split separates the points well.
#[derive(Debug, Clone)]
pub struct BestSpreadVpChooser {
    rng: StdRng,
    sample: usize,
}

impl BestSpreadVpChooser {
    pub fn new(seed: u64, sample: usize) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), sample: sample.max(1) }
    }
}

impl VpChooser for BestSpreadVpChooser {
    fn choose(&mut self, count: usize, distance: &dyn Fn(usize, usize) -> f64) -> usize {
        if count <= 2 {
            return 0;
        }
        let probes = self.sample.min(count);
        let mut best = (0, f64::NEG_INFINITY);
        for _ in 0..probes {
            let candidate = self.rng.gen_range(0..count);
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for _ in 0..probes {
                let other = self.rng.gen_range(0..count);
                let d = distance(candidate, other);
                sum += d;
                sum_sq += d * d;
            }
            let n = probes as f64;
            let mean = sum / n;
            let spread = sum_sq / n - mean * mean;
            if spread > best.1 {
                best = (candidate, spread);
            }
        }
        best.0
    }
}

/// The chooser a [`DvpConfig`] asks for.
pub fn from_config(config: &DvpConfig) -> Box<dyn VpChooser> {
    match config.chooser {
        VpChooserKind::Random => Box::new(RandomVpChooser::new(config.seed)),
        VpChooserKind::BestSpread => Box::new(BestSpreadVpChooser::new(config.seed, config.chooser_sample)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_chooser_stays_in_range() {
        let mut c = RandomVpChooser::new(1);
        for count in 1..50 {
            assert!(c.choose(count, &|_, _| 0.0) < count);
        }
    }

    #[test]
    fn best_spread_returns_a_candidate() {
        // Points on a line at 0..9 plus one outlier.
        let xs: Vec<f64> = (0..10).map(f64::from).chain(std::iter::once(100.0)).collect();
        let dist = |i: usize, j: usize| (xs[i] - xs[j]).abs();
        let mut c = BestSpreadVpChooser::new(3, xs.len());
        let picked = c.choose(xs.len(), &dist);
        assert!(picked < xs.len());
    }
}
