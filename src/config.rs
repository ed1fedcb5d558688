//! Configuration for the spatial index and the motion graph.
//!
//! Both structs deserialize from any serde format and fall back to
//! field-level defaults, so a planner config file only names what it changes:
//!
//! ```json
//! { "directedness": "directed", "dvp": { "arity": 4 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::model::Directedness;
use crate::{Error, Result};

// ============================================================================
// Vantage-point selection
// ============================================================================

/// How a subtree rebuild picks its vantage point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VpChooserKind {
    /// Uniformly random candidate.
    #[default]
    Random,
    /// Candidate whose distances to a sample of the others spread the most.
    BestSpread,
}

// ============================================================================
// DVP-tree configuration
// ============================================================================

/// Shape and rebalancing policy of the dynamic vantage-point tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DvpConfig {
    /// Maximum number of children per tree node.
    pub arity: usize,
    /// A node whose heaviest child holds more than this fraction of its
    /// subtree is out of balance. Must lie in `[1/arity, 1)`.
    pub balance_factor: f64,
    pub chooser: VpChooserKind,
    /// Candidates examined by [`VpChooserKind::BestSpread`].
    pub chooser_sample: usize,
    /// Seed of the chooser's random stream.
    pub seed: u64,
}

impl Default for DvpConfig {
    fn default() -> Self {
        Self {
            arity: 2,
            balance_factor: 0.75,
            chooser: VpChooserKind::Random,
            chooser_sample: 8,
            seed: 0x5EED_D7E5,
        }
    }
}

impl DvpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.arity < 2 {
            return Err(Error::Config(format!("DVP arity must be at least 2, got {}", self.arity)));
        }
        let min_factor = 1.0 / self.arity as f64;
        if !(self.balance_factor >= min_factor && self.balance_factor < 1.0) {
            return Err(Error::Config(format!(
                "Balance factor {} outside [{min_factor}, 1) for arity {}",
                self.balance_factor, self.arity
            )));
        }
        if self.chooser_sample == 0 {
            return Err(Error::Config("Chooser sample must be positive".into()));
        }
        Ok(())
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_chooser(mut self, chooser: VpChooserKind) -> Self {
        self.chooser = chooser;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

// ============================================================================
// Motion-graph configuration
// ============================================================================

/// Edge policy of the motion graph plus the layout of its backing tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub directedness: Directedness,
    /// When false, `add_edge` refuses a second edge between the same
    /// (ordered, if directed) pair of vertices.
    pub allow_parallel_edges: bool,
    pub dvp: DvpConfig,
}

impl GraphConfig {
    pub fn directed() -> Self {
        Self { directedness: Directedness::Directed, ..Self::default() }
    }

    pub fn undirected() -> Self {
        Self::default()
    }

    pub fn with_dvp(mut self, dvp: DvpConfig) -> Self {
        self.dvp = dvp;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.dvp.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(GraphConfig::default().validate().is_ok());
        assert!(GraphConfig::directed().validate().is_ok());
    }

    #[test]
    fn arity_one_is_rejected() {
        let cfg = DvpConfig::default().with_arity(1);
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn balance_factor_must_exceed_even_split() {
        let cfg = DvpConfig { arity: 4, balance_factor: 0.2, ..DvpConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = DvpConfig { arity: 4, balance_factor: 0.25, ..DvpConfig::default() };
        assert!(cfg.validate().is_ok());
        let cfg = DvpConfig { balance_factor: 1.0, ..DvpConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
