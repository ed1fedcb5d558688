//! # dvp-roadmap: Pruned Motion-Graph Roadmaps over a Dynamic VP-Tree
//!
//! The graph-growing core of sampling-based motion planners (RRT*, SBA*):
//! a motion graph whose vertices live in a dynamic vantage-point tree, and a
//! pruned connector that wires each new sample to its cheapest verified
//! predecessor, rewires neighbors that become cheaper through it, and
//! propagates the new costs down the link tree.
//!
//! ## Design Principles
//!
//! 1. **One store**: the DVP-tree owns every vertex; graph handles are tree handles
//! 2. **Injected capabilities**: metric space, steering oracle, neighborhood
//!    selector and visitor are traits; the core knows no geometry
//! 3. **Expected outcomes are not errors**: infeasible travels and rejected
//!    samples are reported, never raised
//! 4. **Single writer**: one connect call completes before the next starts
//!    (see [`SharedRoadmap`])
//!
//! ## Quick Start
//!
//! ```rust
//! use dvp_roadmap::{
//!     ConnectOutcome, EuclideanSpace, FixedNeighborhood, GraphConfig, MotionGraph,
//!     NullVisitor, PrunedConnector, StraightLine,
//! };
//!
//! # fn main() -> dvp_roadmap::Result<()> {
//! let mut g = MotionGraph::<_, f64>::new(EuclideanSpace::<2>::unit(), GraphConfig::undirected())?;
//! let root = g.add_vertex([0.0, 0.0]);
//! g.set_root(root)?;
//!
//! let connector = PrunedConnector::new();
//! let outcome = connector.connect(
//!     [0.3, 0.4],
//!     None,
//!     &mut g,
//!     &mut NullVisitor,
//!     &StraightLine,
//!     &FixedNeighborhood::new(8, 1.0)?,
//! );
//! let ConnectOutcome::Connected(v) = outcome else { unreachable!() };
//! assert_eq!(g.predecessor(v), Some(root));
//! assert!((g.distance(v) - 0.5).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`topology`] | metric-space traits, Euclidean boxes, symmetrization |
//! | [`index`] | the dynamic vantage-point tree |
//! | [`graph`] | the motion graph stored in the tree, mutation observers |
//! | [`neighborhood`] | candidate selection strategies |
//! | [`connector`] | the pruned connector, oracles, visitors |
//! | [`shared`] | lock-protected roadmap handle for threaded planners |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod config;
pub mod topology;
pub mod index;
pub mod graph;
pub mod neighborhood;
pub mod connector;
pub mod shared;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{Directedness, Edge, EdgeId, EdgeProperty, VertexId, VertexProps};

// ============================================================================
// Re-exports: Configuration and topology
// ============================================================================

pub use config::{DvpConfig, GraphConfig, VpChooserKind};
pub use topology::{EuclideanSpace, MetricSpace, PointDistribution, SymmetrizedMetric, Topology};

// ============================================================================
// Re-exports: Index and graph
// ============================================================================

pub use index::{DvpTree, Neighbor, Ranking};
pub use graph::{MotionGraph, Mutation, MutationLog, MutationObserver, VertexRecord};
pub use shared::SharedRoadmap;

// ============================================================================
// Re-exports: Connector
// ============================================================================

pub use connector::{
    ConnectOutcome, ConnectorStats, ConnectorVisitor, NullVisitor,
    PrunedConnector, SegmentChecker, Side, SteeringOracle, StraightLine,
};
pub use neighborhood::{FixedNeighborhood, NeighborhoodSelector, StarNeighborhood};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid vertex: {0}")]
    InvalidVertex(VertexId),

    #[error("Invalid edge: {0}")]
    InvalidEdge(EdgeId),

    #[error("Parallel edge refused: {from} -> {to}")]
    ParallelEdge { from: VertexId, to: VertexId },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
