//! Configuration loading and the shared roadmap handle.

use std::thread;

use dvp_roadmap::{
    ConnectorStats, Directedness, DvpConfig, EuclideanSpace, FixedNeighborhood, GraphConfig,
    MotionGraph, NullVisitor, PointDistribution, PrunedConnector, SharedRoadmap, StraightLine,
    VpChooserKind,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// 1. Configuration from JSON
// ============================================================================

#[test]
fn test_partial_json_config_falls_back_to_defaults() {
    let cfg: GraphConfig =
        serde_json::from_str(r#"{ "directedness": "directed", "dvp": { "arity": 4 } }"#).unwrap();

    assert_eq!(cfg.directedness, Directedness::Directed);
    assert!(!cfg.allow_parallel_edges);
    assert_eq!(cfg.dvp.arity, 4);
    assert_eq!(cfg.dvp.balance_factor, DvpConfig::default().balance_factor);
    assert_eq!(cfg.dvp.chooser, VpChooserKind::Random);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_survives_json() {
    let cfg = GraphConfig::directed()
        .with_dvp(DvpConfig::default().with_chooser(VpChooserKind::BestSpread).with_seed(9));
    let text = serde_json::to_string(&cfg).unwrap();
    assert!(text.contains("\"best_spread\""));
    assert_eq!(serde_json::from_str::<GraphConfig>(&text).unwrap(), cfg);
}

#[test]
fn test_invalid_config_is_refused_by_graph() {
    let cfg: GraphConfig = serde_json::from_str(r#"{ "dvp": { "arity": 4, "balance_factor": 0.1 } }"#).unwrap();
    let graph = MotionGraph::<_, f64>::new(EuclideanSpace::<2>::unit(), cfg);
    assert!(matches!(graph, Err(dvp_roadmap::Error::Config(_))));
}

#[test]
fn test_stats_serialize() {
    let stats = ConnectorStats { edges_added: 3, rollbacks: 1, ..ConnectorStats::default() };
    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["edges_added"], 3);
    assert_eq!(json["rollbacks"], 1);
}

// ============================================================================
// 2. Shared roadmap
// ============================================================================

#[test]
fn test_readers_run_beside_a_writer() {
    let mut g = MotionGraph::<_, f64>::new(EuclideanSpace::<2>::unit(), GraphConfig::undirected()).unwrap();
    let root = g.add_vertex([0.5, 0.5]);
    g.set_root(root).unwrap();
    let shared = SharedRoadmap::new(g);
    let connector = PrunedConnector::new();
    let selector = FixedNeighborhood::new(8, 0.25).unwrap();

    thread::scope(|scope| {
        let writer = shared.clone();
        scope.spawn(move || {
            let space = EuclideanSpace::<2>::unit();
            let mut rng = StdRng::seed_from_u64(3);
            for _ in 0..200 {
                let p = space.random_point(&mut rng);
                writer.connect(&connector, p, None, &mut NullVisitor, &StraightLine, &selector);
            }
        });

        for _ in 0..4 {
            let reader = shared.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    let g = reader.read();
                    // Every reached vertex reaches the root, never a half-updated chain.
                    for v in g.vertices() {
                        if g.predecessor(v).is_some() {
                            assert_eq!(g.path_to_root(v).and_then(|p| p.last().copied()), Some(root));
                        }
                    }
                }
            });
        }
    });

    let g = shared.try_unwrap().expect("all handles dropped");
    assert!(g.vertex_count() > 1);
    assert_eq!(g.edge_count(), g.vertex_count() - 1);
}
