//! End-to-end tests for growing a roadmap from both the start and the goal.

use dvp_roadmap::{
    ConnectOutcome, ConnectorStats, EuclideanSpace, FixedNeighborhood, GraphConfig, MotionGraph,
    NullVisitor, PointDistribution, PrunedConnector, SegmentChecker, StraightLine, VertexId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

type Graph = MotionGraph<EuclideanSpace<2>, f64>;

fn start_and_goal() -> (Graph, VertexId, VertexId) {
    let mut g: Graph = MotionGraph::new(EuclideanSpace::unit(), GraphConfig::undirected()).unwrap();
    let start = g.add_vertex([0.0, 0.0]);
    let goal = g.add_vertex([1.0, 0.0]);
    g.set_root(start).unwrap();
    g.set_goal(goal).unwrap();
    (g, start, goal)
}

/// Both link trees satisfy their cost equations exactly.
fn assert_link_trees(g: &Graph) {
    for v in g.vertices() {
        if let Some(p) = g.predecessor(v).filter(|&p| p != v) {
            let e = g.find_edge(p, v).expect("predecessor edge present");
            assert_eq!(g.distance(v), g.distance(p) + g.weight(e).unwrap());
        }
        if let Some(s) = g.successor(v).filter(|&s| s != v) {
            let e = g.find_edge(v, s).expect("successor edge present");
            assert_eq!(g.fwd_distance(v), g.fwd_distance(s) + g.weight(e).unwrap());
        }
    }
}

// ============================================================================
// 1. A sample between the roots joins both trees
// ============================================================================

#[test]
fn test_sample_links_to_start_and_goal() {
    let (mut g, start, goal) = start_and_goal();
    let selector = FixedNeighborhood::k_nearest(8);

    let v = PrunedConnector::new()
        .connect_bidirectional([0.5, 0.0], None, None, &mut g, &mut NullVisitor, &StraightLine, &selector)
        .vertex()
        .unwrap();

    assert_eq!(g.predecessor(v), Some(start));
    assert_eq!(g.successor(v), Some(goal));
    assert_eq!(g.distance(v), 0.5);
    assert_eq!(g.fwd_distance(v), 0.5);
    assert_eq!(g.path_to_root(v), Some(vec![v, start]));
    assert_eq!(g.path_to_goal(v), Some(vec![v, goal]));
    assert_eq!(g.edge_count(), 2);
    assert_link_trees(&g);
}

// ============================================================================
// 2. Only one side reachable
// ============================================================================

#[test]
fn test_one_sided_connection_is_kept() {
    let (mut g, start, goal) = start_and_goal();
    // Wall around the start: nothing can reach it.
    let oracle = SegmentChecker::new(0.01, |p: &[f64; 2]| p[0] > 0.2);
    let selector = FixedNeighborhood::k_nearest(8);

    let v = PrunedConnector::new()
        .connect_bidirectional([0.6, 0.2], None, None, &mut g, &mut NullVisitor, &oracle, &selector)
        .vertex()
        .unwrap();

    assert_eq!(g.predecessor(v), None);
    assert_eq!(g.distance(v), f64::INFINITY);
    assert_eq!(g.successor(v), Some(goal));
    assert!(g.find_edge(start, v).is_none());
    assert_link_trees(&g);
}

#[test]
fn test_unreachable_from_both_sides_is_rejected() {
    let (mut g, _, _) = start_and_goal();
    let never = |_: VertexId, _: VertexId, _: &Graph| None::<f64>;
    let mut stats = ConnectorStats::default();

    let outcome = PrunedConnector::new().connect_bidirectional(
        [0.5, 0.5],
        None,
        None,
        &mut g,
        &mut stats,
        &never,
        &FixedNeighborhood::k_nearest(8),
    );

    assert_eq!(outcome, ConnectOutcome::Rejected);
    assert_eq!(g.vertex_count(), 2);
    assert_eq!(g.edge_count(), 0);
    assert_eq!(stats.rollbacks, 1);
}

// ============================================================================
// 3. Given near vertices on both sides
// ============================================================================

#[test]
fn test_near_vertices_seed_both_sides() {
    let (mut g, start, goal) = start_and_goal();
    let selector = FixedNeighborhood::new(8, 0.0).unwrap();

    // The selector finds nothing; the near travels alone decide.
    let v = PrunedConnector::new()
        .connect_bidirectional(
            [0.5, 0.0],
            Some((start, 0.75)),
            Some((goal, 0.25)),
            &mut g,
            &mut NullVisitor,
            &StraightLine,
            &selector,
        )
        .vertex()
        .unwrap();

    assert_eq!(g.distance(v), 0.75);
    assert_eq!(g.fwd_distance(v), 0.25);
    assert_link_trees(&g);
}

// ============================================================================
// 4. Random growth keeps both trees consistent
// ============================================================================

#[test]
fn test_random_bidirectional_growth() {
    let (mut g, _, _) = start_and_goal();
    let space = g.space().clone();
    let connector = PrunedConnector::new();
    let selector = FixedNeighborhood::new(10, 0.3).unwrap();
    let mut rng = StdRng::seed_from_u64(77);

    for _ in 0..300 {
        let p = space.random_point(&mut rng);
        let before: Vec<(VertexId, f64, f64)> =
            g.vertices().map(|v| (v, g.distance(v), g.fwd_distance(v))).collect();
        let sizes = (g.vertex_count(), g.edge_count());

        let outcome =
            connector.connect_bidirectional(p, None, None, &mut g, &mut NullVisitor, &StraightLine, &selector);
        if outcome == ConnectOutcome::Rejected {
            assert_eq!((g.vertex_count(), g.edge_count()), sizes);
        }
        for (v, d, f) in before {
            assert!(g.distance(v) <= d);
            assert!(g.fwd_distance(v) <= f);
        }
    }

    assert_link_trees(&g);
    g.tree().check_invariant().unwrap();
}
