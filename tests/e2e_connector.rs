//! End-to-end tests for the pruned connector on undirected roadmaps.
//!
//! Small scenarios use a table oracle: a travel is feasible only between
//! listed positions, at the listed cost, so every expected distance is exact.

use dvp_roadmap::{
    ConnectOutcome, ConnectorStats, EuclideanSpace, FixedNeighborhood, GraphConfig, MotionGraph,
    Mutation, MutationLog, NullVisitor, PointDistribution, PrunedConnector, SegmentChecker,
    StarNeighborhood, SteeringOracle, StraightLine, VertexId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

type Graph = MotionGraph<EuclideanSpace<2>, f64>;

/// Symmetric table of feasible travels between positions.
struct Table(Vec<([f64; 2], [f64; 2], f64)>);

impl SteeringOracle<EuclideanSpace<2>, f64> for Table {
    fn can_be_connected(&self, from: VertexId, to: VertexId, g: &Graph) -> Option<f64> {
        let a = g.position(from)?;
        let b = g.position(to)?;
        self.0
            .iter()
            .find(|(p, q, _)| (p == a && q == b) || (p == b && q == a))
            .map(|t| t.2)
    }
}

fn graph() -> Graph {
    let space = EuclideanSpace::new([-20.0, -20.0], [20.0, 20.0]).unwrap();
    MotionGraph::new(space, GraphConfig::undirected()).unwrap()
}

fn rooted() -> (Graph, VertexId) {
    let mut g = graph();
    let root = g.add_vertex([0.0, 0.0]);
    g.set_root(root).unwrap();
    (g, root)
}

fn connect(g: &mut Graph, p: [f64; 2], oracle: &Table) -> ConnectOutcome {
    PrunedConnector::new().connect(p, None, g, &mut NullVisitor, oracle, &FixedNeighborhood::k_nearest(16))
}

/// Every reached vertex satisfies `distance(v) == distance(pred) + weight`.
fn assert_link_tree(g: &Graph) {
    for v in g.vertices() {
        let Some(p) = g.predecessor(v) else { continue };
        if p == v {
            assert_eq!(g.distance(v), 0.0);
            continue;
        }
        let e = g.find_edge(p, v).expect("link edge present");
        assert_eq!(g.distance(v), g.distance(p) + g.weight(e).unwrap(), "stale distance at {v}");
        assert!(g.path_to_root(v).is_some());
    }
}

// ============================================================================
// 1. Single sample next to the root
// ============================================================================

#[test]
fn test_first_sample_links_to_root() {
    let (mut g, root) = rooted();
    let oracle = Table(vec![([0.0, 0.0], [1.0, 0.0], 1.0)]);

    let v = connect(&mut g, [1.0, 0.0], &oracle).vertex().unwrap();

    assert_eq!(g.distance(v), 1.0);
    assert_eq!(g.predecessor(v), Some(root));
    assert_eq!(g.edge_count(), 1);
    assert_eq!(g.path_to_root(v), Some(vec![v, root]));
}

// ============================================================================
// 2. Cheapest accumulated cost wins, not the nearest vertex
// ============================================================================

#[test]
fn test_best_predecessor_minimizes_accumulated_cost() {
    let (mut g, root) = rooted();
    let oracle = Table(vec![
        ([0.0, 0.0], [5.0, 0.0], 5.0),
        ([0.0, 0.0], [4.0, 3.0], 10.0),
        ([5.0, 0.0], [4.0, 3.0], 2.0),
    ]);
    let a = connect(&mut g, [5.0, 0.0], &oracle).vertex().unwrap();
    assert_eq!(g.distance(a), 5.0);

    let b = connect(&mut g, [4.0, 3.0], &oracle).vertex().unwrap();

    assert_eq!(g.predecessor(b), Some(a));
    assert_eq!(g.distance(b), 7.0);
    assert_eq!(g.find_edge(root, b), None);
    assert_link_tree(&g);
}

// ============================================================================
// 3. Pruning: a cheaper route evicts the old link edge and propagates
// ============================================================================

#[test]
fn test_cheaper_route_rewires_and_propagates() {
    let (mut g, root) = rooted();
    let oracle = Table(vec![
        ([0.0, 0.0], [8.0, 0.0], 8.0),
        ([8.0, 0.0], [9.0, 0.0], 1.0),
        ([0.0, 0.0], [2.0, 0.0], 2.0),
        ([2.0, 0.0], [8.0, 0.0], 1.0),
    ]);
    let c = connect(&mut g, [8.0, 0.0], &oracle).vertex().unwrap();
    let d = connect(&mut g, [9.0, 0.0], &oracle).vertex().unwrap();
    assert_eq!((g.distance(c), g.distance(d)), (8.0, 9.0));

    let mut stats = ConnectorStats::default();
    let v = PrunedConnector::new()
        .connect([2.0, 0.0], None, &mut g, &mut stats, &oracle, &FixedNeighborhood::k_nearest(16))
        .vertex()
        .unwrap();

    assert_eq!(g.distance(v), 2.0);
    assert_eq!(g.predecessor(c), Some(v));
    assert_eq!(g.distance(c), 3.0);
    assert_eq!(g.distance(d), 4.0);
    assert_eq!(g.find_edge(root, c), None);
    assert!(g.find_edge(v, c).is_some());
    assert_eq!(g.path_to_root(d), Some(vec![d, c, v, root]));
    assert_eq!(stats.edges_pruned, 1);
    assert_eq!(stats.edges_added, 2);
    assert_eq!(g.edge_count(), g.vertex_count() - 1);
    assert_link_tree(&g);
}

#[test]
fn test_equal_cost_does_not_rewire() {
    let (mut g, root) = rooted();
    let oracle = Table(vec![
        ([0.0, 0.0], [4.0, 0.0], 4.0),
        ([0.0, 0.0], [2.0, 1.0], 2.0),
        ([2.0, 1.0], [4.0, 0.0], 2.0),
    ]);
    let c = connect(&mut g, [4.0, 0.0], &oracle).vertex().unwrap();
    connect(&mut g, [2.0, 1.0], &oracle).vertex().unwrap();

    assert_eq!(g.predecessor(c), Some(root));
    assert_eq!(g.distance(c), 4.0);
}

// ============================================================================
// 4. Tie-break and the caller's near vertex
// ============================================================================

#[test]
fn test_near_vertex_keeps_ties() {
    let (mut g, _root) = rooted();
    let oracle = Table(vec![
        ([0.0, 0.0], [1.0, 0.0], 1.0),
        ([0.0, 0.0], [0.0, 1.0], 1.0),
        ([1.0, 0.0], [1.0, 1.0], 1.0),
        ([0.0, 1.0], [1.0, 1.0], 1.0),
    ]);
    let a = connect(&mut g, [1.0, 0.0], &oracle).vertex().unwrap();
    let b = connect(&mut g, [0.0, 1.0], &oracle).vertex().unwrap();

    // Without a near vertex the first candidate in neighbor order wins.
    let p = connect(&mut g, [1.0, 1.0], &oracle).vertex().unwrap();
    assert_eq!(g.predecessor(p), Some(a));

    // The caller's near vertex keeps priority on equal cost.
    let q = PrunedConnector::new()
        .connect([1.0, 1.0], Some((b, 1.0)), &mut g, &mut NullVisitor, &oracle, &FixedNeighborhood::k_nearest(16))
        .vertex()
        .unwrap();
    assert_eq!(g.predecessor(q), Some(b));
    assert_eq!(g.distance(q), 2.0);
}

// ============================================================================
// 5. Rollback leaves the graph untouched
// ============================================================================

#[test]
fn test_unreachable_sample_is_rolled_back() {
    let (mut g, root) = rooted();
    let oracle = Table(vec![([0.0, 0.0], [1.0, 0.0], 1.0)]);
    connect(&mut g, [1.0, 0.0], &oracle).vertex().unwrap();

    let log = MutationLog::new();
    g.set_observer(Box::new(log.clone()));
    let mut stats = ConnectorStats::default();
    let outcome = PrunedConnector::new().connect(
        [5.0, 5.0],
        None,
        &mut g,
        &mut stats,
        &oracle,
        &FixedNeighborhood::k_nearest(16),
    );

    assert_eq!(outcome, ConnectOutcome::Rejected);
    assert_eq!(g.vertex_count(), 2);
    assert_eq!(g.edge_count(), 1);
    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.travels_failed, 2);
    let events = log.snapshot();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Mutation::VertexAdded(_)));
    assert!(matches!(events[1], Mutation::VertexRemoved(_)));
    assert_eq!(g.find_nearest(&[5.0, 5.0]).map(|v| g.position(v).copied()), Some(Some([1.0, 0.0])));
    assert_eq!(g.distance(root), 0.0);
}

#[test]
fn test_empty_graph_rejects() {
    let mut g = graph();
    let outcome = connect(&mut g, [1.0, 1.0], &Table(vec![]));
    assert_eq!(outcome, ConnectOutcome::Rejected);
    assert!(g.is_empty());
}

// ============================================================================
// 6. Randomized roadmap around an obstacle
// ============================================================================

#[test]
fn test_random_roadmap_keeps_invariants() {
    let space = EuclideanSpace::<2>::unit();
    let mut g: Graph = MotionGraph::new(space.clone(), GraphConfig::undirected()).unwrap();
    let root = g.add_vertex([0.05, 0.05]);
    g.set_root(root).unwrap();

    let free = |p: &[f64; 2]| ((p[0] - 0.5).powi(2) + (p[1] - 0.5).powi(2)).sqrt() > 0.2;
    let oracle = SegmentChecker::new(0.005, free);
    let selector = StarNeighborhood::new(12, 1.5, 2).unwrap();
    let connector = PrunedConnector::new();
    let mut stats = ConnectorStats::default();
    let mut rng = StdRng::seed_from_u64(2024);
    let mut rejected = 0;

    for _ in 0..400 {
        let p = space.random_point(&mut rng);
        if !free(&p) {
            continue;
        }
        let before: Vec<(VertexId, f64)> = g.vertices().map(|v| (v, g.distance(v))).collect();
        let sizes = (g.vertex_count(), g.edge_count());

        match connector.connect(p, None, &mut g, &mut stats, &oracle, &selector) {
            ConnectOutcome::Connected(v) => assert!(g.distance(v).is_finite()),
            ConnectOutcome::Rejected => {
                rejected += 1;
                assert_eq!((g.vertex_count(), g.edge_count()), sizes);
            }
        }
        for (v, d) in before {
            assert!(g.distance(v) <= d, "distance of {v} grew from {d} to {}", g.distance(v));
        }
    }

    assert_link_tree(&g);
    assert_eq!(g.edge_count(), g.vertex_count() - 1);
    assert_eq!(stats.rollbacks, rejected);
    assert!(stats.edges_pruned > 0);
    g.tree().check_invariant().unwrap();
}

#[test]
fn test_straight_line_matches_euclidean_cost() {
    let (mut g, root) = rooted();
    let selector = FixedNeighborhood::new(8, 30.0).unwrap();
    let connector = PrunedConnector::new();
    let a = connector.connect([3.0, 4.0], None, &mut g, &mut NullVisitor, &StraightLine, &selector).vertex().unwrap();
    let b = connector.connect([6.0, 8.0], None, &mut g, &mut NullVisitor, &StraightLine, &selector).vertex().unwrap();

    assert_eq!(g.distance(a), 5.0);
    assert_eq!(g.predecessor(b), Some(a));
    assert_eq!(g.distance(b), 10.0);
    assert_eq!(g.path_to_root(b), Some(vec![b, a, root]));
}
