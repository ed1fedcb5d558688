//! # Pruned Node Connector
//!
//! Grows the motion graph one sample at a time, keeping each vertex wired to
//! its cheapest known predecessor (and, when growing from both ends, its
//! cheapest known successor).
//!
//! ## One connect call
//!
//! 1. Ask the neighborhood selector for candidates around the new point.
//! 2. Create the vertex through the visitor.
//! 3. **Best link**: among candidates already reached from the root, pick
//!    the feasible one minimizing `cost(candidate) + weight`. The caller's
//!    `near` vertex competes too and wins ties.
//! 4. No feasible link: the vertex is removed again and the call reports
//!    [`ConnectOutcome::Rejected`]. The graph is left as it was.
//! 5. **Pruning**: every other candidate is offered a travel through the
//!    new vertex. If that is strictly cheaper than its current cost, the
//!    candidate is rewired and its old link edge is removed.
//! 6. **Propagation**: costs are pushed down the link tree below the new
//!    vertex, visiting each vertex at most once.
//!
//! The backward side (`distance`/`predecessor`, rooted at the start) and the
//! forward side (`fwd_distance`/`successor`, rooted at the goal) run the same
//! code, selected by [`Side`]. Forward travels run the other way: the link
//! edge of `v` goes *from* `v` *to* its successor.
//!
//! Candidates are evaluated in the order the selector returns them (closest
//! first). Among equal totals the earliest candidate wins.

pub mod oracle;
pub mod visitor;

use hashbrown::HashSet;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::graph::MotionGraph;
use crate::model::{EdgeId, EdgeProperty, VertexId, VertexProps};
use crate::neighborhood::NeighborhoodSelector;
use crate::topology::MetricSpace;
use crate::Error;

pub use oracle::{SegmentChecker, SteeringOracle, StraightLine};
pub use visitor::{ConnectorStats, ConnectorVisitor, NullVisitor};

/// Result of connecting one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The sample became this vertex.
    Connected(VertexId),
    /// Nothing could reach (or be reached from) the sample; the graph is unchanged.
    Rejected,
}

impl ConnectOutcome {
    pub fn vertex(self) -> Option<VertexId> {
        match self {
            ConnectOutcome::Connected(v) => Some(v),
            ConnectOutcome::Rejected => None,
        }
    }
}

// ============================================================================
// Sides
// ============================================================================

/// Which link tree an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Cost-to-come: `distance` and `predecessor`.
    Backward,
    /// Cost-to-go: `fwd_distance` and `successor`.
    Forward,
}

impl Side {
    pub fn cost(self, props: &VertexProps) -> f64 {
        match self {
            Side::Backward => props.distance,
            Side::Forward => props.fwd_distance,
        }
    }

    pub fn link(self, props: &VertexProps) -> Option<VertexId> {
        match self {
            Side::Backward => props.predecessor,
            Side::Forward => props.successor,
        }
    }

    fn set_cost(self, props: &mut VertexProps, cost: f64) {
        match self {
            Side::Backward => props.distance = cost,
            Side::Forward => props.fwd_distance = cost,
        }
    }

    fn attach(self, props: &mut VertexProps, cost: f64, parent: VertexId) {
        self.set_cost(props, cost);
        match self {
            Side::Backward => props.predecessor = Some(parent),
            Side::Forward => props.successor = Some(parent),
        }
    }

    fn other(self) -> Side {
        match self {
            Side::Backward => Side::Forward,
            Side::Forward => Side::Backward,
        }
    }

    /// Travel direction of the link between `parent` and `child`.
    fn orient(self, parent: VertexId, child: VertexId) -> (VertexId, VertexId) {
        match self {
            Side::Backward => (parent, child),
            Side::Forward => (child, parent),
        }
    }
}

// ============================================================================
// PrunedConnector
// ============================================================================

/// The pruned motion-graph connector. Stateless; one value serves any graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrunedConnector;

impl PrunedConnector {
    pub fn new() -> Self {
        Self
    }

    /// Connect `point` to the graph, growing from the start root only.
    ///
    /// `near` is the vertex the sample was generated from together with the
    /// edge property of that travel, if the planner has one.
    pub fn connect<S, E, Vis, O, N>(
        &self,
        point: S::Point,
        near: Option<(VertexId, E)>,
        g: &mut MotionGraph<S, E>,
        visitor: &mut Vis,
        oracle: &O,
        selector: &N,
    ) -> ConnectOutcome
    where
        S: MetricSpace,
        E: EdgeProperty,
        Vis: ConnectorVisitor<S, E> + ?Sized,
        O: SteeringOracle<S, E> + ?Sized,
        N: NeighborhoodSelector<S, E> + ?Sized,
    {
        let (pred, succ) = candidates(&point, g, selector);
        let v = visitor.create_vertex(point, g);
        let mut run = Run { g, visitor, oracle, bidirectional: false };

        run.announce(Side::Backward, v, near.as_ref().map(|(x, _)| *x));
        let attached = run
            .connect_best(Side::Backward, v, near, &pred)
            .and_then(|(x, eprop)| run.create_link_edge(Side::Backward, v, x, eprop).then_some(x));
        let Some(x) = attached else {
            run.rollback(v);
            return ConnectOutcome::Rejected;
        };

        run.improve_neighbors(Side::Backward, v, Some(x), &succ);
        run.propagate(Side::Backward, v);
        ConnectOutcome::Connected(v)
    }

    /// Connect `point` to both link trees at once (start and goal).
    ///
    /// The sample is rejected only if it can neither be reached from the
    /// start tree nor reach the goal tree. Pruning on one side leaves alone
    /// candidates already linked on the other side.
    #[allow(clippy::too_many_arguments)]
    pub fn connect_bidirectional<S, E, Vis, O, N>(
        &self,
        point: S::Point,
        near_pred: Option<(VertexId, E)>,
        near_succ: Option<(VertexId, E)>,
        g: &mut MotionGraph<S, E>,
        visitor: &mut Vis,
        oracle: &O,
        selector: &N,
    ) -> ConnectOutcome
    where
        S: MetricSpace,
        E: EdgeProperty,
        Vis: ConnectorVisitor<S, E> + ?Sized,
        O: SteeringOracle<S, E> + ?Sized,
        N: NeighborhoodSelector<S, E> + ?Sized,
    {
        let (pred, succ) = candidates(&point, g, selector);
        let v = visitor.create_vertex(point, g);
        let mut run = Run { g, visitor, oracle, bidirectional: true };

        run.announce(Side::Backward, v, near_pred.as_ref().map(|(x, _)| *x));
        run.announce(Side::Forward, v, near_succ.as_ref().map(|(x, _)| *x));
        let best_pred = run.connect_best(Side::Backward, v, near_pred, &pred);
        let best_succ = run.connect_best(Side::Forward, v, near_succ, &succ);

        let x_pred = best_pred.and_then(|(x, e)| run.create_link_edge(Side::Backward, v, x, e).then_some(x));
        let x_succ = best_succ.and_then(|(x, e)| run.create_link_edge(Side::Forward, v, x, e).then_some(x));
        if x_pred.is_none() && x_succ.is_none() {
            run.rollback(v);
            return ConnectOutcome::Rejected;
        }

        run.improve_neighbors(Side::Backward, v, x_pred, &succ);
        run.propagate(Side::Backward, v);
        run.improve_neighbors(Side::Forward, v, x_succ, &pred);
        run.propagate(Side::Forward, v);
        ConnectOutcome::Connected(v)
    }
}

/// Predecessor and successor candidate lists. An undirected graph uses one
/// list for both.
fn candidates<S, E, N>(point: &S::Point, g: &MotionGraph<S, E>, selector: &N) -> (Vec<VertexId>, Vec<VertexId>)
where
    S: MetricSpace,
    N: NeighborhoodSelector<S, E> + ?Sized,
{
    if g.is_directed() {
        selector.select_pred_succ(point, g)
    } else {
        let nc = selector.select(point, g);
        (nc.clone(), nc)
    }
}

// ============================================================================
// One connect call
// ============================================================================

struct Run<'a, S: MetricSpace, E, Vis: ?Sized, O: ?Sized> {
    g: &'a mut MotionGraph<S, E>,
    visitor: &'a mut Vis,
    oracle: &'a O,
    bidirectional: bool,
}

impl<S, E, Vis, O> Run<'_, S, E, Vis, O>
where
    S: MetricSpace,
    E: EdgeProperty,
    Vis: ConnectorVisitor<S, E> + ?Sized,
    O: SteeringOracle<S, E> + ?Sized,
{
    /// The caller's `near` travel counts as explored and successful.
    fn announce(&mut self, side: Side, v: VertexId, near: Option<VertexId>) {
        if let Some(x) = near {
            let (from, to) = side.orient(x, v);
            self.visitor.travel_explored(from, to, self.g);
            self.visitor.travel_succeeded(from, to, self.g);
            self.visitor.affected_vertex(x, self.g);
        }
    }

    /// Cheapest feasible link for `v` on `side`, seeded with `near`.
    fn connect_best(
        &mut self,
        side: Side,
        v: VertexId,
        near: Option<(VertexId, E)>,
        candidates: &[VertexId],
    ) -> Option<(VertexId, E)> {
        let near = near.filter(|(x, _)| {
            let linked = self.g.props(*x).is_some_and(|p| side.link(p).is_some());
            if !linked {
                debug!(vertex = %x, ?side, "ignoring near vertex without a link");
            }
            linked
        });
        let skip = near.as_ref().map(|(x, _)| *x);
        let mut best_cost = near.as_ref().map_or(f64::INFINITY, |(x, e)| side.cost(&self.g[*x]) + e.weight());
        let mut best = near;

        for &c in candidates {
            if Some(c) == skip || c == v {
                continue;
            }
            let Some(props) = self.g.props(c) else { continue };
            if side.link(props).is_none() {
                continue;
            }
            let c_cost = side.cost(props);

            let (from, to) = side.orient(c, v);
            let travel = self.oracle.can_be_connected(from, to, self.g);
            self.visitor.travel_explored(from, to, self.g);
            match travel {
                Some(eprop) => {
                    self.visitor.travel_succeeded(from, to, self.g);
                    let total = c_cost + eprop.weight();
                    trace!(candidate = %c, total, best = best_cost, ?side, "feasible link");
                    if total < best_cost {
                        best_cost = total;
                        best = Some((c, eprop));
                    }
                }
                None => self.visitor.travel_failed(from, to, self.g),
            }
            self.visitor.affected_vertex(c, self.g);
        }
        self.visitor.affected_vertex(v, self.g);
        best
    }

    /// Add the link edge between `v` and its chosen parent `x` and set `v`'s
    /// cost and link. Returns false if the graph refused the edge.
    fn create_link_edge(&mut self, side: Side, v: VertexId, x: VertexId, eprop: E) -> bool {
        let (from, to) = side.orient(x, v);
        let weight = eprop.weight();
        let (edge, weight, fresh) = match self.g.add_edge(from, to, eprop) {
            Ok(e) => (e, weight, true),
            // Undirected: the other side may already have wired this pair.
            Err(Error::ParallelEdge { .. }) if !self.g.is_directed() => {
                match self.g.find_edge(from, to) {
                    Some(e) => (e, self.g.weight(e).unwrap_or(weight), false),
                    None => return false,
                }
            }
            Err(err) => {
                warn!(%err, from = %from, to = %to, "graph refused link edge");
                return false;
            }
        };

        let cost = side.cost(&self.g[x]) + weight;
        side.attach(&mut self.g[v], cost, x);
        if fresh {
            self.visitor.edge_added(edge, self.g);
        }
        true
    }

    /// Offer every candidate a travel through `v`; rewire those for which it
    /// is strictly cheaper.
    fn improve_neighbors(&mut self, side: Side, v: VertexId, skip: Option<VertexId>, candidates: &[VertexId]) {
        let v_cost = side.cost(&self.g[v]);

        for &c in candidates {
            if Some(c) == skip || c == v {
                continue;
            }
            let Some(props) = self.g.props(c) else { continue };
            if self.bidirectional && side.other().link(props).is_some() {
                continue;
            }
            let c_cost = side.cost(props);
            let old = side.link(props);

            let (from, to) = side.orient(v, c);
            let travel = self.oracle.can_be_connected(from, to, self.g);
            self.visitor.travel_explored(from, to, self.g);
            match travel {
                Some(eprop) => {
                    self.visitor.travel_succeeded(from, to, self.g);
                    let total = v_cost + eprop.weight();
                    if total < c_cost {
                        self.rewire(side, v, c, old, eprop, total);
                    }
                }
                None => self.visitor.travel_failed(from, to, self.g),
            }
            self.visitor.affected_vertex(c, self.g);
        }
        self.visitor.affected_vertex(v, self.g);
    }

    fn rewire(&mut self, side: Side, v: VertexId, c: VertexId, old: Option<VertexId>, eprop: E, cost: f64) {
        let (from, to) = side.orient(v, c);
        let edge = match self.g.add_edge(from, to, eprop) {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, from = %from, to = %to, "graph refused rewiring edge");
                return;
            }
        };
        side.attach(&mut self.g[c], cost, v);
        self.visitor.edge_added(edge, self.g);

        // A root links to itself and keeps no link edge.
        if let Some(old) = old.filter(|&o| o != c) {
            let (from, to) = side.orient(old, c);
            if self.g.remove_edge(from, to) {
                debug!(vertex = %c, old = %old, new = %v, cost, ?side, "pruned superseded link");
                self.visitor.edge_pruned(from, to, self.g);
            }
        }
    }

    /// Refresh costs in the link subtree hanging below `root`.
    fn propagate(&mut self, side: Side, root: VertexId) {
        let mut stack = vec![root];
        let mut visited = HashSet::new();
        visited.insert(root);

        while let Some(s) = stack.pop() {
            let s_cost = side.cost(&self.g[s]);
            // Backward links run along out-edges, forward links along in-edges.
            let edges: SmallVec<[EdgeId; 8]> = match side {
                Side::Backward => self.g.out_edges(s),
                Side::Forward => self.g.in_edges(s),
            }
            .iter()
            .copied()
            .collect();

            for e in edges {
                let Some(edge) = self.g.edge(e) else { continue };
                let Some(t) = edge.other_end(s) else { continue };
                let weight = edge.weight();
                if t == s || self.g.props(t).and_then(|p| side.link(p)) != Some(s) || !visited.insert(t) {
                    continue;
                }
                side.set_cost(&mut self.g[t], s_cost + weight);
                trace!(vertex = %t, cost = s_cost + weight, ?side, "propagated cost");
                self.visitor.affected_vertex(t, self.g);
                stack.push(t);
            }
        }
    }

    /// Take the new vertex back out of the graph.
    fn rollback(&mut self, v: VertexId) {
        debug!(vertex = %v, "no feasible connection, rolling back");
        self.visitor.vertex_to_be_removed(v, self.g);
        if let Err(err) = self.g.clear_vertex(v) {
            warn!(%err, vertex = %v, "rollback could not clear vertex");
        }
        if let Err(err) = self.g.remove_vertex(v) {
            warn!(%err, vertex = %v, "rollback could not remove vertex");
        }
    }
}
