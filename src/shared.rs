//! Shared roadmap handle for multi-threaded planners.
//!
//! Sampler threads may query the roadmap concurrently, but graph mutation is
//! serialized: a connect call holds the write lock from candidate selection
//! to the end of propagation, so no reader ever sees a half-propagated graph.
//! Do the expensive work (sampling, collision pre-checks) before taking it.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::connector::{ConnectOutcome, ConnectorVisitor, PrunedConnector, SteeringOracle};
use crate::graph::MotionGraph;
use crate::model::{EdgeProperty, VertexId};
use crate::neighborhood::NeighborhoodSelector;
use crate::topology::MetricSpace;

/// Cloneable, lock-protected [`MotionGraph`].
pub struct SharedRoadmap<S: MetricSpace, E> {
    inner: Arc<RwLock<MotionGraph<S, E>>>,
}

impl<S: MetricSpace, E> Clone for SharedRoadmap<S, E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: MetricSpace, E> SharedRoadmap<S, E> {
    pub fn new(graph: MotionGraph<S, E>) -> Self {
        Self { inner: Arc::new(RwLock::new(graph)) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MotionGraph<S, E>> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MotionGraph<S, E>> {
        self.inner.write()
    }

    /// [`PrunedConnector::connect`] under the write lock.
    pub fn connect<Vis, O, N>(
        &self,
        connector: &PrunedConnector,
        point: S::Point,
        near: Option<(VertexId, E)>,
        visitor: &mut Vis,
        oracle: &O,
        selector: &N,
    ) -> ConnectOutcome
    where
        E: EdgeProperty,
        Vis: ConnectorVisitor<S, E> + ?Sized,
        O: SteeringOracle<S, E> + ?Sized,
        N: NeighborhoodSelector<S, E> + ?Sized,
    {
        let mut g = self.inner.write();
        connector.connect(point, near, &mut *g, visitor, oracle, selector)
    }

    /// [`PrunedConnector::connect_bidirectional`] under the write lock.
    #[allow(clippy::too_many_arguments)]
    pub fn connect_bidirectional<Vis, O, N>(
        &self,
        connector: &PrunedConnector,
        point: S::Point,
        near_pred: Option<(VertexId, E)>,
        near_succ: Option<(VertexId, E)>,
        visitor: &mut Vis,
        oracle: &O,
        selector: &N,
    ) -> ConnectOutcome
    where
        E: EdgeProperty,
        Vis: ConnectorVisitor<S, E> + ?Sized,
        O: SteeringOracle<S, E> + ?Sized,
        N: NeighborhoodSelector<S, E> + ?Sized,
    {
        let mut g = self.inner.write();
        connector.connect_bidirectional(point, near_pred, near_succ, &mut *g, visitor, oracle, selector)
    }

    /// The graph back, if this is the last handle.
    pub fn try_unwrap(self) -> Option<MotionGraph<S, E>> {
        Arc::try_unwrap(self.inner).ok().map(RwLock::into_inner)
    }
}
