//! # Motion-Graph Model
//!
//! Plain data shared by the spatial index, the adjacency overlay and the
//! connector: handles, vertex search properties, edges.
//!
//! Design rule: no storage and no algorithms here. This module is pure data.

pub mod vertex;
pub mod edge;

pub use vertex::{VertexId, VertexProps};
pub use edge::{Edge, EdgeId, EdgeProperty, Directedness};
