//! Planar geometry for line networks.
//!
//! Primitives (coordinates, lines, polygons), measures and predicates,
//! an envelope index, and face extraction from noded lines.

pub mod index;
pub mod metrics;
pub mod polygonize;
pub mod primitives;

pub use primitives::{Coord, Envelope, Geometry, LineString, Polygon};
