//! Network topology: node identity, the edge arena, walks and cycles.

pub mod cycles;
pub mod graph;
pub mod node;
pub mod traversal;

pub use graph::{BuildReport, Directedness, EdgeData, NetworkGraph};
pub use node::{Dimension, EdgeId, NodeId, NodeRegistry};
pub use traversal::FlowView;
