//! NetworkError: unified error type for line-network public APIs
//!
//! Every fallible entry point of the crate returns `Result<_, NetworkError>`.
//! Geometric degeneracies (empty lines, zero-area faces, non-linear features)
//! are not errors; they are skipped and reported through `log` instead.

use thiserror::Error;

use crate::topology::node::{EdgeId, NodeId};

/// Unified error type for network analysis operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A configuration value is out of its admissible range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The named attribute is carried by none of the input features.
    #[error("Unknown attribute `{0}`: no input feature carries it")]
    UnknownAttribute(String),
    /// Stream ordering and anomaly repair need an oriented graph.
    #[error("Operation `{0}` requires a directed graph")]
    UndirectedGraph(&'static str),
    /// A node handle that does not belong to the graph it was used with.
    #[error("Graph error: node `{0}` does not exist")]
    MissingNode(NodeId),
    /// An edge handle that does not belong to the graph it was used with.
    #[error("Graph error: edge `{0}` does not exist")]
    MissingEdge(EdgeId),
}
