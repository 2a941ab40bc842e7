//! Network analyses.

pub mod components;
pub mod cycle_finder;
pub mod hydro;
pub mod node_degree;
pub mod stream_order;

pub use components::graph_components;
pub use cycle_finder::{find_cycles, find_cycles_into};
pub use hydro::{apply_repair, detect_anomalies, repair_anomalies};
pub use node_degree::{graph_nodes, graph_nodes_into};
pub use stream_order::{augment_features, compute_stream_orders};
