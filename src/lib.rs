pub mod protocol;
pub mod network;
pub mod config;
pub mod report;

pub type NodeId = String;
pub type Cost = f64;

pub use network::{Topology, TopologyError, TopologySource};
pub use protocol::{ConvergenceEngine, Convergence, EngineError, Network, Node, RoundMode};
pub use report::{Reporter, RoundSnapshot};
