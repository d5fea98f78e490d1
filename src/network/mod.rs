pub mod provider;
pub mod topology;

pub use provider::TopologySource;
pub use topology::{default_topology, is_valid_cost, CostModel, Topology, TopologyError, RANDOM_COST_RANGE};
