use std::path::PathBuf;
use log::{info, warn};
use rand::Rng;
use super::topology::{default_topology, CostModel, Topology, TopologyError};

/// Where the simulated topology comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologySource {
    Default,
    Json(String),
    File(PathBuf),
}

impl TopologySource {
    pub fn try_resolve<R: Rng + ?Sized>(
        &self,
        cost_model: CostModel,
        rng: &mut R,
    ) -> Result<Topology, TopologyError> {
        match self {
            TopologySource::Default => Ok(default_topology(cost_model, rng)),
            TopologySource::Json(json) => Topology::from_json_str(json),
            TopologySource::File(path) => Topology::load_from_file(path),
        }
    }

    /// Like `try_resolve`, but any failure falls back to the built-in topology.
    pub fn resolve<R: Rng + ?Sized>(&self, cost_model: CostModel, rng: &mut R) -> Topology {
        match self.try_resolve(cost_model, rng) {
            Ok(topology) => {
                match self {
                    TopologySource::Default => info!("No topology given, using the default topology"),
                    TopologySource::Json(_) => info!("Loaded custom topology from the command line"),
                    TopologySource::File(path) => info!("Loaded custom topology from {:?}", path),
                }
                topology
            }
            Err(e) => {
                warn!("Cannot use the given topology ({}), loading the default topology", e);
                default_topology(cost_model, rng)
            }
        }
    }
}
