use std::collections::BTreeMap;
use std::io;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::NodeId;
use crate::network::{Topology, TopologyError};
use crate::report::{NodeSnapshot, Reporter, RoundSnapshot};
use super::node::{Node, VectorSource};
use super::routing_table::RoutingTable;

/// How neighbor state is read within one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RoundMode {
    /// Nodes see updates made earlier in the same round (Gauss-Seidel).
    #[default]
    InPlace,
    /// Every node reads a copy taken before the round starts (Jacobi).
    Snapshot,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),
    #[error("network did not converge within {rounds} rounds")]
    NotConverged { rounds: usize },
    #[error("failed to report round state: {0}")]
    Report(#[from] io::Error),
}

/// Every node of the simulated network, keyed and visited in identifier order.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: BTreeMap<NodeId, Node>,
}

impl Network {
    pub fn from_topology(topology: &Topology) -> Result<Self, TopologyError> {
        for (from, to) in topology.dangling_neighbors() {
            warn!("Node {} lists neighbor {} which is not part of the network", from, to);
        }

        let mut nodes = BTreeMap::new();
        for (name, neighbors) in topology.iter() {
            nodes.insert(name.clone(), Node::new(name.clone(), neighbors.clone())?);
        }

        Ok(Self { nodes })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Runs the update rule on one node against the current state of the
    /// others. Returns whether that node changed; unknown ids change nothing.
    pub fn update_node(&mut self, id: &str) -> bool {
        // A node never reads its own vector, so it can be lifted out while
        // the rest of the map stays visible.
        let Some((name, mut node)) = self.nodes.remove_entry(id) else {
            return false;
        };
        let changed = node.update(&self.nodes);
        self.nodes.insert(name, node);
        changed
    }

    /// Runs the update rule once on every node. Returns whether any node changed.
    pub fn run_round(&mut self, mode: RoundMode) -> bool {
        let mut changed = false;

        match mode {
            RoundMode::InPlace => {
                let ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
                for id in ids {
                    changed |= self.update_node(&id);
                }
            }
            RoundMode::Snapshot => {
                let published: BTreeMap<NodeId, RoutingTable> = self.nodes
                    .iter()
                    .map(|(id, node)| (id.clone(), node.routing_table().clone()))
                    .collect();
                for node in self.nodes.values_mut() {
                    changed |= node.update(&published);
                }
            }
        }

        changed
    }

    pub fn snapshot(&self, round: usize, changed: bool) -> RoundSnapshot {
        RoundSnapshot {
            round,
            changed,
            nodes: self.nodes
                .values()
                .map(|node| NodeSnapshot {
                    name: node.name().to_string(),
                    distance_vector: node.distance_vector(),
                    next_hop: node.next_hops(),
                })
                .collect(),
        }
    }
}

impl VectorSource for Network {
    fn vector_of(&self, id: &str) -> Option<&RoutingTable> {
        self.nodes.vector_of(id)
    }
}

/// Result of a completed simulation.
#[derive(Debug, Clone)]
pub struct Convergence {
    pub rounds: usize,
    pub network: Network,
}

/// Drives update rounds until no node changes.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceEngine {
    mode: RoundMode,
    max_rounds: Option<usize>,
}

impl ConvergenceEngine {
    pub fn new(mode: RoundMode) -> Self {
        Self {
            mode,
            max_rounds: None,
        }
    }

    /// Caps the number of rounds, the final quiet round included.
    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn mode(&self) -> RoundMode {
        self.mode
    }

    pub fn max_rounds(&self) -> Option<usize> {
        self.max_rounds
    }

    pub fn run<R: Reporter + ?Sized>(
        &self,
        topology: &Topology,
        reporter: &mut R,
    ) -> Result<Convergence, EngineError> {
        let mut network = Network::from_topology(topology)?;
        reporter.topology(topology)?;
        info!("Simulating distance-vector routing over {} nodes ({:?} rounds)",
              network.len(), self.mode);

        let rounds = self.converge(&mut network, reporter)?;
        Ok(Convergence { rounds, network })
    }

    /// Runs rounds on an already built network. Returns the number of rounds
    /// executed, including the final one that produced no change.
    pub fn converge<R: Reporter + ?Sized>(
        &self,
        network: &mut Network,
        reporter: &mut R,
    ) -> Result<usize, EngineError> {
        reporter.round(&network.snapshot(0, false))?;

        let mut round = 0;
        loop {
            if let Some(max_rounds) = self.max_rounds {
                if round >= max_rounds {
                    warn!("Giving up after {} rounds without convergence", round);
                    return Err(EngineError::NotConverged { rounds: round });
                }
            }

            round += 1;
            let changed = network.run_round(self.mode);
            debug!("Round {} finished, changed: {}", round, changed);

            let snapshot = network.snapshot(round, changed);
            reporter.round(&snapshot)?;

            if !changed {
                info!("Converged after {} rounds", round);
                reporter.converged(&snapshot)?;
                return Ok(round);
            }
        }
    }
}
