use std::collections::BTreeMap;
use log::debug;
use crate::{Cost, NodeId};
use crate::network::{is_valid_cost, TopologyError};
use super::routing_table::RoutingTable;

/// Read access to the published vectors of other nodes during a round.
pub trait VectorSource {
    fn vector_of(&self, id: &str) -> Option<&RoutingTable>;
}

impl VectorSource for BTreeMap<NodeId, Node> {
    fn vector_of(&self, id: &str) -> Option<&RoutingTable> {
        self.get(id).map(Node::routing_table)
    }
}

impl VectorSource for BTreeMap<NodeId, RoutingTable> {
    fn vector_of(&self, id: &str) -> Option<&RoutingTable> {
        self.get(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: NodeId,
    neighbors: BTreeMap<NodeId, Cost>,
    table: RoutingTable,
}

impl Node {
    pub fn new(name: NodeId, neighbors: BTreeMap<NodeId, Cost>) -> Result<Self, TopologyError> {
        if neighbors.contains_key(&name) {
            return Err(TopologyError::SelfLoop { node: name });
        }
        if let Some((neighbor, &cost)) = neighbors.iter().find(|(_, cost)| !is_valid_cost(**cost)) {
            return Err(TopologyError::InvalidCost { from: name, to: neighbor.clone(), cost });
        }

        let mut table = RoutingTable::new();
        table.add_local(&name);
        for (neighbor, &cost) in &neighbors {
            table.add_direct(neighbor, cost);
        }

        Ok(Self {
            name,
            neighbors,
            table,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn neighbors(&self) -> &BTreeMap<NodeId, Cost> {
        &self.neighbors
    }

    pub fn neighbor_cost(&self, neighbor: &str) -> Option<Cost> {
        self.neighbors.get(neighbor).copied()
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn distance_to(&self, destination: &str) -> Option<Cost> {
        self.table.metric(destination)
    }

    pub fn next_hop(&self, destination: &str) -> Option<&str> {
        self.table
            .get_route(destination)
            .and_then(|entry| entry.next_hop.as_deref())
    }

    pub fn distance_vector(&self) -> BTreeMap<NodeId, Cost> {
        self.table.distance_vector()
    }

    pub fn next_hops(&self) -> BTreeMap<NodeId, Option<NodeId>> {
        self.table.next_hops()
    }

    /// Folds one round of neighbor vectors into this node's table.
    ///
    /// Neighbors missing from `nodes` contribute nothing. Entries advertising
    /// this node as destination are ignored. Returns whether any entry changed.
    pub fn update<S: VectorSource + ?Sized>(&mut self, nodes: &S) -> bool {
        let mut changed = false;

        for (neighbor, &link_cost) in &self.neighbors {
            let Some(advertised) = nodes.vector_of(neighbor) else {
                continue;
            };

            for entry in advertised.iter() {
                if entry.destination == self.name {
                    continue;
                }

                let candidate = link_cost + entry.metric;
                if self.table.offer(&entry.destination, candidate, neighbor) {
                    debug!("{}: route to {} via {} metric {}",
                           self.name, entry.destination, neighbor, candidate);
                    changed = true;
                }
            }
        }

        changed
    }
}
