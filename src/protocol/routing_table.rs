use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::{Cost, NodeId};

/// Distance vector and next-hop table of one node, kept as a single map so
/// that a metric and the hop it was learned through always change together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingTable {
    entries: BTreeMap<NodeId, RoutingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub destination: NodeId,
    pub next_hop: Option<NodeId>,
    pub metric: Cost,
    pub source: RouteSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Local,   // the node itself
    Direct,  // seeded from the adjacency cost
    Learned, // improved through a neighbor's vector
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn add_local(&mut self, name: &str) {
        self.entries.insert(name.to_string(), RoutingEntry {
            destination: name.to_string(),
            next_hop: None,
            metric: 0.0,
            source: RouteSource::Local,
        });
    }

    pub fn add_direct(&mut self, neighbor: &str, metric: Cost) {
        self.entries.insert(neighbor.to_string(), RoutingEntry {
            destination: neighbor.to_string(),
            next_hop: Some(neighbor.to_string()),
            metric,
            source: RouteSource::Direct,
        });
    }

    /// Installs `metric` via `next_hop` if the destination is unknown or the
    /// offer is strictly cheaper. Returns whether the table changed.
    pub fn offer(&mut self, destination: &str, metric: Cost, next_hop: &str) -> bool {
        match self.entries.get_mut(destination) {
            Some(entry) if entry.source == RouteSource::Local => false,
            Some(entry) if metric < entry.metric => {
                entry.metric = metric;
                entry.next_hop = Some(next_hop.to_string());
                entry.source = RouteSource::Learned;
                true
            }
            Some(_) => false,
            None => {
                self.entries.insert(destination.to_string(), RoutingEntry {
                    destination: destination.to_string(),
                    next_hop: Some(next_hop.to_string()),
                    metric,
                    source: RouteSource::Learned,
                });
                true
            }
        }
    }

    pub fn get_route(&self, destination: &str) -> Option<&RoutingEntry> {
        self.entries.get(destination)
    }

    pub fn metric(&self, destination: &str) -> Option<Cost> {
        self.entries.get(destination).map(|entry| entry.metric)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingEntry> {
        self.entries.values()
    }

    pub fn distance_vector(&self) -> BTreeMap<NodeId, Cost> {
        self.entries
            .iter()
            .map(|(dest, entry)| (dest.clone(), entry.metric))
            .collect()
    }

    pub fn next_hops(&self) -> BTreeMap<NodeId, Option<NodeId>> {
        self.entries
            .iter()
            .map(|(dest, entry)| (dest.clone(), entry.next_hop.clone()))
            .collect()
    }
}
