use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use rand::Rng;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::{Cost, NodeId};

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("malformed topology: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("cannot read topology file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("node {node} lists itself as a neighbor")]
    SelfLoop { node: NodeId },
    #[error("link {from} -> {to} has invalid cost {cost}")]
    InvalidCost { from: NodeId, to: NodeId, cost: Cost },
}

/// Link costs must be finite and non-negative.
pub fn is_valid_cost(cost: Cost) -> bool {
    cost.is_finite() && cost >= 0.0
}

/// How link costs of the built-in topology are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CostModel {
    /// Every link costs 1, so distances count hops.
    #[default]
    HopCount,
    /// Each undirected link gets a cost drawn from `RANDOM_COST_RANGE`.
    Random,
}

pub const RANDOM_COST_RANGE: std::ops::RangeInclusive<u32> = 1..=5;

/// Directed adjacency of the network: `{node: {neighbor: cost}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Topology {
    nodes: BTreeMap<NodeId, BTreeMap<NodeId, Cost>>,
}

impl Topology {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    pub fn with_node<C: Copy + Into<Cost>>(mut self, name: &str, links: &[(&str, C)]) -> Self {
        self.add_node(
            name.to_string(),
            links.iter().map(|(to, cost)| (to.to_string(), (*cost).into())).collect(),
        );
        self
    }

    pub fn add_node(&mut self, name: NodeId, links: BTreeMap<NodeId, Cost>) {
        self.nodes.insert(name, links);
    }

    pub fn add_link(&mut self, from: &str, to: &str, cost: Cost) {
        self.nodes
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), cost);
    }

    pub fn neighbors(&self, node: &str) -> Option<&BTreeMap<NodeId, Cost>> {
        self.nodes.get(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &BTreeMap<NodeId, Cost>)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pairs `(node, neighbor)` where the neighbor has no entry of its own.
    pub fn dangling_neighbors(&self) -> Vec<(&str, &str)> {
        let nodes = &self.nodes;
        nodes
            .iter()
            .flat_map(move |(from, links)| {
                links
                    .keys()
                    .filter(move |to| !nodes.contains_key(*to))
                    .map(move |to| (from.as_str(), to.as_str()))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), TopologyError> {
        for (name, links) in &self.nodes {
            if links.contains_key(name) {
                return Err(TopologyError::SelfLoop { node: name.clone() });
            }
            for (to, &cost) in links {
                if !is_valid_cost(cost) {
                    return Err(TopologyError::InvalidCost {
                        from: name.clone(),
                        to: to.clone(),
                        cost,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, TopologyError> {
        let topology: Topology = serde_json::from_str(json)?;
        topology.validate()?;
        Ok(topology)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, TopologyError> {
        let content = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, links) in &self.nodes {
            let body: Vec<String> = links
                .iter()
                .map(|(to, cost)| format!("{}: {}", to, cost))
                .collect();
            writeln!(f, "{}: {{{}}}", name, body.join(", "))?;
        }
        Ok(())
    }
}

/// The eight-node network A..H. Links are symmetric.
pub fn default_topology<R: Rng + ?Sized>(cost_model: CostModel, rng: &mut R) -> Topology {
    const LINKS: [(&str, &str); 10] = [
        ("A", "B"),
        ("A", "D"),
        ("E", "H"),
        ("B", "C"),
        ("B", "F"),
        ("C", "D"),
        ("C", "F"),
        ("C", "G"),
        ("D", "E"),
        ("D", "G"),
    ];

    let mut topology = Topology::new();
    for (a, b) in LINKS {
        let cost = match cost_model {
            CostModel::HopCount => 1.0,
            CostModel::Random => Cost::from(rng.gen_range(RANDOM_COST_RANGE)),
        };
        topology.add_link(a, b, cost);
        topology.add_link(b, a, cost);
    }
    topology
}

struct UniqueKeys<V> {
    what: &'static str,
    marker: PhantomData<V>,
}

impl<V> UniqueKeys<V> {
    fn new(what: &'static str) -> Self {
        Self { what, marker: PhantomData }
    }
}

impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
    type Value = BTreeMap<NodeId, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map keyed by unique {} names", self.what)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<NodeId, V>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate {} `{}`", self.what, key)));
            }
            map.insert(key, value);
        }
        Ok(map)
    }
}

struct Links(BTreeMap<NodeId, Cost>);

impl<'de> Deserialize<'de> for Links {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(UniqueKeys::new("neighbor")).map(Links)
    }
}

impl<'de> Deserialize<'de> for Topology {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nodes = deserializer.deserialize_map(UniqueKeys::<Links>::new("node"))?;
        Ok(Self {
            nodes: nodes.into_iter().map(|(name, links)| (name, links.0)).collect(),
        })
    }
}
