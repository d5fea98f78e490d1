//! Round-by-round state of the simulation and the sinks that render it.

use std::collections::BTreeMap;
use std::io::{self, Write};
use serde::{Deserialize, Serialize};
use crate::{Cost, NodeId};
use crate::network::Topology;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: NodeId,
    pub distance_vector: BTreeMap<NodeId, Cost>,
    pub next_hop: BTreeMap<NodeId, Option<NodeId>>,
}

/// State of every node after a round. Round 0 is the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub round: usize,
    pub changed: bool,
    pub nodes: Vec<NodeSnapshot>,
}

impl RoundSnapshot {
    pub fn node(&self, name: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|node| node.name == name)
    }
}

pub trait Reporter {
    /// Called once with the simulated topology, before round 0.
    fn topology(&mut self, topology: &Topology) -> io::Result<()>;

    /// Called with the initial state and after every round.
    fn round(&mut self, snapshot: &RoundSnapshot) -> io::Result<()>;

    /// Called once more with the state of the round that produced no change.
    fn converged(&mut self, snapshot: &RoundSnapshot) -> io::Result<()>;
}

/// Keeps every snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub topology: Option<Topology>,
    pub rounds: Vec<RoundSnapshot>,
    pub converged: Option<RoundSnapshot>,
}

impl Reporter for History {
    fn topology(&mut self, topology: &Topology) -> io::Result<()> {
        self.topology = Some(topology.clone());
        Ok(())
    }

    fn round(&mut self, snapshot: &RoundSnapshot) -> io::Result<()> {
        self.rounds.push(snapshot.clone());
        Ok(())
    }

    fn converged(&mut self, snapshot: &RoundSnapshot) -> io::Result<()> {
        self.converged = Some(snapshot.clone());
        Ok(())
    }
}

pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_vectors(&mut self, snapshot: &RoundSnapshot) -> io::Result<()> {
        for node in &snapshot.nodes {
            writeln!(self.out, "Node {}:", node.name)?;
            writeln!(self.out, "  Distance Vector: {}", format_map(&node.distance_vector, |c| c.to_string()))?;
            writeln!(self.out, "  Next Hop: {}", format_map(&node.next_hop, |h| hop_label(h).to_string()))?;
        }
        Ok(())
    }

    fn write_routing_table(&mut self, node: &NodeSnapshot) -> io::Result<()> {
        writeln!(self.out, "Routing table of {}:", node.name)?;
        writeln!(self.out, "{:<15} {:<15} {:<8}", "Destination", "Next Hop", "Cost")?;
        writeln!(self.out, "{}", "-".repeat(40))?;

        for (destination, cost) in &node.distance_vector {
            let hop = node.next_hop.get(destination).and_then(|h| h.as_deref());
            writeln!(self.out, "{:<15} {:<15} {:<8}",
                     destination,
                     hop.unwrap_or("-"),
                     cost)?;
        }
        Ok(())
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn topology(&mut self, topology: &Topology) -> io::Result<()> {
        writeln!(self.out, "Topology:")?;
        writeln!(self.out, "{}", topology)
    }

    fn round(&mut self, snapshot: &RoundSnapshot) -> io::Result<()> {
        if snapshot.round == 0 {
            writeln!(self.out, "Round 0: initial state")?;
        } else {
            writeln!(self.out, "\nRound {}: update", snapshot.round)?;
        }
        self.write_vectors(snapshot)
    }

    fn converged(&mut self, snapshot: &RoundSnapshot) -> io::Result<()> {
        writeln!(self.out, "\nConverged after {} rounds!", snapshot.round)?;
        writeln!(self.out, "\nFinal routing tables:")?;
        for node in &snapshot.nodes {
            writeln!(self.out)?;
            self.write_routing_table(node)?;
        }
        self.out.flush()
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum ReportEvent<'a> {
    Topology { links: &'a Topology },
    Round(&'a RoundSnapshot),
    Converged(&'a RoundSnapshot),
}

/// Writes one JSON object per line.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: ReportEvent<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &event)?;
        writeln!(self.out)
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn topology(&mut self, topology: &Topology) -> io::Result<()> {
        self.emit(ReportEvent::Topology { links: topology })
    }

    fn round(&mut self, snapshot: &RoundSnapshot) -> io::Result<()> {
        self.emit(ReportEvent::Round(snapshot))
    }

    fn converged(&mut self, snapshot: &RoundSnapshot) -> io::Result<()> {
        self.emit(ReportEvent::Converged(snapshot))?;
        self.out.flush()
    }
}

fn hop_label(hop: &Option<NodeId>) -> &str {
    hop.as_deref().unwrap_or("none")
}

fn format_map<V>(map: &BTreeMap<NodeId, V>, render: impl Fn(&V) -> String) -> String {
    let body: Vec<String> = map
        .iter()
        .map(|(key, value)| format!("{}: {}", key, render(value)))
        .collect();
    format!("{{{}}}", body.join(", "))
}
