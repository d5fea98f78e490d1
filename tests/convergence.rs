use std::collections::BTreeMap;
use rand::SeedableRng;
use rand::rngs::StdRng;

use dv_routing::network::{default_topology, CostModel, Topology};
use dv_routing::protocol::{ConvergenceEngine, Network, RoundMode};
use dv_routing::report::{History, RoundSnapshot};
use dv_routing::{Cost, NodeId};

fn square() -> Topology {
    Topology::new()
        .with_node("A", &[("B", 1), ("D", 4)])
        .with_node("B", &[("A", 1), ("C", 2)])
        .with_node("C", &[("B", 2), ("D", 1)])
        .with_node("D", &[("A", 4), ("C", 1)])
}

fn asymmetric() -> Topology {
    Topology::new()
        .with_node("A", &[("B", 7), ("C", 1)])
        .with_node("B", &[("A", 2)])
        .with_node("C", &[("B", 1), ("D", 5)])
        .with_node("D", &[("A", 1), ("B", 9)])
}

/// Costs are exact binary fractions so path sums compare exactly.
fn fractional() -> Topology {
    Topology::new()
        .with_node("A", &[("B", 1.5), ("C", 4.0)])
        .with_node("B", &[("A", 1.5), ("C", 0.25), ("D", 3.0)])
        .with_node("C", &[("B", 0.25), ("D", 0.5)])
        .with_node("D", &[("A", 0.75), ("C", 0.5)])
}

fn topologies() -> Vec<Topology> {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut all = vec![
        square(),
        asymmetric(),
        fractional(),
        default_topology(CostModel::HopCount, &mut rng),
    ];
    for _ in 0..5 {
        all.push(default_topology(CostModel::Random, &mut rng));
    }
    all
}

fn simulate(topology: &Topology, mode: RoundMode) -> (usize, Network, History) {
    let mut history = History::default();
    let result = ConvergenceEngine::new(mode).run(topology, &mut history).unwrap();
    (result.rounds, result.network, history)
}

/// Reference shortest paths by exhaustive relaxation over the directed links.
fn shortest_costs(topology: &Topology, source: &str) -> BTreeMap<NodeId, Cost> {
    let mut dist: BTreeMap<NodeId, Cost> = BTreeMap::new();
    dist.insert(source.to_string(), 0.0);
    for _ in 0..=topology.len() {
        let current = dist.clone();
        for (from, &base) in &current {
            if let Some(links) = topology.neighbors(from) {
                for (to, cost) in links {
                    let candidate = base + cost;
                    let entry = dist.entry(to.clone()).or_insert(candidate);
                    if candidate < *entry {
                        *entry = candidate;
                    }
                }
            }
        }
    }
    dist
}

fn vector<'a>(snapshot: &'a RoundSnapshot, node: &str) -> &'a BTreeMap<NodeId, Cost> {
    &snapshot.node(node).unwrap().distance_vector
}

#[test]
fn square_scenario_converges_to_shortest_paths() {
    let (rounds, network, _) = simulate(&square(), RoundMode::InPlace);
    let a = network.node("A").unwrap();

    let expected: BTreeMap<NodeId, Cost> =
        [("A", 0.0), ("B", 1.0), ("C", 3.0), ("D", 4.0)].iter().map(|(k, v)| (k.to_string(), *v)).collect();
    assert_eq!(a.distance_vector(), expected);

    assert_eq!(a.next_hop("A"), None);
    assert_eq!(a.next_hop("B"), Some("B"));
    assert_eq!(a.next_hop("C"), Some("B"));
    // A-B-C-D also costs 4; the direct link is kept on the tie.
    assert_eq!(a.next_hop("D"), Some("D"));
    assert_eq!(rounds, 2);
}

#[test]
fn fixed_point_matches_reference_shortest_paths() {
    for topology in topologies() {
        for mode in [RoundMode::InPlace, RoundMode::Snapshot] {
            let (_, network, _) = simulate(&topology, mode);
            for node in network.nodes() {
                assert_eq!(node.distance_vector(), shortest_costs(&topology, node.name()),
                           "node {} in {:?} mode", node.name(), mode);
            }
        }
    }
}

#[test]
fn self_distance_is_zero_every_round() {
    for topology in topologies() {
        let (_, _, history) = simulate(&topology, RoundMode::InPlace);
        for snapshot in &history.rounds {
            for node in &snapshot.nodes {
                assert_eq!(node.distance_vector[&node.name], 0.0);
                assert_eq!(node.next_hop[&node.name], None);
            }
        }
    }
}

#[test]
fn distances_never_increase_between_rounds() {
    for topology in topologies() {
        for mode in [RoundMode::InPlace, RoundMode::Snapshot] {
            let (_, _, history) = simulate(&topology, mode);
            for pair in history.rounds.windows(2) {
                for node in &pair[0].nodes {
                    let later = vector(&pair[1], &node.name);
                    for (dest, cost) in &node.distance_vector {
                        assert!(later[dest] <= *cost);
                    }
                }
            }
        }
    }
}

#[test]
fn next_hops_are_consistent_at_fixed_point() {
    for topology in topologies() {
        let (_, network, _) = simulate(&topology, RoundMode::InPlace);
        for node in network.nodes() {
            for (dest, cost) in node.distance_vector() {
                if dest == node.name() {
                    continue;
                }
                let hop = node.next_hop(&dest).unwrap();
                let link = node.neighbor_cost(hop).unwrap();
                let Some(via) = network.node(hop) else {
                    continue;
                };
                assert_eq!(cost, link + via.distance_to(&dest).unwrap());
            }
        }
    }
}

#[test]
fn total_rounds_bounded_by_node_count() {
    for topology in topologies() {
        for mode in [RoundMode::InPlace, RoundMode::Snapshot] {
            let (rounds, _, _) = simulate(&topology, mode);
            assert!(rounds <= topology.len(), "{} rounds for {} nodes", rounds, topology.len());
        }
    }
}

#[test]
fn another_round_after_convergence_changes_nothing() {
    for topology in topologies() {
        let (_, mut network, _) = simulate(&topology, RoundMode::InPlace);
        let before = network.snapshot(0, false);

        assert!(!network.run_round(RoundMode::InPlace));
        assert!(!network.run_round(RoundMode::Snapshot));
        assert_eq!(network.snapshot(0, false), before);

        let mut nodes: Vec<_> = network.nodes().cloned().collect();
        for node in &mut nodes {
            assert!(!node.update(&network));
        }
    }
}

#[test]
fn dangling_neighbor_is_reachable_but_contributes_nothing() {
    let topology = Topology::new()
        .with_node("A", &[("B", 1), ("X", 2)])
        .with_node("B", &[("A", 1)]);
    let (_, network, _) = simulate(&topology, RoundMode::InPlace);

    let b = network.node("B").unwrap();
    assert_eq!(b.distance_to("X"), Some(3.0));
    assert_eq!(b.next_hop("X"), Some("A"));
    assert!(network.node("X").is_none());
}

#[test]
fn asymmetric_costs_follow_link_direction() {
    let (_, network, _) = simulate(&asymmetric(), RoundMode::InPlace);

    let a = network.node("A").unwrap();
    assert_eq!(a.distance_to("B"), Some(2.0));
    assert_eq!(a.next_hop("B"), Some("C"));

    let b = network.node("B").unwrap();
    assert_eq!(b.distance_to("D"), Some(8.0));
    assert_eq!(b.next_hop("D"), Some("A"));
}

#[test]
fn converged_report_repeats_last_round() {
    let (rounds, _, history) = simulate(&square(), RoundMode::Snapshot);

    assert_eq!(history.rounds.len(), rounds + 1);
    assert_eq!(history.converged.as_ref(), history.rounds.last());
}

#[test]
fn fractional_costs_converge_to_exact_sums() {
    for mode in [RoundMode::InPlace, RoundMode::Snapshot] {
        let (_, network, _) = simulate(&fractional(), mode);

        let a = network.node("A").unwrap();
        assert_eq!(a.distance_to("C"), Some(1.75));
        assert_eq!(a.next_hop("C"), Some("B"));
        assert_eq!(a.distance_to("D"), Some(2.25));
        assert_eq!(a.next_hop("D"), Some("B"));

        let d = network.node("D").unwrap();
        assert_eq!(d.distance_to("B"), Some(0.75));
        assert_eq!(d.next_hop("B"), Some("C"));
        // D-A costs 0.75 directly, D-C-B-A would cost 2.25.
        assert_eq!(d.distance_to("A"), Some(0.75));
        assert_eq!(d.next_hop("A"), Some("A"));
    }
}

/// For every learned route of `id`, compares its cost with what the chosen
/// neighbor currently advertises. Returns false if any route is cheaper than
/// its next hop can justify.
fn routes_are_backed_by_next_hops(network: &Network, id: &str, exact: bool) -> bool {
    let node = network.node(id).unwrap();
    for (dest, cost) in node.distance_vector() {
        if dest == id {
            continue;
        }
        let hop = node.next_hop(&dest).unwrap();
        let Some(via) = network.node(hop) else {
            continue;
        };
        let backed = node.neighbor_cost(hop).unwrap() + via.distance_to(&dest).unwrap();
        if cost < backed || (exact && cost != backed) {
            return false;
        }
    }
    true
}

#[test]
fn every_single_update_keeps_routes_backed_by_next_hop() {
    for topology in topologies() {
        let mut network = Network::from_topology(&topology).unwrap();
        let ids: Vec<NodeId> = network.ids().map(str::to_string).collect();

        let mut passes = 0;
        loop {
            let mut changed = false;
            for id in &ids {
                changed |= network.update_node(id);
                for v in &ids {
                    assert!(routes_are_backed_by_next_hops(&network, v, false),
                            "{} after updating {} in pass {}", v, id, passes);
                }
            }
            passes += 1;
            assert!(passes <= ids.len() + 1, "no fixed point after {} passes", passes);
            if !changed {
                break;
            }
        }

        for v in &ids {
            assert!(routes_are_backed_by_next_hops(&network, v, true), "{} at fixed point", v);
        }
    }
}

#[test]
fn every_snapshot_round_keeps_routes_backed_by_next_hop() {
    for topology in topologies() {
        let mut network = Network::from_topology(&topology).unwrap();
        let ids: Vec<NodeId> = network.ids().map(str::to_string).collect();

        while network.run_round(RoundMode::Snapshot) {
            for v in &ids {
                assert!(routes_are_backed_by_next_hops(&network, v, false), "{}", v);
            }
        }
        for v in &ids {
            assert!(routes_are_backed_by_next_hops(&network, v, true), "{} at fixed point", v);
        }
    }
}
