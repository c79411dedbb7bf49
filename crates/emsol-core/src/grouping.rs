//! Keyed classification of nodes and flows into constraint groups.
//!
//! A grouping maps each entity to zero, one, or many group keys. List
//! groupings merge by appending, so a group is an *ordered* collection; the
//! identity grouping treats a duplicate key (two nodes with the same label)
//! as a fatal modeling error. Block builders never traverse the graph
//! themselves — they name the group they need and receive it, or `None`.
//!
//! The grouping list is dependency-injected: [`default_groupings`] is an
//! ordinary function whose result the energy system receives at
//! construction, and callers append their own [`Grouping`] entries for
//! custom blocks. There is no process-wide registry.

use std::collections::BTreeMap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::{EmsolError, EmsolResult};
use crate::flow::Flow;
use crate::{EnergySystem, Node};

/// Well-known group keys consumed by the default constraint blocks.
pub mod groups {
    /// Buses with the plain aggregate balance.
    pub const BALANCED_BUSES: &str = "balanced_buses";
    /// Buses balanced per substance instead of in aggregate.
    pub const SUBSTANCE_BUSES: &str = "substance_buses";
    /// Converter nodes with conversion-factor coupling.
    pub const CONVERTERS: &str = "converters";
    /// Flows without investment or nonconvex options.
    pub const STANDARD_FLOWS: &str = "standard_flows";
    /// Flows whose capacity is an investment decision.
    pub const INVESTMENT_FLOWS: &str = "investment_flows";
    /// Flows with an on/off status decision.
    pub const NONCONVEX_FLOWS: &str = "nonconvex_flows";
    /// Flows contributing to named objective buckets (overlay).
    pub const MULTIOBJECTIVE_FLOWS: &str = "multiobjective_flows";
    /// Flows with declared substance concentrations (overlay).
    pub const SUBSTANCE_FLOWS: &str = "substance_flows";
}

/// Maps a node to the group keys it belongs to.
pub type NodeKeyFn = fn(&Node) -> Vec<String>;
/// Maps a flow to the group keys it belongs to.
pub type FlowKeyFn = fn(&Flow) -> Vec<String>;

/// One entry of the grouping list.
#[derive(Debug, Clone, Copy)]
pub enum Grouping {
    /// Every node keyed by its label, merge = error: duplicate labels are
    /// a fatal modeling error caught here, at grouping time.
    Identity,
    /// Nodes appended under every key the function returns.
    Nodes(NodeKeyFn),
    /// Flows appended under every key the function returns.
    Flows(FlowKeyFn),
}

/// The computed groups of one model build. Ordered by insertion within each
/// key (graph order), sorted across keys.
#[derive(Debug, Default)]
pub struct Groups {
    nodes: BTreeMap<String, Vec<NodeIndex>>,
    flows: BTreeMap<String, Vec<EdgeIndex>>,
}

impl Groups {
    /// Node group under `key`, or `None` when no entity mapped to it.
    pub fn nodes(&self, key: &str) -> Option<&[NodeIndex]> {
        self.nodes.get(key).map(|v| v.as_slice())
    }

    /// Flow group under `key`, or `None` when no entity mapped to it.
    pub fn flows(&self, key: &str) -> Option<&[EdgeIndex]> {
        self.flows.get(key).map(|v| v.as_slice())
    }

    pub fn node_keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|k| k.as_str())
    }

    pub fn flow_keys(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(|k| k.as_str())
    }
}

/// The grouping list every energy system starts from.
pub fn default_groupings() -> Vec<Grouping> {
    vec![
        Grouping::Identity,
        Grouping::Nodes(default_node_groups),
        Grouping::Flows(default_flow_groups),
    ]
}

fn default_node_groups(node: &Node) -> Vec<String> {
    match node {
        Node::Bus(bus) if bus.substance_balance => vec![groups::SUBSTANCE_BUSES.to_string()],
        Node::Bus(_) => vec![groups::BALANCED_BUSES.to_string()],
        Node::Converter(_) => vec![groups::CONVERTERS.to_string()],
        Node::Source(_) | Node::Sink(_) => Vec::new(),
    }
}

fn default_flow_groups(flow: &Flow) -> Vec<String> {
    // one main block per flow, plus overlays
    let main = if flow.nonconvex.is_some() {
        groups::NONCONVEX_FLOWS
    } else if flow.investment.is_some() {
        groups::INVESTMENT_FLOWS
    } else {
        groups::STANDARD_FLOWS
    };
    let mut keys = vec![main.to_string()];
    if flow.multiobjective.is_some() {
        keys.push(groups::MULTIOBJECTIVE_FLOWS.to_string());
    }
    if !flow.substances.is_empty() {
        keys.push(groups::SUBSTANCE_FLOWS.to_string());
    }
    keys
}

/// Runs the grouping list over the system, once per model build.
pub fn compute_groups(system: &EnergySystem, groupings: &[Grouping]) -> EmsolResult<Groups> {
    let mut out = Groups::default();
    for grouping in groupings {
        match grouping {
            Grouping::Identity => {
                let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
                for idx in system.graph.node_indices() {
                    *seen.entry(system.graph[idx].label()).or_insert(0) += 1;
                }
                if let Some((label, count)) = seen.iter().find(|(_, c)| **c > 1) {
                    return Err(EmsolError::Grouping(format!(
                        "node label \"{label}\" appears {count} times; labels must be unique \
                         across the energy system"
                    )));
                }
            }
            Grouping::Nodes(key_fn) => {
                for idx in system.graph.node_indices() {
                    for key in key_fn(&system.graph[idx]) {
                        out.nodes.entry(key).or_default().push(idx);
                    }
                }
            }
            Grouping::Flows(key_fn) => {
                for edge in system.graph.edge_references() {
                    for key in key_fn(edge.weight()) {
                        out.flows.entry(key).or_default().push(edge.id());
                    }
                }
            }
        }
    }
    Ok(out)
}
