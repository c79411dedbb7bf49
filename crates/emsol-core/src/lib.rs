//! # emsol-core: Energy System Graph Primitives
//!
//! Core data structures for declarative energy system optimization:
//! a directed graph of buses, sources, sinks, and converters whose edges
//! are [`Flow`]s carrying bounds, costs, and optional investment,
//! non-convex, multi-substance, and multi-objective attributes.
//!
//! This crate deliberately contains **no optimization**. It describes
//! *what exists and how it may behave*; compiling that description into a
//! linear program and solving it is the job of `emsol-model`. The split
//! keeps the data layer testable without a solver and lets the model layer
//! borrow the system immutably for its whole lifetime.
//!
//! ## Design Philosophy
//!
//! - **The graph is the model.** Nodes and flows are plain structs in a
//!   [`petgraph`] directed graph; there is no hidden registry and no
//!   global state. Everything a constraint builder needs it gets from the
//!   graph and the [`grouping`] layer.
//! - **Validate early, index late.** Cross-attribute rules are enforced at
//!   [`Flow`] construction, label uniqueness at grouping time, and sequence
//!   lengths by [`EnergySystem::validate`] before any variable is created.
//!   Blocks downstream can then index without re-checking.
//! - **Scalar-or-vector everywhere.** Every per-timestep attribute is a
//!   [`Sequence`]: a scalar broadcasts over the horizon, a vector must
//!   match it exactly.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use emsol_core::{Bus, EnergySystem, Flow, Sink, Source, TimeIndex};
//!
//! let start = NaiveDate::from_ymd_opt(2026, 1, 1)
//!     .unwrap()
//!     .and_hms_opt(0, 0, 0)
//!     .unwrap();
//! let timeindex = TimeIndex::hourly(start, 24).unwrap();
//!
//! let mut es = EnergySystem::new(timeindex);
//! let grid = es.add_node(Bus::new("electricity"));
//! let pv = es.add_node(Source::new("pv"));
//! let demand = es.add_node(Sink::new("demand"));
//!
//! es.add_flow(
//!     pv,
//!     grid,
//!     Flow::builder()
//!         .nominal_value(80.0)
//!         .variable_costs(12.0)
//!         .build()
//!         .unwrap(),
//! )
//! .unwrap();
//! es.add_flow(
//!     grid,
//!     demand,
//!     Flow::builder().nominal_value(60.0).fix(1.0).build().unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(es.stats().num_flows, 2);
//! es.validate().unwrap();
//! ```
//!
//! ## Core Data Structures
//!
//! - [`EnergySystem`]: the graph container plus time index, declared
//!   substances, and the injected grouping list
//! - [`Bus`], [`Source`], [`Sink`], [`Converter`]: node types
//! - [`Flow`]: edge attributes, built through [`Flow::builder`]
//! - [`Sequence`]: scalar-or-vector per-timestep values
//! - [`TimeIndex`]: equidistant horizon, supplies the timeincrement
//!
//! ## Modules
//!
//! - [`config`]: serde-facing system description for files
//! - [`error`]: crate-wide error and result types
//! - [`flow`]: flow attributes and their builder
//! - [`grouping`]: keyed classification of nodes and flows
//! - [`sequence`]: the scalar-or-vector normalizer
//! - [`timeindex`]: the time axis

pub mod config;
pub mod error;
pub mod flow;
pub mod grouping;
pub mod sequence;
pub mod timeindex;

use std::collections::BTreeSet;

use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction, Graph};
use serde::{Deserialize, Serialize};

pub use error::{EmsolError, EmsolResult};
pub use flow::{
    Flow, FlowBuilder, Gradient, Investment, MultiObjective, MultiObjectiveTerm, NonConvex,
};
pub use grouping::{compute_groups, default_groupings, groups, Grouping, Groups};
pub use petgraph::graph::{EdgeIndex, NodeIndex};
pub use sequence::Sequence;
pub use timeindex::TimeIndex;

/// A balance point. Everything produced at a bus must be consumed at it,
/// per timestep; with [`Bus::with_substance_balance`] the balance is kept
/// per declared substance instead of in aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    pub label: String,
    /// Balance each declared substance separately instead of the sums.
    pub substance_balance: bool,
}

impl Bus {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            substance_balance: false,
        }
    }

    /// Switch the bus to per-substance balancing.
    pub fn with_substance_balance(mut self) -> Self {
        self.substance_balance = true;
        self
    }
}

/// A node that only produces: its flows point away from it, and attaching
/// an inbound flow is rejected by [`EnergySystem::add_flow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
}

impl Source {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// A node that only consumes: the mirror image of [`Source`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sink {
    pub label: String,
}

impl Sink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// A node coupling its inputs to its outputs through conversion factors.
///
/// For every (input flow i, output flow o) pair and timestep the model adds
/// `flow[i] · factor[o][t] == flow[o] · factor[i][t]`, so the factors are
/// relative efficiencies. A connected node without an entry in
/// `conversion_factors` gets factor 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Converter {
    pub label: String,
    /// Conversion factor per connected node label (absent = 1).
    pub conversion_factors: std::collections::BTreeMap<String, Sequence>,
}

impl Converter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            conversion_factors: std::collections::BTreeMap::new(),
        }
    }

    /// Set the conversion factor toward (or from) the node named `node`.
    pub fn with_factor(mut self, node: impl Into<String>, factor: impl Into<Sequence>) -> Self {
        self.conversion_factors.insert(node.into(), factor.into());
        self
    }
}

/// Node weight of the energy system graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Bus(Bus),
    Source(Source),
    Sink(Sink),
    Converter(Converter),
}

impl Node {
    /// The node's unique label.
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.label,
            Node::Source(source) => &source.label,
            Node::Sink(sink) => &sink.label,
            Node::Converter(converter) => &converter.label,
        }
    }

    pub fn as_converter(&self) -> Option<&Converter> {
        match self {
            Node::Converter(converter) => Some(converter),
            _ => None,
        }
    }
}

impl From<Bus> for Node {
    fn from(bus: Bus) -> Self {
        Node::Bus(bus)
    }
}

impl From<Source> for Node {
    fn from(source: Source) -> Self {
        Node::Source(source)
    }
}

impl From<Sink> for Node {
    fn from(sink: Sink) -> Self {
        Node::Sink(sink)
    }
}

impl From<Converter> for Node {
    fn from(converter: Converter) -> Self {
        Node::Converter(converter)
    }
}

/// The energy system: a directed graph of nodes connected by flows, plus
/// the time axis, the declared substances, and the grouping list.
///
/// Flows point from producer to consumer. A flow marked `bidirectional`
/// keeps its edge direction but may take negative values.
#[derive(Debug, Clone)]
pub struct EnergySystem {
    pub graph: Graph<Node, Flow, Directed>,
    timeindex: TimeIndex,
    substances: BTreeSet<String>,
    timeincrement: Option<Sequence>,
    groupings: Vec<Grouping>,
}

impl EnergySystem {
    /// New empty system over the given horizon, with the default groupings
    /// installed. Use [`EnergySystem::with_groupings`] to append custom
    /// ones.
    pub fn new(timeindex: TimeIndex) -> Self {
        Self {
            graph: Graph::new(),
            timeindex,
            substances: BTreeSet::new(),
            timeincrement: None,
            groupings: default_groupings(),
        }
    }

    /// Declare the substances flows may carry concentrations for.
    pub fn with_substances<I>(mut self, substances: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.substances
            .extend(substances.into_iter().map(Into::into));
        self
    }

    /// Append groupings after the defaults. Their groups are computed in
    /// list order on every [`EnergySystem::groups`] call.
    pub fn with_groupings(mut self, groupings: Vec<Grouping>) -> Self {
        self.groupings.extend(groupings);
        self
    }

    /// Override the derived per-step duration, e.g. for non-hour units.
    /// The override weights time-integral constraints and the default
    /// objective exactly like the derived value would.
    pub fn with_timeincrement(mut self, timeincrement: impl Into<Sequence>) -> Self {
        self.timeincrement = Some(timeincrement.into());
        self
    }

    /// Add a node and return its index. Duplicate labels are not rejected
    /// here; the identity grouping reports them as a fatal error when
    /// groups are computed.
    pub fn add_node(&mut self, node: impl Into<Node>) -> NodeIndex {
        self.graph.add_node(node.into())
    }

    /// Connect `source` to `target` with the given flow.
    ///
    /// Rejects flows into a [`Source`], flows out of a [`Sink`], a second
    /// flow over an existing (source, target) pair, and substance
    /// concentrations for substances the system never declared.
    pub fn add_flow(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        flow: Flow,
    ) -> EmsolResult<EdgeIndex> {
        let source_node = self
            .graph
            .node_weight(source)
            .ok_or_else(|| EmsolError::Validation("unknown source node index".into()))?;
        let target_node = self
            .graph
            .node_weight(target)
            .ok_or_else(|| EmsolError::Validation("unknown target node index".into()))?;

        if let Node::Sink(sink) = source_node {
            return Err(EmsolError::Validation(format!(
                "sink \"{}\" cannot be the source of a flow: sinks take no outputs",
                sink.label
            )));
        }
        if let Node::Source(src) = target_node {
            return Err(EmsolError::Validation(format!(
                "source \"{}\" cannot be the target of a flow: sources take no inputs",
                src.label
            )));
        }
        if self.graph.find_edge(source, target).is_some() {
            return Err(EmsolError::Validation(format!(
                "a flow from \"{}\" to \"{}\" already exists",
                source_node.label(),
                target_node.label()
            )));
        }

        let undeclared: Vec<&str> = flow
            .substances
            .keys()
            .filter(|s| !self.substances.contains(*s))
            .map(String::as_str)
            .collect();
        if !undeclared.is_empty() {
            return Err(EmsolError::Substance(format!(
                "flow from \"{}\" to \"{}\" declares substances not on the energy system: {}",
                source_node.label(),
                target_node.label(),
                undeclared.join(", ")
            )));
        }

        Ok(self.graph.add_edge(source, target, flow))
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.graph[index]
    }

    /// The label of the node at `index`.
    pub fn label(&self, index: NodeIndex) -> &str {
        self.graph[index].label()
    }

    /// Look a node up by label.
    pub fn find_node(&self, label: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&i| self.graph[i].label() == label)
    }

    pub fn flow(&self, edge: EdgeIndex) -> &Flow {
        &self.graph[edge]
    }

    /// The (source, target) node pair of a flow edge.
    pub fn endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        self.graph
            .edge_endpoints(edge)
            .expect("edge index from this graph")
    }

    /// All flows in insertion order as (edge, source, target, flow).
    pub fn flows(&self) -> impl Iterator<Item = (EdgeIndex, NodeIndex, NodeIndex, &Flow)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.id(), e.source(), e.target(), e.weight()))
    }

    /// Inbound flows of a node as (edge, producing node).
    pub fn inputs(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.id(), e.source()))
            .collect()
    }

    /// Outbound flows of a node as (edge, consuming node).
    pub fn outputs(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect()
    }

    pub fn timeindex(&self) -> &TimeIndex {
        &self.timeindex
    }

    pub fn substances(&self) -> &BTreeSet<String> {
        &self.substances
    }

    /// Hours per timestep: the override if one was set, otherwise derived
    /// from the time-index step width.
    pub fn timeincrement(&self) -> EmsolResult<Sequence> {
        match &self.timeincrement {
            Some(sequence) => Ok(sequence.clone()),
            None => Ok(Sequence::Scalar(self.timeindex.increment_hours()?)),
        }
    }

    /// Run the grouping list over the current graph.
    pub fn groups(&self) -> EmsolResult<Groups> {
        compute_groups(self, &self.groupings)
    }

    /// Length-check every per-timestep sequence against the horizon and
    /// every conversion factor against the converter's actual connections.
    ///
    /// The model layer calls this before creating variables, so block
    /// builders may index sequences without re-checking.
    pub fn validate(&self) -> EmsolResult<()> {
        let len = self.timeindex.len();
        if let Some(timeincrement) = &self.timeincrement {
            timeincrement.check_len(len, "timeincrement")?;
        }

        for (_, source, target, flow) in self.flows() {
            let name = format!("flow \"{}\" -> \"{}\"", self.label(source), self.label(target));
            self.check_flow_sequences(flow, &name, len)?;
        }

        for index in self.graph.node_indices() {
            let Node::Converter(converter) = &self.graph[index] else {
                continue;
            };
            let connected: BTreeSet<&str> = self
                .inputs(index)
                .into_iter()
                .map(|(_, n)| self.label(n))
                .chain(self.outputs(index).into_iter().map(|(_, n)| self.label(n)))
                .collect();
            for (node_label, factor) in &converter.conversion_factors {
                if !connected.contains(node_label.as_str()) {
                    return Err(EmsolError::Validation(format!(
                        "converter \"{}\": conversion factor references \"{}\" which is not \
                         connected by any flow",
                        converter.label, node_label
                    )));
                }
                factor.check_len(
                    len,
                    &format!(
                        "converter \"{}\": conversion factor toward \"{}\"",
                        converter.label, node_label
                    ),
                )?;
            }
        }
        Ok(())
    }

    fn check_flow_sequences(&self, flow: &Flow, name: &str, len: usize) -> EmsolResult<()> {
        flow.min.check_len(len, &format!("{name}: min"))?;
        flow.max.check_len(len, &format!("{name}: max"))?;
        if let Some(fix) = &flow.fix {
            fix.check_len(len, &format!("{name}: fix"))?;
        }
        flow.variable_costs
            .check_len(len, &format!("{name}: variable_costs"))?;
        if let Some(ub) = &flow.positive_gradient.ub {
            ub.check_len(len, &format!("{name}: positive_gradient ub"))?;
        }
        if let Some(ub) = &flow.negative_gradient.ub {
            ub.check_len(len, &format!("{name}: negative_gradient ub"))?;
        }
        if let Some(nonconvex) = &flow.nonconvex {
            for (sequence, what) in [
                (&nonconvex.startup_costs, "startup_costs"),
                (&nonconvex.shutdown_costs, "shutdown_costs"),
                (&nonconvex.activity_costs, "activity_costs"),
            ] {
                if let Some(sequence) = sequence {
                    sequence.check_len(len, &format!("{name}: {what}"))?;
                }
            }
            if let Some(ub) = &nonconvex.positive_gradient.ub {
                ub.check_len(len, &format!("{name}: nonconvex positive_gradient ub"))?;
            }
            if let Some(ub) = &nonconvex.negative_gradient.ub {
                ub.check_len(len, &format!("{name}: nonconvex negative_gradient ub"))?;
            }
        }
        if let Some(multiobjective) = &flow.multiobjective {
            for (objective, term) in &multiobjective.objectives {
                if let Some(costs) = &term.variable_costs {
                    costs.check_len(
                        len,
                        &format!("{name}: variable_costs for objective \"{objective}\""),
                    )?;
                }
                if let Some(ub) = &term.positive_gradient.ub {
                    ub.check_len(
                        len,
                        &format!("{name}: positive_gradient ub for objective \"{objective}\""),
                    )?;
                }
                if let Some(ub) = &term.negative_gradient.ub {
                    ub.check_len(
                        len,
                        &format!("{name}: negative_gradient ub for objective \"{objective}\""),
                    )?;
                }
            }
        }
        for (substance, concentration) in &flow.substances {
            concentration.check_len(
                len,
                &format!("{name}: concentration of \"{substance}\""),
            )?;
        }
        Ok(())
    }

    /// Compute basic statistics about the system.
    pub fn stats(&self) -> SystemStats {
        let mut stats = SystemStats::default();
        for node in self.graph.node_weights() {
            match node {
                Node::Bus(bus) if bus.substance_balance => stats.num_substance_buses += 1,
                Node::Bus(_) => stats.num_buses += 1,
                Node::Source(_) => stats.num_sources += 1,
                Node::Sink(_) => stats.num_sinks += 1,
                Node::Converter(_) => stats.num_converters += 1,
            }
        }
        stats.num_flows = self.graph.edge_count();
        stats.num_substances = self.substances.len();
        stats.num_timesteps = self.timeindex.len();
        stats
    }
}

/// Statistics about a system's size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemStats {
    pub num_buses: usize,
    pub num_substance_buses: usize,
    pub num_sources: usize,
    pub num_sinks: usize,
    pub num_converters: usize,
    pub num_flows: usize,
    pub num_substances: usize,
    pub num_timesteps: usize,
}

impl std::fmt::Display for SystemStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses ({} substance-balanced), {} sources, {} sinks, {} converters, \
             {} flows over {} timesteps",
            self.num_buses + self.num_substance_buses,
            self.num_substance_buses,
            self.num_sources,
            self.num_sinks,
            self.num_converters,
            self.num_flows,
            self.num_timesteps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn index(periods: usize) -> TimeIndex {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TimeIndex::hourly(start, periods).unwrap()
    }

    #[test]
    fn test_system_creation() {
        let mut es = EnergySystem::new(index(3));
        let bus = es.add_node(Bus::new("el"));
        let pv = es.add_node(Source::new("pv"));
        let demand = es.add_node(Sink::new("demand"));

        es.add_flow(pv, bus, Flow::new()).unwrap();
        es.add_flow(bus, demand, Flow::new()).unwrap();

        assert_eq!(es.graph.node_count(), 3);
        assert_eq!(es.graph.edge_count(), 2);
        assert_eq!(es.label(bus), "el");
        assert_eq!(es.find_node("pv"), Some(pv));
        assert_eq!(es.find_node("wind"), None);

        let stats = es.stats();
        assert_eq!(stats.num_buses, 1);
        assert_eq!(stats.num_sources, 1);
        assert_eq!(stats.num_sinks, 1);
        assert_eq!(stats.num_flows, 2);
        assert_eq!(format!("{stats}"), "1 buses (0 substance-balanced), 1 sources, 1 sinks, 0 converters, 2 flows over 3 timesteps");
    }

    #[test]
    fn test_source_takes_no_inputs() {
        let mut es = EnergySystem::new(index(3));
        let bus = es.add_node(Bus::new("el"));
        let pv = es.add_node(Source::new("pv"));

        let err = es.add_flow(bus, pv, Flow::new()).unwrap_err();
        assert!(err.to_string().contains("sources take no inputs"));
    }

    #[test]
    fn test_sink_takes_no_outputs() {
        let mut es = EnergySystem::new(index(3));
        let bus = es.add_node(Bus::new("el"));
        let demand = es.add_node(Sink::new("demand"));

        let err = es.add_flow(demand, bus, Flow::new()).unwrap_err();
        assert!(err.to_string().contains("sinks take no outputs"));
    }

    #[test]
    fn test_parallel_flow_rejected() {
        let mut es = EnergySystem::new(index(3));
        let bus = es.add_node(Bus::new("el"));
        let pv = es.add_node(Source::new("pv"));

        es.add_flow(pv, bus, Flow::new()).unwrap();
        let err = es.add_flow(pv, bus, Flow::new()).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");
    }

    #[test]
    fn test_undeclared_substance_rejected() {
        let mut es = EnergySystem::new(index(3)).with_substances(["co2"]);
        let bus = es.add_node(Bus::new("gas"));
        let well = es.add_node(Source::new("well"));

        let flow = Flow::builder()
            .substance("co2", 0.2)
            .substance("ch4", 0.8)
            .build()
            .unwrap();
        let err = es.add_flow(well, bus, flow).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ch4"), "message was: {msg}");
        assert!(!msg.contains("co2,"), "declared substance listed: {msg}");
    }

    #[test]
    fn test_inputs_outputs() {
        let mut es = EnergySystem::new(index(3));
        let bus = es.add_node(Bus::new("el"));
        let pv = es.add_node(Source::new("pv"));
        let wind = es.add_node(Source::new("wind"));
        let demand = es.add_node(Sink::new("demand"));

        es.add_flow(pv, bus, Flow::new()).unwrap();
        es.add_flow(wind, bus, Flow::new()).unwrap();
        es.add_flow(bus, demand, Flow::new()).unwrap();

        let ins: Vec<NodeIndex> = es.inputs(bus).into_iter().map(|(_, n)| n).collect();
        assert_eq!(ins.len(), 2);
        assert!(ins.contains(&pv) && ins.contains(&wind));
        let outs = es.outputs(bus);
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].1, demand);
    }

    #[test]
    fn test_timeincrement_derived_and_overridden() {
        let es = EnergySystem::new(index(3));
        assert_eq!(es.timeincrement().unwrap(), Sequence::Scalar(1.0));

        let es = EnergySystem::new(index(3)).with_timeincrement(vec![1.0, 2.0, 0.5]);
        assert_eq!(
            es.timeincrement().unwrap(),
            Sequence::Values(vec![1.0, 2.0, 0.5])
        );
    }

    #[test]
    fn test_validate_catches_bad_sequence_length() {
        let mut es = EnergySystem::new(index(3));
        let bus = es.add_node(Bus::new("el"));
        let pv = es.add_node(Source::new("pv"));
        es.add_flow(
            pv,
            bus,
            Flow::builder()
                .nominal_value(10.0)
                .fix(vec![0.5, 0.5])
                .build()
                .unwrap(),
        )
        .unwrap();

        let err = es.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("fix"), "message was: {msg}");
        assert!(msg.contains('2') && msg.contains('3'), "message was: {msg}");
    }

    #[test]
    fn test_validate_catches_unconnected_conversion_factor() {
        let mut es = EnergySystem::new(index(3));
        let gas = es.add_node(Bus::new("gas"));
        let heat = es.add_node(Bus::new("heat"));
        let boiler = es.add_node(
            Converter::new("boiler")
                .with_factor("heat", 0.9)
                .with_factor("district", 0.5),
        );
        es.add_flow(gas, boiler, Flow::new()).unwrap();
        es.add_flow(boiler, heat, Flow::new()).unwrap();

        let err = es.validate().unwrap_err();
        assert!(err.to_string().contains("district"), "{err}");
    }

    #[test]
    fn test_validate_accepts_scalar_sequences() {
        let mut es = EnergySystem::new(index(3)).with_substances(["co2"]);
        let gas = es.add_node(Bus::new("gas"));
        let heat = es.add_node(Bus::new("heat"));
        let boiler = es.add_node(Converter::new("boiler").with_factor("heat", 0.9));
        es.add_flow(
            gas,
            boiler,
            Flow::builder()
                .nominal_value(50.0)
                .substance("co2", 0.2)
                .build()
                .unwrap(),
        )
        .unwrap();
        es.add_flow(boiler, heat, Flow::new()).unwrap();

        es.validate().unwrap();
    }
}
