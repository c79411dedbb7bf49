//! File-facing system description.
//!
//! A [`SystemConfig`] is the serde image of an energy system: a time index,
//! declared substances, node records, and flow records referencing nodes by
//! label. [`resolve_system`] turns it into an [`EnergySystem`], running the
//! same construction-time validation a programmatic caller would hit.
//!
//! Unknown keys are rejected by serde; removed or renamed keys of earlier
//! description versions are kept as explicit fields so their rejection can
//! name the replacement instead of just "unknown field".

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EmsolError, EmsolResult};
use crate::flow::{Flow, Gradient, Investment, MultiObjective, MultiObjectiveTerm, NonConvex};
use crate::sequence::Sequence;
use crate::timeindex::TimeIndex;
use crate::{Bus, Converter, EnergySystem, Sink, Source};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    pub timeindex: TimeIndexConfig,
    #[serde(default)]
    pub substances: Vec<String>,
    /// Override for the derived hours-per-step weighting.
    #[serde(default)]
    pub timeincrement: Option<Sequence>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub flows: Vec<FlowConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeIndexConfig {
    /// Horizon start, `2026-01-01T00:00:00` or `2026-01-01 00:00:00`.
    pub start: String,
    #[serde(default = "default_step_hours")]
    pub step_hours: f64,
    pub periods: usize,
}

fn default_step_hours() -> f64 {
    1.0
}

/// One node record. `substance_balance` only makes sense for buses and
/// `conversion_factors` only for converters; the resolver rejects them
/// elsewhere instead of silently ignoring them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub substance_balance: bool,
    #[serde(default)]
    pub conversion_factors: BTreeMap<String, Sequence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Bus,
    Source,
    Sink,
    Converter,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradientConfig {
    #[serde(default)]
    pub ub: Option<Sequence>,
    #[serde(default)]
    pub costs: f64,
}

impl GradientConfig {
    fn resolve(&self) -> Gradient {
        Gradient {
            ub: self.ub.clone(),
            costs: self.costs,
        }
    }
}

fn resolve_gradient(config: &Option<GradientConfig>) -> Gradient {
    config.as_ref().map(GradientConfig::resolve).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvestmentConfig {
    pub ep_costs: f64,
    #[serde(default)]
    pub existing: f64,
    #[serde(default)]
    pub minimum: f64,
    #[serde(default = "default_maximum")]
    pub maximum: f64,
}

fn default_maximum() -> f64 {
    f64::INFINITY
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonConvexConfig {
    #[serde(default)]
    pub startup_costs: Option<Sequence>,
    #[serde(default)]
    pub shutdown_costs: Option<Sequence>,
    #[serde(default)]
    pub activity_costs: Option<Sequence>,
    #[serde(default)]
    pub positive_gradient: Option<GradientConfig>,
    #[serde(default)]
    pub negative_gradient: Option<GradientConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveTermConfig {
    #[serde(default)]
    pub variable_costs: Option<Sequence>,
    #[serde(default)]
    pub positive_gradient: Option<GradientConfig>,
    #[serde(default)]
    pub negative_gradient: Option<GradientConfig>,
}

/// One flow record, source and target by node label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowConfig {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub nominal_value: Option<f64>,
    #[serde(default)]
    pub min: Option<Sequence>,
    #[serde(default)]
    pub max: Option<Sequence>,
    #[serde(default)]
    pub fix: Option<Sequence>,
    #[serde(default)]
    pub variable_costs: Option<Sequence>,
    #[serde(default)]
    pub summed_max: Option<f64>,
    #[serde(default)]
    pub summed_min: Option<f64>,
    #[serde(default)]
    pub positive_gradient: Option<GradientConfig>,
    #[serde(default)]
    pub negative_gradient: Option<GradientConfig>,
    #[serde(default)]
    pub integer: bool,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub investment: Option<InvestmentConfig>,
    #[serde(default)]
    pub nonconvex: Option<NonConvexConfig>,
    #[serde(default)]
    pub multiobjective: Option<BTreeMap<String, ObjectiveTermConfig>>,
    #[serde(default)]
    pub substances: BTreeMap<String, Sequence>,

    // Removed and renamed attributes of earlier description versions.
    // Accepted by serde so the resolver can name the replacement.
    #[serde(default, skip_serializing)]
    fixed_costs: Option<serde_json::Value>,
    #[serde(default, skip_serializing)]
    actual_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing)]
    fixed: Option<bool>,
}

/// Load a system description from a YAML or JSON file, by extension, with
/// a parse-both fallback for anything else.
pub fn load_system_from_path(path: &Path) -> EmsolResult<SystemConfig> {
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data)
                .map_err(|e| EmsolError::Config(format!("parsing system description yaml: {e}")))
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(serde_json::from_str(&data)?),
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .map_err(|e| EmsolError::Config(format!("parsing system description: {e}"))),
    }
}

/// Build the [`EnergySystem`] a configuration describes.
pub fn resolve_system(config: &SystemConfig) -> EmsolResult<EnergySystem> {
    let timeindex = resolve_timeindex(&config.timeindex)?;
    let mut system = EnergySystem::new(timeindex).with_substances(config.substances.clone());
    if let Some(timeincrement) = &config.timeincrement {
        system = system.with_timeincrement(timeincrement.clone());
    }

    let mut by_label = BTreeMap::new();
    for node in &config.nodes {
        if node.label.trim().is_empty() {
            return Err(EmsolError::Config("node label cannot be empty".into()));
        }
        if node.substance_balance && node.kind != NodeKind::Bus {
            return Err(EmsolError::Config(format!(
                "node \"{}\": substance_balance is only valid on buses",
                node.label
            )));
        }
        if !node.conversion_factors.is_empty() && node.kind != NodeKind::Converter {
            return Err(EmsolError::Config(format!(
                "node \"{}\": conversion_factors are only valid on converters",
                node.label
            )));
        }
        let index = match node.kind {
            NodeKind::Bus if node.substance_balance => {
                system.add_node(Bus::new(&node.label).with_substance_balance())
            }
            NodeKind::Bus => system.add_node(Bus::new(&node.label)),
            NodeKind::Source => system.add_node(Source::new(&node.label)),
            NodeKind::Sink => system.add_node(Sink::new(&node.label)),
            NodeKind::Converter => {
                let mut converter = Converter::new(&node.label);
                converter.conversion_factors = node.conversion_factors.clone();
                system.add_node(converter)
            }
        };
        if by_label.insert(node.label.clone(), index).is_some() {
            return Err(EmsolError::Config(format!(
                "duplicate node label \"{}\" in system description",
                node.label
            )));
        }
    }

    for flow in &config.flows {
        let source = *by_label.get(&flow.source).ok_or_else(|| {
            EmsolError::Config(format!(
                "flow references unknown source node \"{}\"",
                flow.source
            ))
        })?;
        let target = *by_label.get(&flow.target).ok_or_else(|| {
            EmsolError::Config(format!(
                "flow references unknown target node \"{}\"",
                flow.target
            ))
        })?;
        system.add_flow(source, target, resolve_flow(flow)?)?;
    }
    Ok(system)
}

fn resolve_timeindex(config: &TimeIndexConfig) -> EmsolResult<TimeIndex> {
    let start = NaiveDateTime::parse_from_str(&config.start, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&config.start, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| {
            EmsolError::Config(format!(
                "cannot parse time index start \"{}\"; use 2026-01-01T00:00:00",
                config.start
            ))
        })?;
    if !config.step_hours.is_finite() || config.step_hours <= 0.0 {
        return Err(EmsolError::Config(format!(
            "time index step_hours must be positive, got {}",
            config.step_hours
        )));
    }
    let step = chrono::Duration::milliseconds((config.step_hours * 3_600_000.0).round() as i64);
    TimeIndex::new(start, step, config.periods)
}

fn resolve_flow(config: &FlowConfig) -> EmsolResult<Flow> {
    if config.fixed_costs.is_some() {
        return Err(EmsolError::Config(format!(
            "flow \"{}\" -> \"{}\": the `fixed_costs` attribute has been removed; price \
             capacity through investment ep_costs instead",
            config.source, config.target
        )));
    }
    if config.actual_value.is_some() {
        return Err(EmsolError::Config(format!(
            "flow \"{}\" -> \"{}\": the `actual_value` attribute has been renamed to `fix`",
            config.source, config.target
        )));
    }
    if config.fixed.is_some() {
        warn!(
            source = %config.source,
            target = %config.target,
            "the `fixed` attribute is deprecated and changes nothing; passing `fix` already \
             fixes the flow variable"
        );
    }

    let mut builder = Flow::builder();
    if let Some(nominal_value) = config.nominal_value {
        builder = builder.nominal_value(nominal_value);
    }
    if let Some(min) = &config.min {
        builder = builder.min(min.clone());
    }
    if let Some(max) = &config.max {
        builder = builder.max(max.clone());
    }
    if let Some(fix) = &config.fix {
        builder = builder.fix(fix.clone());
    }
    if let Some(costs) = &config.variable_costs {
        builder = builder.variable_costs(costs.clone());
    }
    if let Some(bound) = config.summed_max {
        builder = builder.summed_max(bound);
    }
    if let Some(bound) = config.summed_min {
        builder = builder.summed_min(bound);
    }
    if let Some(gradient) = &config.positive_gradient {
        builder = builder.positive_gradient(gradient.resolve());
    }
    if let Some(gradient) = &config.negative_gradient {
        builder = builder.negative_gradient(gradient.resolve());
    }
    if config.integer {
        builder = builder.integer();
    }
    if config.bidirectional {
        builder = builder.bidirectional();
    }
    if let Some(investment) = &config.investment {
        builder = builder.investment(
            Investment::new(investment.ep_costs)
                .with_existing(investment.existing)
                .with_limits(investment.minimum, investment.maximum),
        );
    }
    if let Some(nonconvex) = &config.nonconvex {
        builder = builder.nonconvex(NonConvex {
            startup_costs: nonconvex.startup_costs.clone(),
            shutdown_costs: nonconvex.shutdown_costs.clone(),
            activity_costs: nonconvex.activity_costs.clone(),
            positive_gradient: resolve_gradient(&nonconvex.positive_gradient),
            negative_gradient: resolve_gradient(&nonconvex.negative_gradient),
        });
    }
    if let Some(objectives) = &config.multiobjective {
        let mut multiobjective = MultiObjective::new();
        for (name, term) in objectives {
            multiobjective = multiobjective.term(
                name.clone(),
                MultiObjectiveTerm {
                    variable_costs: term.variable_costs.clone(),
                    positive_gradient: resolve_gradient(&term.positive_gradient),
                    negative_gradient: resolve_gradient(&term.negative_gradient),
                },
            );
        }
        builder = builder.multiobjective(multiobjective);
    }
    for (substance, concentration) in &config.substances {
        builder = builder.substance(substance.clone(), concentration.clone());
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_json(flows: &str) -> String {
        format!(
            r#"{{
                "timeindex": {{ "start": "2026-01-01T00:00:00", "periods": 4 }},
                "substances": ["co2"],
                "nodes": [
                    {{ "label": "gas", "type": "bus" }},
                    {{ "label": "well", "type": "source" }},
                    {{ "label": "demand", "type": "sink" }}
                ],
                "flows": [{flows}]
            }}"#
        )
    }

    #[test]
    fn test_resolve_minimal_system() {
        let json = minimal_json(
            r#"{ "source": "well", "target": "gas", "nominal_value": 10.0,
                 "substances": { "co2": 0.2 } },
               { "source": "gas", "target": "demand", "nominal_value": 5.0, "fix": 1.0 }"#,
        );
        let config: SystemConfig = serde_json::from_str(&json).unwrap();
        let system = resolve_system(&config).unwrap();

        assert_eq!(system.stats().num_flows, 2);
        assert_eq!(system.timeindex().len(), 4);
        assert!(system.substances().contains("co2"));
        system.validate().unwrap();
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let json = minimal_json(
            r#"{ "source": "well", "target": "gas", "nominal_valeu": 10.0 }"#,
        );
        let err = serde_json::from_str::<SystemConfig>(&json).unwrap_err();
        assert!(err.to_string().contains("nominal_valeu"), "{err}");
    }

    #[test]
    fn test_removed_attribute_names_replacement() {
        let json = minimal_json(
            r#"{ "source": "well", "target": "gas", "fixed_costs": 4.0 }"#,
        );
        let config: SystemConfig = serde_json::from_str(&json).unwrap();
        let err = resolve_system(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("fixed_costs"), "message was: {msg}");
        assert!(msg.contains("investment"), "message was: {msg}");
    }

    #[test]
    fn test_renamed_attribute_names_new_name() {
        let json = minimal_json(
            r#"{ "source": "well", "target": "gas", "actual_value": [1.0, 1.0, 1.0, 1.0] }"#,
        );
        let config: SystemConfig = serde_json::from_str(&json).unwrap();
        let err = resolve_system(&config).unwrap_err();
        assert!(err.to_string().contains("renamed to `fix`"), "{err}");
    }

    #[test]
    fn test_unknown_flow_endpoint() {
        let json = minimal_json(r#"{ "source": "wel", "target": "gas" }"#);
        let config: SystemConfig = serde_json::from_str(&json).unwrap();
        let err = resolve_system(&config).unwrap_err();
        assert!(err.to_string().contains("\"wel\""), "{err}");
    }

    #[test]
    fn test_substance_balance_only_on_buses() {
        let json = r#"{
            "timeindex": { "start": "2026-01-01T00:00:00", "periods": 2 },
            "nodes": [ { "label": "well", "type": "source", "substance_balance": true } ]
        }"#;
        let config: SystemConfig = serde_json::from_str(json).unwrap();
        let err = resolve_system(&config).unwrap_err();
        assert!(err.to_string().contains("only valid on buses"), "{err}");
    }

    #[test]
    fn test_yaml_roundtrip_through_file() {
        let yaml = r#"
timeindex:
  start: 2026-01-01T00:00:00
  step_hours: 12.0
  periods: 2
nodes:
  - label: heat
    type: bus
  - label: plant
    type: converter
    conversion_factors:
      heat: 0.9
flows:
  - source: plant
    target: heat
    nominal_value: 20.0
    variable_costs: [3.0, 4.0]
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let config = load_system_from_path(file.path()).unwrap();
        let system = resolve_system(&config).unwrap();

        assert_eq!(system.timeindex().increment_hours().unwrap(), 12.0);
        assert_eq!(system.stats().num_converters, 1);
        system.validate().unwrap();
    }
}
