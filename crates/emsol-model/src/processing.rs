//! Extraction of solved variable values into per-flow result tables.
//!
//! [`extract_results`] walks the model's variable table and regroups the
//! flat solution vector by flow: each `(source, target)` pair gets a
//! [`FlowResults`] with one sequence per block variable family plus the
//! investment scalar. Iteration order is deterministic (sorted keys), so
//! exports are byte-stable across runs.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use emsol_core::{EdgeIndex, EmsolError, EmsolResult, EnergySystem};

use crate::model::Model;
use crate::program::VarId;
use crate::solver::SolveResult;

/// Per-flow slice of a solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowResults {
    /// Per-timestep series keyed by attribute name; `"flow"` is always
    /// present, auxiliary block variables appear under their own names
    /// (`positive_gradient`, `status`, `substance_flow[s]`, ...).
    pub sequences: BTreeMap<String, Vec<f64>>,
    /// One-off values, currently the optimized `invest` capacity.
    pub scalars: BTreeMap<String, f64>,
}

/// Solution of a solved model, regrouped for lookup by flow and bus.
#[derive(Debug, Clone)]
pub struct Results {
    /// Timestamps of the horizon, aligned with every sequence.
    pub timestamps: Vec<NaiveDateTime>,
    /// `(source_label, target_label)` to the flow's solution slice.
    pub flows: BTreeMap<(String, String), FlowResults>,
    /// Bus-balance shadow prices per bus label. Empty unless duals were
    /// requested and the backend supplied them.
    pub duals: BTreeMap<String, Vec<f64>>,
    /// Objective value reported by the backend.
    pub objective: Option<f64>,
    /// Every cost bucket evaluated at the solution, keyed by objective name.
    pub objective_values: BTreeMap<String, f64>,
}

impl Results {
    /// Solution slice of the flow between two labelled nodes.
    pub fn flow(&self, source: &str, target: &str) -> Option<&FlowResults> {
        self.flows
            .get(&(source.to_string(), target.to_string()))
    }

    /// Convert to a JSON value.
    ///
    /// Flow keys become `"source->target"` strings so the map survives the
    /// trip through JSON objects.
    pub fn to_json_value(&self) -> anyhow::Result<serde_json::Value> {
        let mut flows = serde_json::Map::new();
        for ((source, target), record) in &self.flows {
            flows.insert(
                format!("{source}->{target}"),
                serde_json::to_value(record).context("serializing flow results to JSON")?,
            );
        }
        let mut root = serde_json::Map::new();
        root.insert(
            "timestamps".into(),
            serde_json::to_value(&self.timestamps).context("serializing timestamps to JSON")?,
        );
        root.insert(
            "objective".into(),
            serde_json::to_value(self.objective).context("serializing objective to JSON")?,
        );
        root.insert(
            "objective_values".into(),
            serde_json::to_value(&self.objective_values)
                .context("serializing objective values to JSON")?,
        );
        root.insert("flows".into(), serde_json::Value::Object(flows));
        root.insert(
            "duals".into(),
            serde_json::to_value(&self.duals).context("serializing duals to JSON")?,
        );
        Ok(serde_json::Value::Object(root))
    }

    /// Export to JSON format
    pub fn to_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json_value()?)
            .context("serializing results to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing JSON to {}", path.display()))?;
        Ok(())
    }
}

impl Model<'_> {
    /// Extract results from the most recent solve.
    pub fn results(&self) -> EmsolResult<Results> {
        let result = self.last_result().ok_or_else(|| {
            EmsolError::Solver("no stored solve result; call solve() first".into())
        })?;
        extract_results(self, result)
    }
}

/// Regroup a solution vector into per-flow sequences and scalars.
///
/// Fails when the result carries no variable assignment, which is what a
/// non-optimal solve leaves behind.
pub fn extract_results(model: &Model<'_>, result: &SolveResult) -> EmsolResult<Results> {
    if result.values.is_empty() {
        return Err(EmsolError::Solver(format!(
            "no solution values to extract; the solve ended with {}",
            result.termination
        )));
    }
    let system = model.system();
    let vars = model.variables();
    let values = &result.values;

    let mut flows: BTreeMap<(String, String), FlowResults> = BTreeMap::new();
    for (edge, ids) in &vars.flow {
        let entry = flows.entry(flow_key(system, *edge)).or_default();
        entry.sequences.insert("flow".into(), series(values, ids));
        if let Some(reduced_costs) = &result.reduced_costs {
            entry.sequences.insert("rc".into(), series(reduced_costs, ids));
        }
    }
    let families: [(&str, &BTreeMap<EdgeIndex, Vec<VarId>>); 6] = [
        ("positive_gradient", &vars.positive_gradient),
        ("negative_gradient", &vars.negative_gradient),
        ("status", &vars.status),
        ("startup", &vars.startup),
        ("shutdown", &vars.shutdown),
        ("integer", &vars.integer_flow),
    ];
    for (name, family) in families {
        for (edge, ids) in family {
            let entry = flows.entry(flow_key(system, *edge)).or_default();
            entry.sequences.insert(name.to_string(), series(values, ids));
        }
    }
    for ((edge, substance), ids) in &vars.substance_flow {
        let entry = flows.entry(flow_key(system, *edge)).or_default();
        entry
            .sequences
            .insert(format!("substance_flow[{substance}]"), series(values, ids));
    }
    for (edge, id) in &vars.invest {
        let entry = flows.entry(flow_key(system, *edge)).or_default();
        entry
            .scalars
            .insert("invest".into(), values.get(id.0).copied().unwrap_or(0.0));
    }

    let mut duals = BTreeMap::new();
    if let Some(dual_values) = &result.duals {
        for (bus, rows) in &vars.balance_rows {
            let prices: Vec<f64> = rows
                .iter()
                .map(|&row| dual_values.get(row).copied().unwrap_or(f64::NAN))
                .collect();
            duals.insert(bus.clone(), prices);
        }
    }

    Ok(Results {
        timestamps: system.timeindex().timestamps().collect(),
        flows,
        duals,
        objective: result.objective,
        objective_values: model.objective_values(result),
    })
}

fn flow_key(system: &EnergySystem, edge: EdgeIndex) -> (String, String) {
    let (source, target) = system.endpoints(edge);
    (
        system.label(source).to_string(),
        system.label(target).to_string(),
    )
}

fn series(values: &[f64], ids: &[VarId]) -> Vec<f64> {
    ids.iter()
        .map(|id| values.get(id.0).copied().unwrap_or(0.0))
        .collect()
}
