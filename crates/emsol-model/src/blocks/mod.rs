//! Constraint blocks: scoped rule builders composed into a model.
//!
//! Each block consumes one group of nodes or flows (computed by the
//! grouping layer in `emsol-core`), appends variables and constraint rows
//! to the shared [`MathProgram`] through a [`BlockContext`], and declares
//! its objective contribution through the [`ObjectiveTerms`] return value:
//! nothing, a single expression for the `"_standard"` bucket, or a mapping
//! into named buckets. The model composes blocks in a fixed order — flow
//! groups first (they own the per-flow auxiliaries), then node groups,
//! then the overlays that only read variables created earlier.
//!
//! Blocks are transient: built once during model assembly, harvested for
//! their objective terms, dropped.

use std::collections::BTreeMap;

use emsol_core::{EdgeIndex, EmsolResult, EnergySystem, Gradient, Groups, Sequence};

use crate::model::{Horizon, VariableTable};
use crate::program::{LinExpr, MathProgram, Sense, VarId};

pub mod bus;
pub mod converter;
pub mod flow;
pub mod investment;
pub mod multi_objective;
pub mod nonconvex;
pub mod substance;

pub use bus::BusBlock;
pub use converter::ConverterBlock;
pub use flow::FlowBlock;
pub use investment::InvestmentFlowBlock;
pub use multi_objective::MultiObjectiveFlowBlock;
pub use nonconvex::NonConvexFlowBlock;
pub use substance::{SubstanceBusBlock, SubstanceFlowBlock};

/// What a block contributes to the objective.
#[derive(Debug, Clone)]
pub enum ObjectiveTerms {
    /// Pure constraint block.
    None,
    /// One expression for the `"_standard"` bucket.
    Standard(LinExpr),
    /// Expressions for named buckets.
    Named(BTreeMap<String, LinExpr>),
}

/// Shared assembly state handed to each block.
pub struct BlockContext<'a> {
    pub system: &'a EnergySystem,
    pub groups: &'a Groups,
    pub horizon: &'a Horizon,
    pub program: &'a mut MathProgram,
    pub vars: &'a mut VariableTable,
}

impl BlockContext<'_> {
    /// `"source->target"` label pair for naming variables and rows.
    pub fn pair(&self, edge: EdgeIndex) -> String {
        let (src, dst) = self.system.endpoints(edge);
        format!("{}->{}", self.system.label(src), self.system.label(dst))
    }

    /// Flow variables of an edge, one per timestep. The model creates them
    /// for every edge before any block runs.
    pub fn flow_vars(&self, edge: EdgeIndex) -> Vec<VarId> {
        self.vars.flow[&edge].clone()
    }
}

/// A scoped constraint builder over one group.
pub trait ConstraintBlock {
    fn name(&self) -> &'static str;

    /// Group key this block consumes.
    fn group_key(&self) -> &'static str;

    /// Append this block's variables and rows, and declare its objective
    /// contribution.
    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms>;
}

/// The block lineup for a default model, in build order. Flow blocks come
/// first so the overlays (multi-objective, substance balance) find the
/// auxiliary variables they reference.
pub fn default_blocks() -> Vec<Box<dyn ConstraintBlock>> {
    vec![
        Box::new(FlowBlock),
        Box::new(InvestmentFlowBlock),
        Box::new(NonConvexFlowBlock),
        Box::new(BusBlock),
        Box::new(ConverterBlock),
        Box::new(SubstanceFlowBlock),
        Box::new(SubstanceBusBlock),
        Box::new(MultiObjectiveFlowBlock),
    ]
}

/// Σ_t weighting[t]·costs[t]·flow[t].
pub(crate) fn weighted_flow_costs(
    flow_vars: &[VarId],
    costs: &Sequence,
    weighting: &[f64],
) -> LinExpr {
    let mut expr = LinExpr::new();
    for (t, &var) in flow_vars.iter().enumerate() {
        expr.add_term(var, weighting[t] * costs.value_at(t));
    }
    expr
}

/// `summed_max`/`summed_min` rows against a fixed capacity:
/// Σ_t flow[t]·τ[t] ≤ summed_max·capacity (and ≥ for the minimum).
pub(crate) fn summed_limit_rows(ctx: &mut BlockContext<'_>, edge: EdgeIndex, capacity: f64) {
    let flow = ctx.system.flow(edge);
    if flow.summed_max.is_none() && flow.summed_min.is_none() {
        return;
    }
    let pair = ctx.pair(edge);
    let flow_vars = ctx.flow_vars(edge);
    let mut total = LinExpr::new();
    for (t, &var) in flow_vars.iter().enumerate() {
        total.add_term(var, ctx.horizon.timeincrement[t]);
    }
    if let Some(summed_max) = flow.summed_max {
        ctx.program.add_constraint(
            format!("summed_max[{pair}]"),
            total.clone(),
            Sense::Le,
            summed_max * capacity,
        );
    }
    if let Some(summed_min) = flow.summed_min {
        ctx.program.add_constraint(
            format!("summed_min[{pair}]"),
            total,
            Sense::Ge,
            summed_min * capacity,
        );
    }
}

/// Directional gradient rules against a fixed capacity.
///
/// Per bounded direction, one non-negative variable per timestep within
/// `[0, ub[t]·capacity]`, linked to consecutive flow values through the
/// wraparound `previous` mapping: the negative-gradient variable absorbs
/// `flow[t] − flow[prev(t)]`, the positive-gradient variable absorbs
/// `flow[prev(t)] − flow[t]`. Returns the (unweighted) gradient cost
/// expression; the created variables are registered so later blocks can
/// price them into other buckets.
pub(crate) fn gradient_rows(
    ctx: &mut BlockContext<'_>,
    edge: EdgeIndex,
    positive: &Gradient,
    negative: &Gradient,
    capacity: f64,
) -> LinExpr {
    let mut costs = LinExpr::new();
    let pair = ctx.pair(edge);
    let flow_vars = ctx.flow_vars(edge);
    let timesteps = ctx.horizon.timesteps;

    if let Some(ub) = &negative.ub {
        let mut grad_vars = Vec::with_capacity(timesteps);
        for t in 0..timesteps {
            let var = ctx.program.add_var(
                format!("negative_gradient[{pair}][{t}]"),
                0.0,
                ub.value_at(t) * capacity,
            );
            grad_vars.push(var);
            let prev = ctx.horizon.previous(t);
            let mut row = LinExpr::term(flow_vars[t], 1.0);
            row.add_term(flow_vars[prev], -1.0);
            row.add_term(var, -1.0);
            ctx.program.add_constraint(
                format!("negative_gradient[{pair}][{t}]"),
                row,
                Sense::Le,
                0.0,
            );
            costs.add_term(var, negative.costs);
        }
        ctx.vars.negative_gradient.insert(edge, grad_vars);
    }

    if let Some(ub) = &positive.ub {
        let mut grad_vars = Vec::with_capacity(timesteps);
        for t in 0..timesteps {
            let var = ctx.program.add_var(
                format!("positive_gradient[{pair}][{t}]"),
                0.0,
                ub.value_at(t) * capacity,
            );
            grad_vars.push(var);
            let prev = ctx.horizon.previous(t);
            let mut row = LinExpr::term(flow_vars[prev], 1.0);
            row.add_term(flow_vars[t], -1.0);
            row.add_term(var, -1.0);
            ctx.program.add_constraint(
                format!("positive_gradient[{pair}][{t}]"),
                row,
                Sense::Le,
                0.0,
            );
            costs.add_term(var, positive.costs);
        }
        ctx.vars.positive_gradient.insert(edge, grad_vars);
    }

    costs
}

/// Integer tie rows: one auxiliary integer variable per timestep, pinned
/// to the flow variable by equality, mirroring its bounds.
pub(crate) fn integer_tie_rows(ctx: &mut BlockContext<'_>, edge: EdgeIndex) {
    let pair = ctx.pair(edge);
    let flow_vars = ctx.flow_vars(edge);
    let mut aux_vars = Vec::with_capacity(flow_vars.len());
    for (t, &flow_var) in flow_vars.iter().enumerate() {
        let def = ctx.program.var(flow_var);
        let (lb, ub) = (def.lb, def.ub);
        let aux = ctx
            .program
            .add_integer_var(format!("integer[{pair}][{t}]"), lb, ub);
        aux_vars.push(aux);
        let mut row = LinExpr::term(flow_var, 1.0);
        row.add_term(aux, -1.0);
        ctx.program
            .add_constraint(format!("integer[{pair}][{t}]"), row, Sense::Eq, 0.0);
    }
    ctx.vars.integer_flow.insert(edge, aux_vars);
}
