//! Multi-substance tracking: sub-flow variables and per-substance balance.
//!
//! The flow block introduces one non-negative sub-flow variable per
//! (flow, substance, timestep) over the system's declared substances and
//! ties it to the carrier flow through the flow's own concentration map; a
//! substance the flow does not declare has concentration 0 and pins the
//! sub-flow to zero. The bus block then balances the sub-flows per
//! substance on substance-balanced buses.
//!
//! Suspicious-but-legal wiring (attached flows without substances,
//! outgoing flows with differing concentration maps) warns and continues:
//! the program stays well-formed, only its physical reading is in doubt.

use emsol_core::{groups, EmsolResult};
use tracing::warn;

use crate::blocks::{BlockContext, ConstraintBlock, ObjectiveTerms};
use crate::program::{LinExpr, Sense};

pub struct SubstanceFlowBlock;

impl ConstraintBlock for SubstanceFlowBlock {
    fn name(&self) -> &'static str {
        "substance_flow"
    }

    fn group_key(&self) -> &'static str {
        groups::SUBSTANCE_FLOWS
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(edges) = ctx.groups.flows(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        for &edge in edges {
            let flow = ctx.system.flow(edge);
            let pair = ctx.pair(edge);
            let flow_vars = ctx.flow_vars(edge);

            for substance in ctx.system.substances() {
                let concentration = flow.substances.get(substance);
                let mut sub_vars = Vec::with_capacity(ctx.horizon.timesteps);
                for t in 0..ctx.horizon.timesteps {
                    let var = ctx.program.add_var(
                        format!("substance_flow[{pair}][{substance}][{t}]"),
                        0.0,
                        f64::INFINITY,
                    );
                    sub_vars.push(var);

                    let mut row = LinExpr::term(var, 1.0);
                    row.add_term(
                        flow_vars[t],
                        -concentration.map(|c| c.value_at(t)).unwrap_or(0.0),
                    );
                    ctx.program.add_constraint(
                        format!("substance_amount[{pair}][{substance}][{t}]"),
                        row,
                        Sense::Eq,
                        0.0,
                    );
                }
                ctx.vars
                    .substance_flow
                    .insert((edge, substance.clone()), sub_vars);
            }
        }

        Ok(ObjectiveTerms::None)
    }
}

pub struct SubstanceBusBlock;

impl ConstraintBlock for SubstanceBusBlock {
    fn name(&self) -> &'static str {
        "substance_bus"
    }

    fn group_key(&self) -> &'static str {
        groups::SUBSTANCE_BUSES
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(nodes) = ctx.groups.nodes(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        for &node in nodes {
            let ins = ctx.system.inputs(node);
            let outs = ctx.system.outputs(node);
            let label = ctx.system.label(node);

            if let Some(&(first_edge, _)) = outs.first() {
                let reference = &ctx.system.flow(first_edge).substances;
                if outs
                    .iter()
                    .skip(1)
                    .any(|&(edge, _)| &ctx.system.flow(edge).substances != reference)
                {
                    warn!(
                        bus = label,
                        "outgoing flows of a substance-balanced bus declare different \
                         concentration maps; results may be wrong"
                    );
                }
            }
            for &(edge, _) in ins.iter().chain(outs.iter()) {
                if ctx.system.flow(edge).substances.is_empty() {
                    warn!(
                        bus = label,
                        flow = %ctx.pair(edge),
                        "flow attached to a substance-balanced bus declares no substances \
                         and contributes nothing to its balance"
                    );
                }
            }

            for substance in ctx.system.substances() {
                for t in 0..ctx.horizon.timesteps {
                    let mut row = LinExpr::new();
                    for &(edge, _) in &ins {
                        if let Some(vars) = ctx.vars.substance_flow.get(&(edge, substance.clone()))
                        {
                            row.add_term(vars[t], 1.0);
                        }
                    }
                    for &(edge, _) in &outs {
                        if let Some(vars) = ctx.vars.substance_flow.get(&(edge, substance.clone()))
                        {
                            row.add_term(vars[t], -1.0);
                        }
                    }
                    // nothing attached carries this substance
                    if row.is_empty() {
                        continue;
                    }
                    ctx.program.add_constraint(
                        format!("substance_balance[{label}][{substance}][{t}]"),
                        row,
                        Sense::Eq,
                        0.0,
                    );
                }
            }
        }

        Ok(ObjectiveTerms::None)
    }
}
