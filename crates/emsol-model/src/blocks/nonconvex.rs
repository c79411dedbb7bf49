//! Non-convex flow rules: on/off status with transition costs.
//!
//! One binary status variable per (flow, timestep) gates the flow through
//! big-M bounds scaled by `nominal_value`. Startup and shutdown binaries
//! are only created when their costs are set; transitions link consecutive
//! status values through the wraparound `previous` mapping. Summed bounds,
//! integer ties and gradient rules apply to the group's members the same
//! way the standard block applies them to its own.

use emsol_core::{groups, EmsolResult};

use crate::blocks::{
    gradient_rows, integer_tie_rows, summed_limit_rows, weighted_flow_costs, BlockContext,
    ConstraintBlock, ObjectiveTerms,
};
use crate::program::{LinExpr, Sense};

pub struct NonConvexFlowBlock;

impl ConstraintBlock for NonConvexFlowBlock {
    fn name(&self) -> &'static str {
        "nonconvex_flow"
    }

    fn group_key(&self) -> &'static str {
        groups::NONCONVEX_FLOWS
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(edges) = ctx.groups.flows(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        let mut costs = LinExpr::new();
        for &edge in edges {
            let flow = ctx.system.flow(edge);
            let Some(nonconvex) = &flow.nonconvex else {
                continue;
            };
            let Some(nominal) = flow.nominal_value else {
                continue;
            };
            let pair = ctx.pair(edge);
            let flow_vars = ctx.flow_vars(edge);
            let timesteps = ctx.horizon.timesteps;

            let mut status_vars = Vec::with_capacity(timesteps);
            for t in 0..timesteps {
                let status = ctx
                    .program
                    .add_binary_var(format!("status[{pair}][{t}]"));
                status_vars.push(status);

                let mut row = LinExpr::term(flow_vars[t], 1.0);
                row.add_term(status, -flow.max.value_at(t) * nominal);
                ctx.program.add_constraint(
                    format!("status_max[{pair}][{t}]"),
                    row,
                    Sense::Le,
                    0.0,
                );

                let mut row = LinExpr::term(flow_vars[t], 1.0);
                row.add_term(status, -flow.min.value_at(t) * nominal);
                ctx.program.add_constraint(
                    format!("status_min[{pair}][{t}]"),
                    row,
                    Sense::Ge,
                    0.0,
                );

                if let Some(activity_costs) = &nonconvex.activity_costs {
                    costs.add_term(status, activity_costs.value_at(t));
                }
            }

            if let Some(startup_costs) = &nonconvex.startup_costs {
                let mut startup_vars = Vec::with_capacity(timesteps);
                for t in 0..timesteps {
                    let startup = ctx
                        .program
                        .add_binary_var(format!("startup[{pair}][{t}]"));
                    let prev = ctx.horizon.previous(t);
                    let mut row = LinExpr::term(status_vars[t], 1.0);
                    row.add_term(status_vars[prev], -1.0);
                    row.add_term(startup, -1.0);
                    ctx.program.add_constraint(
                        format!("startup[{pair}][{t}]"),
                        row,
                        Sense::Le,
                        0.0,
                    );
                    costs.add_term(startup, startup_costs.value_at(t));
                    startup_vars.push(startup);
                }
                ctx.vars.startup.insert(edge, startup_vars);
            }

            if let Some(shutdown_costs) = &nonconvex.shutdown_costs {
                let mut shutdown_vars = Vec::with_capacity(timesteps);
                for t in 0..timesteps {
                    let shutdown = ctx
                        .program
                        .add_binary_var(format!("shutdown[{pair}][{t}]"));
                    let prev = ctx.horizon.previous(t);
                    let mut row = LinExpr::term(status_vars[prev], 1.0);
                    row.add_term(status_vars[t], -1.0);
                    row.add_term(shutdown, -1.0);
                    ctx.program.add_constraint(
                        format!("shutdown[{pair}][{t}]"),
                        row,
                        Sense::Le,
                        0.0,
                    );
                    costs.add_term(shutdown, shutdown_costs.value_at(t));
                    shutdown_vars.push(shutdown);
                }
                ctx.vars.shutdown.insert(edge, shutdown_vars);
            }
            ctx.vars.status.insert(edge, status_vars);

            // the builder guarantees at most one of the two gradient
            // bundles is bounded; fall back to the flow's own when the
            // nonconvex option carries none
            let (positive, negative) = if nonconvex.positive_gradient.is_bounded()
                || nonconvex.negative_gradient.is_bounded()
            {
                (&nonconvex.positive_gradient, &nonconvex.negative_gradient)
            } else {
                (&flow.positive_gradient, &flow.negative_gradient)
            };
            let gradient_costs = gradient_rows(ctx, edge, positive, negative, nominal);
            costs += &gradient_costs;

            summed_limit_rows(ctx, edge, nominal);
            if flow.integer {
                integer_tie_rows(ctx, edge);
            }

            if !flow.variable_costs.is_zero() {
                costs += &weighted_flow_costs(
                    &flow_vars,
                    &flow.variable_costs,
                    &ctx.horizon.weighting,
                );
            }
        }

        if costs.is_empty() {
            Ok(ObjectiveTerms::None)
        } else {
            Ok(ObjectiveTerms::Standard(costs))
        }
    }
}
