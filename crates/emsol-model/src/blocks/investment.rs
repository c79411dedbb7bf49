//! Investment flow rules: capacity as a decision variable.
//!
//! One `invest` variable per flow within `[minimum, maximum]`; all
//! operational bounds are written against the total capacity
//! `invest + existing`, with the `existing` share moved to the right-hand
//! side. The capacity price `ep_costs` enters the standard bucket
//! unweighted, variable costs as for standard flows.

use emsol_core::{groups, EmsolResult};

use crate::blocks::{
    integer_tie_rows, weighted_flow_costs, BlockContext, ConstraintBlock, ObjectiveTerms,
};
use crate::program::{LinExpr, Sense};

pub struct InvestmentFlowBlock;

impl ConstraintBlock for InvestmentFlowBlock {
    fn name(&self) -> &'static str {
        "investment_flow"
    }

    fn group_key(&self) -> &'static str {
        groups::INVESTMENT_FLOWS
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(edges) = ctx.groups.flows(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        let mut costs = LinExpr::new();
        for &edge in edges {
            let flow = ctx.system.flow(edge);
            let Some(spec) = &flow.investment else {
                continue;
            };
            let pair = ctx.pair(edge);
            let flow_vars = ctx.flow_vars(edge);

            let invest =
                ctx.program
                    .add_var(format!("invest[{pair}]"), spec.minimum, spec.maximum);
            ctx.vars.invest.insert(edge, invest);

            if let Some(fix) = &flow.fix {
                for t in 0..ctx.horizon.timesteps {
                    let f = fix.value_at(t);
                    let mut row = LinExpr::term(flow_vars[t], 1.0);
                    row.add_term(invest, -f);
                    ctx.program.add_constraint(
                        format!("invest_fix[{pair}][{t}]"),
                        row,
                        Sense::Eq,
                        f * spec.existing,
                    );
                }
            } else {
                for t in 0..ctx.horizon.timesteps {
                    let max = flow.max.value_at(t);
                    let mut row = LinExpr::term(flow_vars[t], 1.0);
                    row.add_term(invest, -max);
                    ctx.program.add_constraint(
                        format!("invest_max[{pair}][{t}]"),
                        row,
                        Sense::Le,
                        max * spec.existing,
                    );

                    let min = flow.min.value_at(t);
                    let mut row = LinExpr::term(flow_vars[t], 1.0);
                    row.add_term(invest, -min);
                    ctx.program.add_constraint(
                        format!("invest_min[{pair}][{t}]"),
                        row,
                        Sense::Ge,
                        min * spec.existing,
                    );
                }
            }

            if flow.summed_max.is_some() || flow.summed_min.is_some() {
                let mut total = LinExpr::new();
                for (t, &var) in flow_vars.iter().enumerate() {
                    total.add_term(var, ctx.horizon.timeincrement[t]);
                }
                if let Some(summed_max) = flow.summed_max {
                    let mut row = total.clone();
                    row.add_term(invest, -summed_max);
                    ctx.program.add_constraint(
                        format!("invest_summed_max[{pair}]"),
                        row,
                        Sense::Le,
                        summed_max * spec.existing,
                    );
                }
                if let Some(summed_min) = flow.summed_min {
                    let mut row = total;
                    row.add_term(invest, -summed_min);
                    ctx.program.add_constraint(
                        format!("invest_summed_min[{pair}]"),
                        row,
                        Sense::Ge,
                        summed_min * spec.existing,
                    );
                }
            }

            if flow.integer {
                integer_tie_rows(ctx, edge);
            }

            costs.add_term(invest, spec.ep_costs);
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
