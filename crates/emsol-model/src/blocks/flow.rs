//! Standard flow rules.
//!
//! Covers every flow that is neither investment nor non-convex: summed
//! bounds and gradient rules against the fixed `nominal_value`, integer
//! ties, and the weighted variable-cost term. Gradient costs enter the
//! objective unweighted; variable costs are weighted per timestep.

use emsol_core::{groups, EmsolResult};

use crate::blocks::{
    gradient_rows, integer_tie_rows, summed_limit_rows, weighted_flow_costs, BlockContext,
    ConstraintBlock, ObjectiveTerms,
};
use crate::program::LinExpr;

pub struct FlowBlock;

impl ConstraintBlock for FlowBlock {
    fn name(&self) -> &'static str {
        "flow"
    }

    fn group_key(&self) -> &'static str {
        groups::STANDARD_FLOWS
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(edges) = ctx.groups.flows(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        let mut costs = LinExpr::new();
        for &edge in edges {
            let flow = ctx.system.flow(edge);

            // summed bounds and gradients need a concrete capacity; the
            // flow builder guarantees gradients only appear with one
            if let Some(nominal) = flow.nominal_value {
                summed_limit_rows(ctx, edge, nominal);
                let gradient_costs = gradient_rows(
                    ctx,
                    edge,
                    &flow.positive_gradient,
                    &flow.negative_gradient,
                    nominal,
                );
                costs += &gradient_costs;
            }

            if flow.integer {
                integer_tie_rows(ctx, edge);
            }

            if !flow.variable_costs.is_zero() {
                let flow_vars = ctx.flow_vars(edge);
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
