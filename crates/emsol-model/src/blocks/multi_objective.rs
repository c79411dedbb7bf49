//! Multi-objective cost redirection into named buckets.
//!
//! Pure objective block: no variables, no constraints. Each named term of
//! a flow's `multiobjective` bundle contributes its weighted variable
//! costs to the bucket of that name; term gradient costs price the
//! gradient variables the standard (or non-convex) block created for the
//! flow. A term pricing gradients on a flow without gradient bounds has
//! nothing to price and warns.

use std::collections::BTreeMap;

use emsol_core::{groups, EmsolResult};
use tracing::warn;

use crate::blocks::{weighted_flow_costs, BlockContext, ConstraintBlock, ObjectiveTerms};
use crate::program::LinExpr;

pub struct MultiObjectiveFlowBlock;

impl ConstraintBlock for MultiObjectiveFlowBlock {
    fn name(&self) -> &'static str {
        "multi_objective_flow"
    }

    fn group_key(&self) -> &'static str {
        groups::MULTIOBJECTIVE_FLOWS
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(edges) = ctx.groups.flows(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        let mut buckets: BTreeMap<String, LinExpr> = BTreeMap::new();
        for &edge in edges {
            let flow = ctx.system.flow(edge);
            let Some(multiobjective) = &flow.multiobjective else {
                continue;
            };
            let flow_vars = ctx.flow_vars(edge);

            for (name, term) in &multiobjective.objectives {
                let bucket = buckets.entry(name.clone()).or_default();

                if let Some(variable_costs) = &term.variable_costs {
                    if !variable_costs.is_zero() {
                        let expr = weighted_flow_costs(
                            &flow_vars,
                            variable_costs,
                            &ctx.horizon.weighting,
                        );
                        *bucket += &expr;
                    }
                }

                for (gradient, table) in [
                    (&term.negative_gradient, &ctx.vars.negative_gradient),
                    (&term.positive_gradient, &ctx.vars.positive_gradient),
                ] {
                    if gradient.costs == 0.0 {
                        continue;
                    }
                    match table.get(&edge) {
                        Some(grad_vars) => {
                            for &var in grad_vars {
                                bucket.add_term(var, gradient.costs);
                            }
                        }
                        None => warn!(
                            flow = %ctx.pair(edge),
                            objective = %name,
                            "gradient costs on a multi-objective term have no gradient \
                             variables to price; declare a gradient bound on the flow"
                        ),
                    }
                }
            }
        }

        if buckets.is_empty() {
            Ok(ObjectiveTerms::None)
        } else {
            Ok(ObjectiveTerms::Named(buckets))
        }
    }
}
