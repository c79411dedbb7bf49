//! Bus balance: inflows equal outflows per bus and timestep.

use emsol_core::{groups, EmsolResult};

use crate::blocks::{BlockContext, ConstraintBlock, ObjectiveTerms};
use crate::program::{LinExpr, Sense};

pub struct BusBlock;

impl ConstraintBlock for BusBlock {
    fn name(&self) -> &'static str {
        "bus"
    }

    fn group_key(&self) -> &'static str {
        groups::BALANCED_BUSES
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(nodes) = ctx.groups.nodes(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        for &node in nodes {
            let ins = ctx.system.inputs(node);
            let outs = ctx.system.outputs(node);
            // an unconnected bus would yield trivial 0 == 0 rows
            if ins.is_empty() && outs.is_empty() {
                continue;
            }
            let label = ctx.system.label(node).to_string();
            let mut rows = Vec::with_capacity(ctx.horizon.timesteps);
            for t in 0..ctx.horizon.timesteps {
                let mut row = LinExpr::new();
                for (edge, _) in &ins {
                    row.add_term(ctx.vars.flow[edge][t], 1.0);
                }
                for (edge, _) in &outs {
                    row.add_term(ctx.vars.flow[edge][t], -1.0);
                }
                rows.push(ctx.program.num_constraints());
                ctx.program
                    .add_constraint(format!("balance[{label}][{t}]"), row, Sense::Eq, 0.0);
            }
            // remembered so dual-capable backends can surface shadow prices
            ctx.vars.balance_rows.insert(label, rows);
        }

        Ok(ObjectiveTerms::None)
    }
}
