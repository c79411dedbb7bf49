//! Converter conversion: input and output flows coupled by factors.
//!
//! Per (input flow i, output flow o, timestep): `flow[i]·factor[o][t] ==
//! flow[o]·factor[i][t]`, where a factor is looked up under the label of
//! the connected node and defaults to 1 when unlisted. With one input, one
//! output and factors (1, η) this reduces to `flow[o] == η·flow[i]`.

use emsol_core::{groups, EmsolResult};

use crate::blocks::{BlockContext, ConstraintBlock, ObjectiveTerms};
use crate::program::{LinExpr, Sense};

pub struct ConverterBlock;

impl ConstraintBlock for ConverterBlock {
    fn name(&self) -> &'static str {
        "converter"
    }

    fn group_key(&self) -> &'static str {
        groups::CONVERTERS
    }

    fn build(&mut self, ctx: &mut BlockContext<'_>) -> EmsolResult<ObjectiveTerms> {
        let Some(nodes) = ctx.groups.nodes(self.group_key()) else {
            return Ok(ObjectiveTerms::None);
        };

        for &node in nodes {
            let Some(converter) = ctx.system.node(node).as_converter() else {
                continue;
            };
            let ins = ctx.system.inputs(node);
            let outs = ctx.system.outputs(node);

            for &(in_edge, in_node) in &ins {
                let in_label = ctx.system.label(in_node);
                let factor_in = converter.conversion_factors.get(in_label);
                for &(out_edge, out_node) in &outs {
                    let out_label = ctx.system.label(out_node);
                    let factor_out = converter.conversion_factors.get(out_label);
                    for t in 0..ctx.horizon.timesteps {
                        let fi = factor_in.map(|s| s.value_at(t)).unwrap_or(1.0);
                        let fo = factor_out.map(|s| s.value_at(t)).unwrap_or(1.0);
                        let mut row = LinExpr::term(ctx.vars.flow[&in_edge][t], fo);
                        row.add_term(ctx.vars.flow[&out_edge][t], -fi);
                        ctx.program.add_constraint(
                            format!(
                                "conversion[{}][{}][{}][{}]",
                                converter.label, in_label, out_label, t
                            ),
                            row,
                            Sense::Eq,
                            0.0,
                        );
                    }
                }
            }
        }

        Ok(ObjectiveTerms::None)
    }
}
