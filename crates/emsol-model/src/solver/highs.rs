//! Embedded HiGHS backend.
//!
//! HiGHS honors integer and binary domains, so nonconvex status variables
//! and integer flows solve as a true MILP here.

use std::time::Instant;

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel};
use tracing::{debug, warn};

use emsol_core::error::{EmsolError, EmsolResult};

use crate::program::{LinExpr, MathProgram, Sense, VarDomain};
use crate::solver::{
    SolveOptions, SolveResult, SolverBackend, SolverStatus, TerminationCondition,
};

pub struct HighsBackend;

impl SolverBackend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn supports_integers(&self) -> bool {
        true
    }

    fn solve(
        &self,
        program: &MathProgram,
        objective: &LinExpr,
        options: &SolveOptions,
    ) -> EmsolResult<SolveResult> {
        let start = Instant::now();

        if !options.cmdline_options.is_empty() {
            debug!(
                options = ?options.cmdline_options,
                "embedded highs ignores cmdline options"
            );
        }
        if options.tee {
            debug!("tee requested; embedded highs runs silently");
        }

        let mut vars = variables!();
        let mut lp_vars = Vec::with_capacity(program.num_vars());
        for def in program.vars() {
            let mut spec = variable();
            if def.lb.is_finite() {
                spec = spec.min(def.lb);
            }
            if def.ub.is_finite() {
                spec = spec.max(def.ub);
            }
            if def.domain != VarDomain::Continuous {
                spec = spec.integer();
            }
            lp_vars.push(vars.add(spec));
        }

        let mut obj = Expression::from(objective.constant);
        for (&var, &coeff) in &objective.terms {
            obj += coeff * lp_vars[var.0];
        }

        let mut model = vars.minimise(obj).using(highs);
        for row in program.constraints() {
            let mut lhs = Expression::from(row.expr.constant);
            for (&var, &coeff) in &row.expr.terms {
                lhs += coeff * lp_vars[var.0];
            }
            model = match row.sense {
                Sense::Le => model.with(constraint!(lhs <= row.rhs)),
                Sense::Ge => model.with(constraint!(lhs >= row.rhs)),
                Sense::Eq => model.with(constraint!(lhs == row.rhs)),
            };
        }

        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                warn!("highs terminated: the program is infeasible");
                return Ok(SolveResult::without_solution(
                    TerminationCondition::Infeasible,
                    start.elapsed(),
                ));
            }
            Err(ResolutionError::Unbounded) => {
                warn!("highs terminated: the program is unbounded");
                return Ok(SolveResult::without_solution(
                    TerminationCondition::Unbounded,
                    start.elapsed(),
                ));
            }
            Err(e) => {
                return Err(EmsolError::Solver(format!("highs failed: {:?}", e)));
            }
        };

        if options.receive_duals {
            warn!("dual values are not exposed by the embedded highs backend");
        }

        let values: Vec<f64> = lp_vars.iter().map(|&v| solution.value(v)).collect();
        Ok(SolveResult {
            status: SolverStatus::Ok,
            termination: TerminationCondition::Optimal,
            objective: Some(objective.evaluate(&values)),
            values,
            duals: None,
            reduced_costs: None,
            solve_time: start.elapsed(),
        })
    }
}
