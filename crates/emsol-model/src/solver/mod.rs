//! Solver backends behind a common interface.
//!
//! A [`SolverBackend`] translates a [`MathProgram`] plus one objective
//! expression into a concrete solver's API, runs it, and reports a
//! [`SolveResult`] with an explicit status/termination pair instead of a
//! bare error: an infeasible or unbounded program is a modeling outcome the
//! caller inspects, not a crash.
//!
//! Backends always minimize. Maximization is handled upstream by negating
//! cost contributions when the objective buckets are accumulated, so a
//! backend never needs a sense switch.
//!
//! Backends are compiled in via cargo features (`solver-clarabel` is the
//! default, `solver-highs` adds MILP support) and constructed through
//! [`backend_for`]; callers hold a `Box<dyn SolverBackend>` and stay
//! independent of which solvers this build carries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use emsol_core::error::{EmsolError, EmsolResult};

use crate::program::{LinExpr, MathProgram};

#[cfg(feature = "solver-clarabel")]
pub mod clarabel;
#[cfg(feature = "solver-highs")]
pub mod highs;

/// Known solver backends. A kind may be named even in builds that do not
/// carry it; [`backend_for`] reports the missing feature at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Embedded interior-point LP solver; integer requirements are relaxed.
    Clarabel,
    /// Embedded simplex/MIP solver.
    Highs,
}

impl SolverKind {
    pub fn name(&self) -> &'static str {
        match self {
            SolverKind::Clarabel => "clarabel",
            SolverKind::Highs => "highs",
        }
    }

    /// The kinds compiled into this build.
    pub fn available() -> &'static [SolverKind] {
        &[
            #[cfg(feature = "solver-clarabel")]
            SolverKind::Clarabel,
            #[cfg(feature = "solver-highs")]
            SolverKind::Highs,
        ]
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverKind {
    type Err = EmsolError;

    fn from_str(name: &str) -> EmsolResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(SolverKind::Clarabel),
            "highs" => Ok(SolverKind::Highs),
            other => Err(EmsolError::Solver(format!(
                "unknown solver \"{other}\"; known solvers: clarabel, highs"
            ))),
        }
    }
}

/// Options forwarded to a solve call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOptions {
    pub solver: SolverKind,
    /// Interchange-format hint; the embedded backends translate in memory
    /// and only consult this for LP dumps.
    pub solver_io: String,
    /// Solver-specific key/value options. Embedded backends log and ignore
    /// keys they do not understand.
    pub cmdline_options: BTreeMap<String, String>,
    /// Stream solver output to the console where the backend supports it.
    pub tee: bool,
    /// Request dual values and reduced costs where the backend supports
    /// them; backends without dual support warn and leave them `None`.
    pub receive_duals: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            solver: SolverKind::Clarabel,
            solver_io: "lp".to_string(),
            cmdline_options: BTreeMap::new(),
            tee: false,
            receive_duals: false,
        }
    }
}

impl SolveOptions {
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_tee(mut self, tee: bool) -> Self {
        self.tee = tee;
        self
    }

    pub fn with_duals(mut self) -> Self {
        self.receive_duals = true;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cmdline_options.insert(key.into(), value.into());
        self
    }
}

/// Coarse solver outcome, independent of the termination detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverStatus {
    Ok,
    Warning,
    Error,
    Aborted,
}

/// Why the solver stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminationCondition {
    Optimal,
    Infeasible,
    Unbounded,
    Other(String),
}

impl fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCondition::Optimal => f.write_str("optimal"),
            TerminationCondition::Infeasible => f.write_str("infeasible"),
            TerminationCondition::Unbounded => f.write_str("unbounded"),
            TerminationCondition::Other(detail) => f.write_str(detail),
        }
    }
}

/// Outcome of one solve call.
///
/// `values` is indexed by [`crate::program::VarId`] and is empty unless the
/// solve terminated with a solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolverStatus,
    pub termination: TerminationCondition,
    /// Objective value of the minimized expression, when one exists.
    pub objective: Option<f64>,
    pub values: Vec<f64>,
    pub duals: Option<Vec<f64>>,
    pub reduced_costs: Option<Vec<f64>>,
    pub solve_time: Duration,
}

impl SolveResult {
    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Ok && self.termination == TerminationCondition::Optimal
    }

    /// A result for a solve that stopped without a usable solution.
    pub fn without_solution(termination: TerminationCondition, solve_time: Duration) -> Self {
        Self {
            status: SolverStatus::Warning,
            termination,
            objective: None,
            values: Vec::new(),
            duals: None,
            reduced_costs: None,
            solve_time,
        }
    }
}

/// A linear (or mixed-integer) solver.
pub trait SolverBackend {
    fn name(&self) -> &'static str;

    /// Whether integer and binary domains are honored; backends that return
    /// `false` relax them to their continuous bounds.
    fn supports_integers(&self) -> bool;

    /// Minimize `objective` over `program`.
    fn solve(
        &self,
        program: &MathProgram,
        objective: &LinExpr,
        options: &SolveOptions,
    ) -> EmsolResult<SolveResult>;
}

/// Construct the backend for a solver kind, or explain which cargo feature
/// the build is missing.
pub fn backend_for(kind: SolverKind) -> EmsolResult<Box<dyn SolverBackend>> {
    match kind {
        #[cfg(feature = "solver-clarabel")]
        SolverKind::Clarabel => Ok(Box::new(clarabel::ClarabelBackend)),
        #[cfg(not(feature = "solver-clarabel"))]
        SolverKind::Clarabel => Err(EmsolError::Solver(
            "this build does not include clarabel (enable the solver-clarabel feature)".into(),
        )),
        #[cfg(feature = "solver-highs")]
        SolverKind::Highs => Ok(Box::new(highs::HighsBackend)),
        #[cfg(not(feature = "solver-highs"))]
        SolverKind::Highs => Err(EmsolError::Solver(
            "this build does not include highs (enable the solver-highs feature)".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_kind_names_round_trip() {
        assert_eq!("clarabel".parse::<SolverKind>().unwrap(), SolverKind::Clarabel);
        assert_eq!("HiGHS".parse::<SolverKind>().unwrap(), SolverKind::Highs);
        let err = "gurobi".parse::<SolverKind>().unwrap_err();
        assert!(err.to_string().contains("unknown solver"));
    }

    #[test]
    fn test_default_options() {
        let options = SolveOptions::default();
        assert_eq!(options.solver, SolverKind::Clarabel);
        assert_eq!(options.solver_io, "lp");
        assert!(!options.tee);
        assert!(!options.receive_duals);
        assert!(options.cmdline_options.is_empty());
    }

    #[test]
    fn test_result_without_solution() {
        let result = SolveResult::without_solution(
            TerminationCondition::Infeasible,
            Duration::from_millis(3),
        );
        assert!(!result.is_optimal());
        assert_eq!(result.status, SolverStatus::Warning);
        assert!(result.values.is_empty());
    }

    #[cfg(feature = "solver-clarabel")]
    #[test]
    fn test_backend_for_clarabel() {
        let backend = backend_for(SolverKind::Clarabel).unwrap();
        assert_eq!(backend.name(), "clarabel");
        assert!(!backend.supports_integers());
    }
}
