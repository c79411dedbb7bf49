//! # emsol-model: Optimization Model Assembly and Solving
//!
//! This crate turns an [`emsol_core::EnergySystem`] snapshot into a linear
//! (or mixed-integer) program, hands that program to a solver backend, and
//! regroups the solution vector by flow for analysis and export.
//!
//! ## Constraint Blocks
//!
//! Assembly is block-based: each capability a flow or node declares is
//! picked up by exactly one block, and [`default_blocks`] fixes the order
//! so variable and row numbering is reproducible.
//!
//! | Block | Group | Adds |
//! |-------|-------|------|
//! | [`blocks::FlowBlock`] | standard flows | summed limits, gradient rows, variable costs |
//! | [`blocks::InvestmentFlowBlock`] | investment flows | capacity variable, coupling rows, `ep_costs` |
//! | [`blocks::NonConvexFlowBlock`] | nonconvex flows | status/startup/shutdown binaries and their costs |
//! | [`blocks::BusBlock`] | balanced buses | per-timestep energy balance |
//! | [`blocks::ConverterBlock`] | converters | input/output conversion coupling |
//! | [`blocks::SubstanceFlowBlock`] | substance flows | concentration-scaled substance amounts |
//! | [`blocks::SubstanceBusBlock`] | substance buses | per-substance bus balance |
//! | [`blocks::MultiObjectiveFlowBlock`] | multi-objective flows | named cost buckets |
//!
//! ### Architecture
//!
//! - **[`program::MathProgram`]**: backend-neutral variables, bounds and rows
//! - **[`blocks::ConstraintBlock`]**: defines what a capability adds to the program
//! - **[`solver::SolverBackend`]**: feature-gated solve implementations behind one trait
//! - **[`processing`]**: solution values regrouped per flow, with JSON export
//!
//! Costs live in named buckets rather than one objective expression:
//! standard contributions land in [`STANDARD_OBJECTIVE`], multi-objective
//! terms in their own buckets. [`Model::solve`],
//! [`Model::solve_singular`], [`Model::solve_weighted`] and
//! [`Model::pareto`] choose how to combine the buckets at solve time, so
//! one assembled program serves every objective question.
//!
//! ## Example
//!
//! ```ignore
//! use emsol_core::{Bus, EnergySystem, Flow, Sink, Source, TimeIndex};
//! use emsol_model::{Model, SolveOptions};
//!
//! let mut es = EnergySystem::new(TimeIndex::hourly(start, 24)?);
//! let plant = es.add_node(Source::new("plant"));
//! let grid = es.add_node(Bus::new("grid"));
//! let demand = es.add_node(Sink::new("demand"));
//! es.add_flow(
//!     plant,
//!     grid,
//!     Flow::builder().nominal_value(10.0).variable_costs(2.0).build()?,
//! )?;
//! es.add_flow(grid, demand, Flow::builder().nominal_value(5.0).fix(1.0).build()?)?;
//!
//! let mut model = Model::new(&es)?;
//! model.solve(&SolveOptions::default())?;
//! let results = model.results()?;
//! println!("dispatch: {:?}", results.flow("plant", "grid"));
//! ```

pub mod blocks;
pub mod model;
pub mod pareto;
pub mod processing;
pub mod program;
pub mod solver;

pub use blocks::{default_blocks, BlockContext, ConstraintBlock, ObjectiveTerms};
pub use model::{Horizon, Model, ModelSettings, VariableTable, STANDARD_OBJECTIVE};
pub use pareto::{pareto_mask, ParetoFront};
pub use processing::{extract_results, FlowResults, Results};
pub use program::{
    ConstraintDef, LinExpr, MathProgram, ObjectiveSense, Sense, VarDef, VarDomain, VarId,
};
pub use solver::{
    backend_for, SolveOptions, SolveResult, SolverBackend, SolverKind, SolverStatus,
    TerminationCondition,
};
