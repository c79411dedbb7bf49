//! Model assembly and solving.
//!
//! A [`Model`] borrows an immutable [`EnergySystem`] snapshot and compiles
//! it in strictly ordered phases: parent flow variables with the bound
//! policy applied, then the constraint blocks over their groups, then the
//! objective buckets merged from the blocks' declared contributions. The
//! buckets are fixed from then on; every solve rebuilds its objective
//! expression from them — plain [`Model::solve`] minimizes the
//! `"_standard"` bucket, [`Model::solve_singular`] any single named
//! bucket, [`Model::solve_weighted`] a weighted combination.
//!
//! A maximization setting flips the sign of every contribution at
//! accumulation, so the backend always minimizes.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use emsol_core::{EdgeIndex, EmsolError, EmsolResult, EnergySystem, Flow, Sequence};

use crate::blocks::{default_blocks, BlockContext, ConstraintBlock, ObjectiveTerms};
use crate::program::{LinExpr, MathProgram, ObjectiveSense, VarId};
use crate::solver::{backend_for, SolveOptions, SolveResult};

/// Bucket that collects every cost term not redirected by a
/// multi-objective bundle.
pub const STANDARD_OBJECTIVE: &str = "_standard";

/// Time axis of a compiled model: step count, per-step duration in hours,
/// and the per-step objective weighting (the timeincrement unless
/// overridden in the settings).
#[derive(Debug, Clone)]
pub struct Horizon {
    pub timesteps: usize,
    pub timeincrement: Vec<f64>,
    pub weighting: Vec<f64>,
}

impl Horizon {
    /// Wraparound predecessor: `previous(0)` is the last timestep.
    pub fn previous(&self, t: usize) -> usize {
        if t == 0 {
            self.timesteps - 1
        } else {
            t - 1
        }
    }
}

/// Registry of every variable the model created, keyed by the graph
/// entity it belongs to. The results extractor walks this.
#[derive(Debug, Default)]
pub struct VariableTable {
    /// Per-edge flow variables, one per timestep.
    pub flow: BTreeMap<EdgeIndex, Vec<VarId>>,
    pub positive_gradient: BTreeMap<EdgeIndex, Vec<VarId>>,
    pub negative_gradient: BTreeMap<EdgeIndex, Vec<VarId>>,
    /// Invested capacity, one variable per investment flow.
    pub invest: BTreeMap<EdgeIndex, VarId>,
    pub status: BTreeMap<EdgeIndex, Vec<VarId>>,
    pub startup: BTreeMap<EdgeIndex, Vec<VarId>>,
    pub shutdown: BTreeMap<EdgeIndex, Vec<VarId>>,
    pub integer_flow: BTreeMap<EdgeIndex, Vec<VarId>>,
    pub substance_flow: BTreeMap<(EdgeIndex, String), Vec<VarId>>,
    /// Bus-balance constraint rows per bus label, for shadow prices.
    pub balance_rows: BTreeMap<String, Vec<usize>>,
}

/// Knobs fixed at model construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSettings {
    pub sense: ObjectiveSense,
    /// Per-timestep weighting of variable costs; defaults to the
    /// timeincrement.
    pub objective_weighting: Option<Sequence>,
    /// When set, blocks may only contribute to these named buckets (the
    /// standard bucket is always allowed); stray names fail the build.
    /// Declared names get a bucket even if nothing contributes to them.
    pub declared_objectives: Option<BTreeSet<String>>,
}

impl ModelSettings {
    pub fn with_sense(mut self, sense: ObjectiveSense) -> Self {
        self.sense = sense;
        self
    }

    pub fn with_objective_weighting(mut self, weighting: impl Into<Sequence>) -> Self {
        self.objective_weighting = Some(weighting.into());
        self
    }

    pub fn with_declared_objectives<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_objectives = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// A compiled optimization model over an energy system snapshot.
#[derive(Debug)]
pub struct Model<'a> {
    system: &'a EnergySystem,
    settings: ModelSettings,
    horizon: Horizon,
    program: MathProgram,
    vars: VariableTable,
    objectives: BTreeMap<String, LinExpr>,
    last_result: Option<SolveResult>,
}

impl<'a> Model<'a> {
    /// Compile with default settings and the default block lineup.
    pub fn new(system: &'a EnergySystem) -> EmsolResult<Self> {
        Self::with_settings(system, ModelSettings::default())
    }

    pub fn with_settings(system: &'a EnergySystem, settings: ModelSettings) -> EmsolResult<Self> {
        Self::with_blocks(system, settings, default_blocks())
    }

    /// Compile with a custom block lineup. Blocks run in the given order
    /// and are dropped afterwards; only their variables, rows and
    /// objective terms remain.
    pub fn with_blocks(
        system: &'a EnergySystem,
        settings: ModelSettings,
        mut blocks: Vec<Box<dyn ConstraintBlock>>,
    ) -> EmsolResult<Self> {
        system.validate()?;
        let groups = system.groups()?;

        let timesteps = system.timeindex().len();
        let timeincrement = system.timeincrement()?.materialize(timesteps);
        let weighting = match &settings.objective_weighting {
            Some(seq) => {
                seq.check_len(timesteps, "objective_weighting")?;
                seq.materialize(timesteps)
            }
            None => timeincrement.clone(),
        };
        let horizon = Horizon {
            timesteps,
            timeincrement,
            weighting,
        };

        let mut program = MathProgram::new();
        let mut vars = VariableTable::default();

        for (edge, src, dst, flow) in system.flows() {
            let pair = format!("{}->{}", system.label(src), system.label(dst));
            if flow.fix.is_some() && flow.nominal_value.is_none() && flow.investment.is_none() {
                warn!(
                    flow = %pair,
                    "fix is set but there is no nominal_value or investment to \
                     scale it against; the flow stays unpinned"
                );
            }
            let mut per_t = Vec::with_capacity(timesteps);
            for t in 0..timesteps {
                let (lb, ub) = flow_bounds(flow, t);
                per_t.push(program.add_var(format!("flow[{pair}][{t}]"), lb, ub));
            }
            vars.flow.insert(edge, per_t);
        }

        let sign = match settings.sense {
            ObjectiveSense::Minimize => 1.0,
            ObjectiveSense::Maximize => -1.0,
        };
        let mut objectives: BTreeMap<String, LinExpr> = BTreeMap::new();
        objectives.insert(STANDARD_OBJECTIVE.to_string(), LinExpr::new());
        if let Some(declared) = &settings.declared_objectives {
            for name in declared {
                objectives.entry(name.clone()).or_default();
            }
        }

        let mut ctx = BlockContext {
            system,
            groups: &groups,
            horizon: &horizon,
            program: &mut program,
            vars: &mut vars,
        };
        for block in &mut blocks {
            debug!(
                block = block.name(),
                group = block.group_key(),
                "building constraint block"
            );
            match block.build(&mut ctx)? {
                ObjectiveTerms::None => {}
                ObjectiveTerms::Standard(expr) => {
                    objectives
                        .entry(STANDARD_OBJECTIVE.to_string())
                        .or_default()
                        .add_scaled(&expr, sign);
                }
                ObjectiveTerms::Named(map) => {
                    for (name, expr) in map {
                        if let Some(declared) = &settings.declared_objectives {
                            if name != STANDARD_OBJECTIVE && !declared.contains(&name) {
                                return Err(EmsolError::Objective(format!(
                                    "block \"{}\" contributes to undeclared objective \"{}\"",
                                    block.name(),
                                    name
                                )));
                            }
                        }
                        objectives.entry(name).or_default().add_scaled(&expr, sign);
                    }
                }
            }
        }

        info!(
            vars = program.num_vars(),
            constraints = program.num_constraints(),
            objectives = objectives.len(),
            "model assembled"
        );

        Ok(Self {
            system,
            settings,
            horizon,
            program,
            vars,
            objectives,
            last_result: None,
        })
    }

    /// Minimize the standard bucket.
    pub fn solve(&mut self, options: &SolveOptions) -> EmsolResult<&SolveResult> {
        self.solve_singular(STANDARD_OBJECTIVE, options)
    }

    /// Solve against exactly one named bucket.
    pub fn solve_singular(
        &mut self,
        objective: &str,
        options: &SolveOptions,
    ) -> EmsolResult<&SolveResult> {
        let expr = self
            .objectives
            .get(objective)
            .ok_or_else(|| self.unknown_objective(objective))?
            .clone();
        self.run_solve(expr, options)
    }

    /// Solve against `Σ weight[name]·bucket[name]`.
    pub fn solve_weighted(
        &mut self,
        weights: &BTreeMap<String, f64>,
        options: &SolveOptions,
    ) -> EmsolResult<&SolveResult> {
        if weights.is_empty() {
            return Err(EmsolError::Objective(
                "weighted solve needs at least one objective weight".into(),
            ));
        }
        let mut expr = LinExpr::new();
        for (name, &weight) in weights {
            if !weight.is_finite() {
                return Err(EmsolError::Objective(format!(
                    "weight for objective \"{name}\" must be finite, got {weight}"
                )));
            }
            let bucket = self
                .objectives
                .get(name)
                .ok_or_else(|| self.unknown_objective(name))?;
            expr.add_scaled(bucket, weight);
        }
        self.run_solve(expr, options)
    }

    fn run_solve(&mut self, objective: LinExpr, options: &SolveOptions) -> EmsolResult<&SolveResult> {
        let backend = backend_for(options.solver)?;
        info!(
            solver = backend.name(),
            vars = self.program.num_vars(),
            constraints = self.program.num_constraints(),
            "solving"
        );
        let result = backend.solve(&self.program, &objective, options)?;
        if !result.is_optimal() {
            warn!(
                status = ?result.status,
                termination = %result.termination,
                "optimization ended with a non-optimal outcome"
            );
        }
        Ok(self.last_result.insert(result))
    }

    pub(crate) fn unknown_objective(&self, name: &str) -> EmsolError {
        let available: Vec<&str> = self.objectives.keys().map(String::as_str).collect();
        EmsolError::Objective(format!(
            "no cost expression for objective \"{}\"; available: {}",
            name,
            available.join(", ")
        ))
    }

    /// Realized value of every bucket under a solution.
    pub fn objective_values(&self, result: &SolveResult) -> BTreeMap<String, f64> {
        self.objectives
            .iter()
            .map(|(name, expr)| (name.clone(), expr.evaluate(&result.values)))
            .collect()
    }

    /// Dump the program with the standard objective in LP format.
    pub fn write_lp(&self, out: &mut impl io::Write) -> io::Result<()> {
        let standard = self
            .objectives
            .get(STANDARD_OBJECTIVE)
            .cloned()
            .unwrap_or_default();
        self.program
            .write_lp(&standard, ObjectiveSense::Minimize, out)
    }

    pub fn system(&self) -> &'a EnergySystem {
        self.system
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn program(&self) -> &MathProgram {
        &self.program
    }

    pub fn variables(&self) -> &VariableTable {
        &self.vars
    }

    pub fn objective_names(&self) -> impl Iterator<Item = &str> {
        self.objectives.keys().map(String::as_str)
    }

    pub(crate) fn objective_bucket(&self, name: &str) -> Option<&LinExpr> {
        self.objectives.get(name)
    }

    pub fn last_result(&self) -> Option<&SolveResult> {
        self.last_result.as_ref()
    }
}

/// Bound policy for a parent flow variable at one timestep.
///
/// `fix` with a concrete capacity pins the variable; a concrete capacity
/// alone scales `min`/`max`, except that non-convex flows leave the lower
/// bound to the status big-M; investment-determined flows are only bounded
/// below (unidirectional) or free (bidirectional).
fn flow_bounds(flow: &Flow, t: usize) -> (f64, f64) {
    if let (Some(fix), Some(nominal)) = (&flow.fix, flow.nominal_value) {
        let pinned = fix.value_at(t) * nominal;
        return (pinned, pinned);
    }
    if let Some(nominal) = flow.nominal_value {
        let ub = flow.max.value_at(t) * nominal;
        let lb = if flow.nonconvex.is_some() {
            if flow.bidirectional {
                f64::NEG_INFINITY
            } else {
                0.0
            }
        } else {
            flow.min.value_at(t) * nominal
        };
        return (lb, ub);
    }
    let lb = if flow.bidirectional {
        f64::NEG_INFINITY
    } else {
        0.0
    };
    (lb, f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use emsol_core::{Bus, Flow, Investment, MultiObjective, NonConvex, Sink, Source, TimeIndex};
    use crate::program::{Sense, VarDomain};

    fn start() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// grid -> bus -> demand, demand fixed at 1.0 of nominal 5.
    fn dispatch_system(timesteps: usize) -> EnergySystem {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), timesteps).unwrap());
        let grid = es.add_node(Source::new("grid"));
        let bus = es.add_node(Bus::new("electricity"));
        let demand = es.add_node(Sink::new("demand"));
        es.add_flow(
            grid,
            bus,
            Flow::builder()
                .nominal_value(10.0)
                .variable_costs(2.0)
                .build()
                .unwrap(),
        )
        .unwrap();
        es.add_flow(
            bus,
            demand,
            Flow::builder()
                .nominal_value(5.0)
                .fix(1.0)
                .build()
                .unwrap(),
        )
        .unwrap();
        es
    }

    #[test]
    fn test_assembly_dimensions() {
        let es = dispatch_system(4);
        let model = Model::new(&es).unwrap();

        // two flows, four timesteps
        assert_eq!(model.program().num_vars(), 8);
        // one balanced bus, four balance rows
        assert_eq!(model.program().num_constraints(), 4);
        assert_eq!(model.variables().balance_rows["electricity"].len(), 4);
        let names: Vec<&str> = model.objective_names().collect();
        assert_eq!(names, vec![STANDARD_OBJECTIVE]);
    }

    #[test]
    fn test_fix_pins_parent_bounds() {
        let es = dispatch_system(2);
        let model = Model::new(&es).unwrap();
        let edge = es.find_node("electricity").and_then(|bus| {
            es.outputs(bus).first().map(|&(edge, _)| edge)
        });
        let vars = &model.variables().flow[&edge.unwrap()];
        for &var in vars {
            let def = model.program().var(var);
            assert_eq!(def.lb, 5.0, "fix 1.0 of nominal 5.0 pins both bounds");
            assert_eq!(def.ub, 5.0);
        }
    }

    #[test]
    fn test_nonconvex_leaves_lower_bound_to_status() {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), 2).unwrap());
        let src = es.add_node(Source::new("plant"));
        let bus = es.add_node(Bus::new("heat"));
        let edge = es
            .add_flow(
                src,
                bus,
                Flow::builder()
                    .nominal_value(8.0)
                    .min(0.4)
                    .nonconvex(NonConvex::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let model = Model::new(&es).unwrap();

        let def = model.program().var(model.variables().flow[&edge][0]);
        assert_eq!(def.lb, 0.0, "status big-M supersedes the simple lower bound");
        assert_eq!(def.ub, 8.0);
        // status binaries exist and the program is a MIP
        assert_eq!(model.variables().status[&edge].len(), 2);
        assert!(model.program().is_mip());
        let status_def = model.program().var(model.variables().status[&edge][0]);
        assert_eq!(status_def.domain, VarDomain::Binary);
    }

    #[test]
    fn test_unknown_objective_is_rejected_before_solving() {
        let es = dispatch_system(2);
        let mut model = Model::new(&es).unwrap();
        let err = model
            .solve_singular("ecology", &SolveOptions::default())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ecology"), "message was: {msg}");
        assert!(msg.contains(STANDARD_OBJECTIVE));
        assert!(model.last_result().is_none(), "no solve happened");
    }

    #[test]
    fn test_empty_weights_are_rejected() {
        let es = dispatch_system(2);
        let mut model = Model::new(&es).unwrap();
        let err = model
            .solve_weighted(&BTreeMap::new(), &SolveOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_multiobjective_buckets_stay_separate() {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), 2).unwrap());
        let a = es.add_node(Source::new("a"));
        let b = es.add_node(Source::new("b"));
        let bus = es.add_node(Bus::new("bus"));
        let eco_edge = es
            .add_flow(
                a,
                bus,
                Flow::builder()
                    .nominal_value(1.0)
                    .multiobjective(MultiObjective::new().costs("eco", 5.0).costs("fin", 2.0))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let std_edge = es
            .add_flow(
                b,
                bus,
                Flow::builder()
                    .nominal_value(1.0)
                    .variable_costs(3.0)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let model = Model::new(&es).unwrap();

        let names: Vec<&str> = model.objective_names().collect();
        assert_eq!(names, vec![STANDARD_OBJECTIVE, "eco", "fin"]);

        let standard = model.objective_bucket(STANDARD_OBJECTIVE).unwrap();
        let eco = model.objective_bucket("eco").unwrap();
        let first_std_var = model.variables().flow[&std_edge][0];
        let first_eco_var = model.variables().flow[&eco_edge][0];
        assert_eq!(standard.terms[&first_std_var], 3.0);
        assert!(!standard.terms.contains_key(&first_eco_var));
        assert_eq!(eco.terms[&first_eco_var], 5.0);
        assert!(!eco.terms.contains_key(&first_std_var));
    }

    #[test]
    fn test_declared_objectives_reject_stray_buckets() {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), 2).unwrap());
        let a = es.add_node(Source::new("a"));
        let bus = es.add_node(Bus::new("bus"));
        es.add_flow(
            a,
            bus,
            Flow::builder()
                .nominal_value(1.0)
                .multiobjective(MultiObjective::new().costs("eco", 5.0))
                .build()
                .unwrap(),
        )
        .unwrap();

        let err = Model::with_settings(
            &es,
            ModelSettings::default().with_declared_objectives(["fin"]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("undeclared objective \"eco\""));

        // declared names get a bucket even without contributions
        let model = Model::with_settings(
            &es,
            ModelSettings::default().with_declared_objectives(["eco", "fin"]),
        )
        .unwrap();
        let names: Vec<&str> = model.objective_names().collect();
        assert_eq!(names, vec![STANDARD_OBJECTIVE, "eco", "fin"]);
    }

    #[test]
    fn test_maximize_flips_bucket_signs() {
        let es = dispatch_system(2);
        let model = Model::with_settings(
            &es,
            ModelSettings::default().with_sense(ObjectiveSense::Maximize),
        )
        .unwrap();
        let standard = model.objective_bucket(STANDARD_OBJECTIVE).unwrap();
        // variable costs 2.0 weighted by 1h steps, negated for maximize
        assert!(standard.terms.values().all(|&c| c == -2.0));
    }

    #[test]
    fn test_objective_weighting_override() {
        let es = dispatch_system(2);
        let model = Model::with_settings(
            &es,
            ModelSettings::default().with_objective_weighting(vec![1.0, 3.0]),
        )
        .unwrap();
        let standard = model.objective_bucket(STANDARD_OBJECTIVE).unwrap();
        let coeffs: Vec<f64> = standard.terms.values().copied().collect();
        assert_eq!(coeffs, vec![2.0, 6.0], "costs 2.0 times weighting [1, 3]");

        let err = Model::with_settings(
            &es,
            ModelSettings::default().with_objective_weighting(vec![1.0, 2.0, 3.0]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("objective_weighting"));
    }

    #[test]
    fn test_investment_capacity_variable() {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), 3).unwrap());
        let src = es.add_node(Source::new("pv"));
        let bus = es.add_node(Bus::new("bus"));
        let edge = es
            .add_flow(
                src,
                bus,
                Flow::builder()
                    .investment(Investment::new(12.0).with_limits(0.0, 100.0))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let model = Model::new(&es).unwrap();

        let invest = model.variables().invest[&edge];
        let def = model.program().var(invest);
        assert_eq!(def.lb, 0.0);
        assert_eq!(def.ub, 100.0);
        let standard = model.objective_bucket(STANDARD_OBJECTIVE).unwrap();
        assert_eq!(standard.terms[&invest], 12.0);
        // invest_max rows bound each timestep against invested capacity
        assert!(model
            .program()
            .constraints()
            .iter()
            .any(|c| c.name.starts_with("invest_max[pv->bus]")));
    }

    #[test]
    fn test_summed_rows_scale_with_nominal_capacity() {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), 3).unwrap());
        let src = es.add_node(Source::new("plant"));
        let bus = es.add_node(Bus::new("heat"));
        let edge = es
            .add_flow(
                src,
                bus,
                Flow::builder()
                    .nominal_value(10.0)
                    .summed_max(0.4)
                    .summed_min(0.1)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let model = Model::new(&es).unwrap();

        let flow_vars = &model.variables().flow[&edge];
        let row = model
            .program()
            .constraints()
            .iter()
            .find(|c| c.name == "summed_max[plant->heat]")
            .unwrap();
        assert_eq!(row.sense, Sense::Le);
        assert_eq!(row.rhs, 4.0, "0.4 of nominal 10");
        for &var in flow_vars {
            assert_eq!(row.expr.terms[&var], 1.0, "hourly steps weigh every term by 1");
        }

        let row = model
            .program()
            .constraints()
            .iter()
            .find(|c| c.name == "summed_min[plant->heat]")
            .unwrap();
        assert_eq!(row.sense, Sense::Ge);
        assert_eq!(row.rhs, 1.0, "0.1 of nominal 10");
    }

    #[test]
    fn test_nonconvex_transition_rows_wrap_around() {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), 3).unwrap());
        let src = es.add_node(Source::new("plant"));
        let bus = es.add_node(Bus::new("heat"));
        let edge = es
            .add_flow(
                src,
                bus,
                Flow::builder()
                    .nominal_value(6.0)
                    .min(0.5)
                    .nonconvex(
                        NonConvex::new()
                            .with_startup_costs(5.0)
                            .with_shutdown_costs(2.0)
                            .with_activity_costs(0.5),
                    )
                    .build()
                    .unwrap(),
            )
            .unwrap();
        // non-unit weighting; the transition costs must not pick it up
        let model = Model::with_settings(
            &es,
            ModelSettings::default().with_objective_weighting(vec![2.0, 2.0, 2.0]),
        )
        .unwrap();

        let status = &model.variables().status[&edge];
        let startup = &model.variables().startup[&edge];
        let shutdown = &model.variables().shutdown[&edge];
        assert_eq!(startup.len(), 3);
        assert_eq!(model.program().var(startup[0]).domain, VarDomain::Binary);

        let row = model
            .program()
            .constraints()
            .iter()
            .find(|c| c.name == "startup[plant->heat][0]")
            .unwrap();
        assert_eq!(row.sense, Sense::Le);
        assert_eq!(row.rhs, 0.0);
        assert_eq!(row.expr.terms[&status[0]], 1.0);
        assert_eq!(
            row.expr.terms[&status[2]], -1.0,
            "previous of t0 wraps to the last step"
        );
        assert_eq!(row.expr.terms[&startup[0]], -1.0);
        assert_eq!(row.expr.terms.len(), 3);

        let row = model
            .program()
            .constraints()
            .iter()
            .find(|c| c.name == "shutdown[plant->heat][1]")
            .unwrap();
        assert_eq!(row.expr.terms[&status[0]], 1.0);
        assert_eq!(row.expr.terms[&status[1]], -1.0);
        assert_eq!(row.expr.terms[&shutdown[1]], -1.0);

        // transition and activity costs enter the standard bucket unweighted
        let standard = model.objective_bucket(STANDARD_OBJECTIVE).unwrap();
        assert_eq!(standard.terms[&startup[1]], 5.0);
        assert_eq!(standard.terms[&shutdown[2]], 2.0);
        assert_eq!(standard.terms[&status[0]], 0.5);
    }

    #[test]
    fn test_integer_flow_tie_rows() {
        let mut es = EnergySystem::new(TimeIndex::hourly(start(), 2).unwrap());
        let src = es.add_node(Source::new("plant"));
        let bus = es.add_node(Bus::new("heat"));
        let edge = es
            .add_flow(
                src,
                bus,
                Flow::builder().nominal_value(6.0).integer().build().unwrap(),
            )
            .unwrap();
        let model = Model::new(&es).unwrap();

        let aux = &model.variables().integer_flow[&edge];
        assert_eq!(aux.len(), 2);
        assert!(model.program().is_mip());
        for (t, &var) in aux.iter().enumerate() {
            let def = model.program().var(var);
            assert_eq!(def.domain, VarDomain::Integer);
            assert_eq!(def.lb, 0.0);
            assert_eq!(def.ub, 6.0, "aux bounds mirror the flow variable");

            let row = model
                .program()
                .constraints()
                .iter()
                .find(|c| c.name == format!("integer[plant->heat][{t}]"))
                .unwrap();
            assert_eq!(row.sense, Sense::Eq);
            assert_eq!(row.rhs, 0.0);
            assert_eq!(row.expr.terms[&model.variables().flow[&edge][t]], 1.0);
            assert_eq!(row.expr.terms[&var], -1.0);
        }
    }
}
