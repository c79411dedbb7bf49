//! Gradient limits end to end: ramp feasibility, wraparound coupling and
//! gradient cost pricing.
//!
//! The negative-gradient bundle limits how fast a flow may rise from one
//! timestep to the next, the positive-gradient bundle how fast it may
//! fall. The first/last timesteps couple through the wraparound mapping.

#![cfg(feature = "solver-clarabel")]

use chrono::NaiveDate;
use emsol_core::{Bus, EnergySystem, Flow, Gradient, Sink, Source, TimeIndex};
use emsol_model::{Model, SolveOptions, SolverStatus, TerminationCondition};

const TOL: f64 = 1e-4;

fn start() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Single plant behind a bus, demand pinned to `fix` of nominal 10.
fn ramp_system(fix: Vec<f64>, plant_flow: Flow) -> EnergySystem {
    let mut es = EnergySystem::new(TimeIndex::hourly(start(), fix.len()).unwrap());
    let plant = es.add_node(Source::new("plant"));
    let bus = es.add_node(Bus::new("electricity"));
    let demand = es.add_node(Sink::new("demand"));
    es.add_flow(plant, bus, plant_flow).unwrap();
    es.add_flow(
        bus,
        demand,
        Flow::builder().nominal_value(10.0).fix(fix).build().unwrap(),
    )
    .unwrap();
    es
}

#[test]
fn test_steep_rise_is_infeasible_not_fatal() {
    // demand jumps by 4 but the plant may only rise by 0.1 * 10 = 1
    let es = ramp_system(
        vec![0.1, 0.1, 0.5],
        Flow::builder()
            .nominal_value(10.0)
            .negative_gradient(Gradient::ub(0.1))
            .build()
            .unwrap(),
    );
    let mut model = Model::new(&es).unwrap();

    let result = model.solve(&SolveOptions::default()).unwrap().clone();
    assert!(!result.is_optimal());
    assert_eq!(result.status, SolverStatus::Warning);
    assert_eq!(result.termination, TerminationCondition::Infeasible);
    assert!(result.values.is_empty());

    // without a solution there is nothing to extract
    let err = model.results().unwrap_err();
    assert!(err.to_string().contains("no solution values"));
}

#[test]
fn test_wraparound_couples_last_and_first_timestep() {
    // within the horizon the demand only falls; the rise sits between the
    // last timestep (1) and the first (5), which only the wraparound sees
    let es = ramp_system(
        vec![0.5, 0.1, 0.1],
        Flow::builder()
            .nominal_value(10.0)
            .negative_gradient(Gradient::ub(0.1))
            .build()
            .unwrap(),
    );
    let mut model = Model::new(&es).unwrap();

    let result = model.solve(&SolveOptions::default()).unwrap().clone();
    assert_eq!(result.termination, TerminationCondition::Infeasible);
}

#[test]
fn test_priced_rise_settles_at_the_actual_ramp() {
    // demand 1, 1, 2: the only rise is 1 at t2, exactly the bound
    let es = ramp_system(
        vec![0.1, 0.1, 0.2],
        Flow::builder()
            .nominal_value(10.0)
            .variable_costs(1.0)
            .negative_gradient(Gradient::ub(0.1).with_costs(2.0))
            .build()
            .unwrap(),
    );
    let mut model = Model::new(&es).unwrap();

    let result = model.solve(&SolveOptions::default()).unwrap().clone();
    assert!(result.is_optimal());

    let results = model.results().unwrap();
    let record = results.flow("plant", "electricity").unwrap();
    let flow = &record.sequences["flow"];
    let rise = &record.sequences["negative_gradient"];

    for (t, expected) in [1.0, 1.0, 2.0].iter().enumerate() {
        assert!(
            (flow[t] - expected).abs() < TOL,
            "plant should track demand at t{t}, got {}",
            flow[t]
        );
    }
    // cost pressure pins the gradient variables to the realized ramps
    for (t, expected) in [0.0, 0.0, 1.0].iter().enumerate() {
        assert!(
            (rise[t] - expected).abs() < TOL,
            "rise at t{t} should be {expected}, got {}",
            rise[t]
        );
    }

    // flow costs 1*(1+1+2), gradient costs 2*1, unweighted
    let objective = result.objective.unwrap();
    assert!(
        (objective - 6.0).abs() < 1e-3,
        "objective should be 6, got {objective}"
    );
}

#[test]
fn test_positive_gradient_prices_the_fall() {
    // demand 2, 1, 1: the fall of 1 at t1 matches the bound 0.1 * 10
    let es = ramp_system(
        vec![0.2, 0.1, 0.1],
        Flow::builder()
            .nominal_value(10.0)
            .variable_costs(1.0)
            .positive_gradient(Gradient::ub(0.1).with_costs(3.0))
            .build()
            .unwrap(),
    );
    let mut model = Model::new(&es).unwrap();

    let result = model.solve(&SolveOptions::default()).unwrap().clone();
    assert!(result.is_optimal());

    let results = model.results().unwrap();
    let fall = &results.flow("plant", "electricity").unwrap().sequences["positive_gradient"];
    for (t, expected) in [0.0, 1.0, 0.0].iter().enumerate() {
        assert!(
            (fall[t] - expected).abs() < TOL,
            "fall at t{t} should be {expected}, got {}",
            fall[t]
        );
    }

    // flow costs 1*(2+1+1), gradient costs 3*1
    let objective = result.objective.unwrap();
    assert!(
        (objective - 7.0).abs() < 1e-3,
        "objective should be 7, got {objective}"
    );
}
