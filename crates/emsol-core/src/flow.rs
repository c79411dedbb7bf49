//! Flow attributes and their option bundles.
//!
//! A [`Flow`] is the attribute bundle on a directed edge between two nodes:
//! capacity, per-timestep bounds and costs, and the optional investment,
//! non-convexity, multi-substance and multi-objective extensions. All
//! cross-attribute rules are checked once, in [`FlowBuilder::build`], so a
//! constructed flow is structurally valid before any model sees it:
//!
//! - `fix` excludes explicit `min`/`max`;
//! - `investment` excludes a concrete `nominal_value` and excludes
//!   `nonconvex`;
//! - gradient bounds on the `nonconvex` option exclude standard gradient
//!   bounds on the same flow;
//! - `nonconvex` requires a `nominal_value` (the on/off bounds scale with
//!   it);
//! - gradient bounds require a `nominal_value` too, unless the capacity
//!   comes from an investment (then they are skipped with a warning).
//!
//! Dubious-but-legal combinations (multi-objective terms next to standard
//! costs or an investment) are logged as warnings and left alone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EmsolError, EmsolResult};
use crate::sequence::Sequence;

/// A ramping bound plus the price of using it.
///
/// `ub` limits how fast the flow may change between consecutive timesteps
/// (relative to `nominal_value`); `costs` prices the gradient variable the
/// model introduces for bounded flows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Per-timestep bound relative to `nominal_value`; `None` = unbounded.
    pub ub: Option<Sequence>,
    /// Cost per unit of gradient, charged in the standard bucket.
    pub costs: f64,
}

impl Gradient {
    /// Bound without a cost term.
    pub fn ub(ub: impl Into<Sequence>) -> Self {
        Self {
            ub: Some(ub.into()),
            costs: 0.0,
        }
    }

    pub fn with_costs(mut self, costs: f64) -> Self {
        self.costs = costs;
        self
    }

    /// True when a bound is declared.
    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.ub.is_some()
    }
}

/// Capacity-expansion option: the flow's capacity becomes a decision
/// variable within `[minimum, maximum]`, priced at `ep_costs` per unit of
/// new capacity on top of `existing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    /// Equivalent periodical costs per unit of newly invested capacity.
    pub ep_costs: f64,
    /// Capacity that exists before any investment.
    pub existing: f64,
    /// Lower bound on new capacity.
    pub minimum: f64,
    /// Upper bound on new capacity.
    pub maximum: f64,
}

impl Investment {
    pub fn new(ep_costs: f64) -> Self {
        Self {
            ep_costs,
            existing: 0.0,
            minimum: 0.0,
            maximum: f64::INFINITY,
        }
    }

    pub fn with_existing(mut self, existing: f64) -> Self {
        self.existing = existing;
        self
    }

    pub fn with_limits(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }
}

impl Default for Investment {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// On/off option: the flow's activation becomes a binary decision with
/// big-M bounds, optional transition costs, and its own gradient bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NonConvex {
    /// Costs charged per startup event.
    pub startup_costs: Option<Sequence>,
    /// Costs charged per shutdown event.
    pub shutdown_costs: Option<Sequence>,
    /// Costs charged per timestep the flow is active.
    pub activity_costs: Option<Sequence>,
    /// Ramping bound while the on/off mechanism is active; excludes the
    /// standard gradient bounds on the same flow.
    pub positive_gradient: Gradient,
    pub negative_gradient: Gradient,
}

impl NonConvex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_startup_costs(mut self, costs: impl Into<Sequence>) -> Self {
        self.startup_costs = Some(costs.into());
        self
    }

    pub fn with_shutdown_costs(mut self, costs: impl Into<Sequence>) -> Self {
        self.shutdown_costs = Some(costs.into());
        self
    }

    pub fn with_activity_costs(mut self, costs: impl Into<Sequence>) -> Self {
        self.activity_costs = Some(costs.into());
        self
    }

    pub fn with_positive_gradient(mut self, gradient: Gradient) -> Self {
        self.positive_gradient = gradient;
        self
    }

    pub fn with_negative_gradient(mut self, gradient: Gradient) -> Self {
        self.negative_gradient = gradient;
        self
    }

    fn has_gradient(&self) -> bool {
        self.positive_gradient.is_bounded() || self.negative_gradient.is_bounded()
    }
}

/// One named cost term of a multi-objective flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiObjectiveTerm {
    /// Per-timestep costs contributed to this term's bucket.
    pub variable_costs: Option<Sequence>,
    /// Prices for the standard gradient variables, redirected into this
    /// term's bucket.
    pub positive_gradient: Gradient,
    pub negative_gradient: Gradient,
}

impl MultiObjectiveTerm {
    pub fn costs(variable_costs: impl Into<Sequence>) -> Self {
        Self {
            variable_costs: Some(variable_costs.into()),
            ..Self::default()
        }
    }

    pub fn with_positive_gradient(mut self, gradient: Gradient) -> Self {
        self.positive_gradient = gradient;
        self
    }

    pub fn with_negative_gradient(mut self, gradient: Gradient) -> Self {
        self.negative_gradient = gradient;
        self
    }
}

/// Named objective sub-terms of a flow; the bucket names these introduce
/// become the objective mapping keys of the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiObjective {
    pub objectives: BTreeMap<String, MultiObjectiveTerm>,
}

impl MultiObjective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, name: impl Into<String>, term: MultiObjectiveTerm) -> Self {
        self.objectives.insert(name.into(), term);
        self
    }

    /// Shorthand for plain per-bucket variable costs.
    pub fn costs(self, name: impl Into<String>, variable_costs: impl Into<Sequence>) -> Self {
        self.term(name, MultiObjectiveTerm::costs(variable_costs))
    }
}

/// Directed edge attribute bundle between two nodes.
///
/// Construct through [`Flow::builder`]; the builder enforces the
/// cross-attribute rules listed in the module docs. Fields stay public for
/// inspection by the model layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Capacity scale; `None` means "determined by investment".
    pub nominal_value: Option<f64>,
    /// Lower bound relative to `nominal_value` (default 0, or −1 when
    /// bidirectional).
    pub min: Sequence,
    /// Upper bound relative to `nominal_value` (default 1).
    pub max: Sequence,
    /// Exogenously fixed normalized value; pins the flow variable.
    pub fix: Option<Sequence>,
    /// Costs per unit of flow, standard bucket (default 0).
    pub variable_costs: Sequence,
    /// Aggregate horizon bound: Σ flow·τ ≤ `summed_max`·`nominal_value`.
    pub summed_max: Option<f64>,
    /// Aggregate horizon bound: Σ flow·τ ≥ `summed_min`·`nominal_value`.
    pub summed_min: Option<f64>,
    pub positive_gradient: Gradient,
    pub negative_gradient: Gradient,
    /// Restrict the flow to integer values.
    pub integer: bool,
    /// Marker: the flow may run against its direction (min defaults to −1).
    pub bidirectional: bool,
    pub investment: Option<Investment>,
    pub nonconvex: Option<NonConvex>,
    pub multiobjective: Option<MultiObjective>,
    /// Per-substance concentration over time; empty = substance-unaware.
    pub substances: BTreeMap<String, Sequence>,
}

impl Flow {
    pub fn builder() -> FlowBuilder {
        FlowBuilder::default()
    }

    /// A flow with nothing but the defaults (free within `[0, ∞)` until a
    /// `nominal_value` scales it).
    pub fn new() -> Self {
        Flow::builder().build().expect("default flow is valid")
    }
}

impl Default for Flow {
    fn default() -> Self {
        Flow::new()
    }
}

/// Keyword-style construction for [`Flow`]; `build` validates the bundle.
#[derive(Debug, Clone, Default)]
pub struct FlowBuilder {
    nominal_value: Option<f64>,
    min: Option<Sequence>,
    max: Option<Sequence>,
    fix: Option<Sequence>,
    variable_costs: Option<Sequence>,
    summed_max: Option<f64>,
    summed_min: Option<f64>,
    positive_gradient: Gradient,
    negative_gradient: Gradient,
    integer: bool,
    bidirectional: bool,
    investment: Option<Investment>,
    nonconvex: Option<NonConvex>,
    multiobjective: Option<MultiObjective>,
    substances: BTreeMap<String, Sequence>,
}

impl FlowBuilder {
    pub fn nominal_value(mut self, value: f64) -> Self {
        self.nominal_value = Some(value);
        self
    }

    pub fn min(mut self, min: impl Into<Sequence>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<Sequence>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn fix(mut self, fix: impl Into<Sequence>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn variable_costs(mut self, costs: impl Into<Sequence>) -> Self {
        self.variable_costs = Some(costs.into());
        self
    }

    pub fn summed_max(mut self, bound: f64) -> Self {
        self.summed_max = Some(bound);
        self
    }

    pub fn summed_min(mut self, bound: f64) -> Self {
        self.summed_min = Some(bound);
        self
    }

    pub fn positive_gradient(mut self, gradient: Gradient) -> Self {
        self.positive_gradient = gradient;
        self
    }

    pub fn negative_gradient(mut self, gradient: Gradient) -> Self {
        self.negative_gradient = gradient;
        self
    }

    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    pub fn investment(mut self, investment: Investment) -> Self {
        self.investment = Some(investment);
        self
    }

    pub fn nonconvex(mut self, nonconvex: NonConvex) -> Self {
        self.nonconvex = Some(nonconvex);
        self
    }

    pub fn multiobjective(mut self, multiobjective: MultiObjective) -> Self {
        self.multiobjective = Some(multiobjective);
        self
    }

    /// Declare one substance concentration; call repeatedly for several.
    pub fn substance(mut self, name: impl Into<String>, concentration: impl Into<Sequence>) -> Self {
        self.substances.insert(name.into(), concentration.into());
        self
    }

    /// Validate the bundle and produce the flow.
    pub fn build(self) -> EmsolResult<Flow> {
        if self.fix.is_some() && (self.min.is_some() || self.max.is_some()) {
            return Err(EmsolError::Validation(
                "min and max must not be set when fix is given".into(),
            ));
        }
        if self.investment.is_some() && self.nominal_value.is_some() {
            return Err(EmsolError::Validation(
                "nominal_value must not be set when capacity comes from investment".into(),
            ));
        }
        if self.investment.is_some() && self.nonconvex.is_some() {
            return Err(EmsolError::Validation(
                "investment and nonconvex cannot be combined on the same flow".into(),
            ));
        }
        let standard_gradient =
            self.positive_gradient.is_bounded() || self.negative_gradient.is_bounded();
        if let Some(nonconvex) = &self.nonconvex {
            if nonconvex.has_gradient() && standard_gradient {
                return Err(EmsolError::Validation(
                    "gradients on the nonconvex option exclude standard gradients \
                     on the same flow"
                        .into(),
                ));
            }
            if self.nominal_value.is_none() {
                return Err(EmsolError::Validation(
                    "nonconvex flows need a nominal_value to scale the on/off bounds".into(),
                ));
            }
        }

        let variable_costs = self.variable_costs.unwrap_or_default();
        if let Some(multiobjective) = &self.multiobjective {
            if !variable_costs.is_zero() {
                warn!(
                    objectives = ?multiobjective.objectives.keys().collect::<Vec<_>>(),
                    "flow carries multiobjective terms next to standard variable_costs; \
                     the standard costs stay in the \"_standard\" bucket"
                );
            }
            if self.investment.is_some() {
                warn!(
                    "flow carries multiobjective terms next to an investment; \
                     the investment costs stay in the \"_standard\" bucket"
                );
            }
        }
        if standard_gradient && self.investment.is_some() {
            warn!(
                "gradient bounds on an investment flow are not built \
                 (no fixed capacity to scale them)"
            );
        }
        if standard_gradient && self.nominal_value.is_none() && self.investment.is_none() {
            return Err(EmsolError::Validation(
                "gradient bounds need a nominal_value to scale against".into(),
            ));
        }

        let min = match self.min {
            Some(min) => min,
            None if self.bidirectional => Sequence::from(-1.0),
            None => Sequence::from(0.0),
        };
        let max = self.max.unwrap_or_else(|| Sequence::from(1.0));

        Ok(Flow {
            nominal_value: self.nominal_value,
            min,
            max,
            fix: self.fix,
            variable_costs,
            summed_max: self.summed_max,
            summed_min: self.summed_min,
            positive_gradient: self.positive_gradient,
            negative_gradient: self.negative_gradient,
            integer: self.integer,
            bidirectional: self.bidirectional,
            investment: self.investment,
            nonconvex: self.nonconvex,
            multiobjective: self.multiobjective,
            substances: self.substances,
        })
    }
}
