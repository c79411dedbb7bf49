//! Solver-independent linear program representation.
//!
//! Constraint blocks append variables and rows to a [`MathProgram`] without
//! knowing which backend will solve it. The representation is deliberately
//! plain: dense metadata per variable, one [`LinExpr`] per row, names kept
//! verbatim for diagnostics. Backends translate this into their own builder
//! API; [`MathProgram::write_lp`] dumps the whole program in CPLEX LP format
//! for offline inspection.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

/// Index of a variable within its [`MathProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarDomain {
    Continuous,
    Integer,
    Binary,
}

/// Variable metadata: bounds, domain, and a diagnostic name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDef {
    pub name: String,
    /// Lower bound; `f64::NEG_INFINITY` leaves the variable free below.
    pub lb: f64,
    /// Upper bound; `f64::INFINITY` leaves the variable free above.
    pub ub: f64,
    pub domain: VarDomain,
}

/// Sparse linear expression `Σ coeff·var + constant`.
///
/// Terms are keyed by [`VarId`] in a `BTreeMap`, so iteration order (and
/// everything derived from it, like LP text) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinExpr {
    pub terms: BTreeMap<VarId, f64>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(var, coeff);
        expr
    }

    /// Accumulate `coeff·var` into the expression.
    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        if coeff != 0.0 {
            *self.terms.entry(var).or_insert(0.0) += coeff;
        }
    }

    /// Accumulate `k·other` into the expression.
    pub fn add_scaled(&mut self, other: &LinExpr, k: f64) {
        self.constant += k * other.constant;
        for (&var, &coeff) in &other.terms {
            self.add_term(var, k * coeff);
        }
    }

    /// True when the expression carries neither terms nor a constant.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    /// Evaluate against a dense solution vector indexed by [`VarId`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let mut total = self.constant;
        for (&VarId(idx), &coeff) in &self.terms {
            total += coeff * values.get(idx).copied().unwrap_or(0.0);
        }
        total
    }
}

impl std::ops::AddAssign<&LinExpr> for LinExpr {
    fn add_assign(&mut self, other: &LinExpr) {
        self.add_scaled(other, 1.0);
    }
}

/// Row sense of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// One constraint row: `expr (≤|≥|=) rhs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintDef {
    pub name: String,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// Direction of optimization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// Variables plus constraint rows; the objective lives outside so several
/// objective expressions can share one program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MathProgram {
    vars: Vec<VarDef>,
    constraints: Vec<ConstraintDef>,
}

impl MathProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a continuous variable within `[lb, ub]`.
    pub fn add_var(&mut self, name: impl Into<String>, lb: f64, ub: f64) -> VarId {
        self.push_var(name.into(), lb, ub, VarDomain::Continuous)
    }

    /// Add an integer variable within `[lb, ub]`.
    pub fn add_integer_var(&mut self, name: impl Into<String>, lb: f64, ub: f64) -> VarId {
        self.push_var(name.into(), lb, ub, VarDomain::Integer)
    }

    /// Add a 0/1 variable.
    pub fn add_binary_var(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), 0.0, 1.0, VarDomain::Binary)
    }

    fn push_var(&mut self, name: String, lb: f64, ub: f64, domain: VarDomain) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name,
            lb,
            ub,
            domain,
        });
        id
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinExpr,
        sense: Sense,
        rhs: f64,
    ) {
        self.constraints.push(ConstraintDef {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.0]
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn constraints(&self) -> &[ConstraintDef] {
        &self.constraints
    }

    /// True when any variable is integer or binary.
    pub fn is_mip(&self) -> bool {
        self.vars
            .iter()
            .any(|v| v.domain != VarDomain::Continuous)
    }

    /// Turn every integer and binary variable continuous, keeping its
    /// bounds. Returns how many variables were relaxed.
    pub fn relax_integrality(&mut self) -> usize {
        let mut relaxed = 0;
        for v in &mut self.vars {
            if v.domain != VarDomain::Continuous {
                v.domain = VarDomain::Continuous;
                relaxed += 1;
            }
        }
        relaxed
    }

    /// Write the program with the given objective in CPLEX LP format.
    ///
    /// Names are sanitized to the LP identifier charset; collisions after
    /// sanitization are possible and acceptable for a debug artifact.
    pub fn write_lp(
        &self,
        objective: &LinExpr,
        sense: ObjectiveSense,
        out: &mut impl Write,
    ) -> io::Result<()> {
        match sense {
            ObjectiveSense::Minimize => write!(out, "Minimize\n obj: ")?,
            ObjectiveSense::Maximize => write!(out, "Maximize\n obj: ")?,
        }
        writeln!(out, "{}", self.fmt_lin(objective))?;
        writeln!(out, "Subject To")?;
        for c in &self.constraints {
            writeln!(
                out,
                " {}: {} {} {}",
                sanitize_lp_name(&c.name),
                self.fmt_lin(&c.expr),
                fmt_sense(c.sense),
                fmt_num(c.rhs)
            )?;
        }
        writeln!(out, "Bounds")?;
        for v in &self.vars {
            let name = sanitize_lp_name(&v.name);
            match (v.lb.is_finite(), v.ub.is_finite()) {
                (true, true) => {
                    writeln!(out, " {} <= {} <= {}", fmt_num(v.lb), name, fmt_num(v.ub))?
                }
                (true, false) => writeln!(out, " {} >= {}", name, fmt_num(v.lb))?,
                (false, true) => writeln!(out, " {} <= {}", name, fmt_num(v.ub))?,
                (false, false) => writeln!(out, " {} free", name)?,
            }
        }
        let generals: Vec<_> = self
            .vars
            .iter()
            .filter(|v| v.domain == VarDomain::Integer)
            .collect();
        if !generals.is_empty() {
            writeln!(out, "General")?;
            for v in generals {
                writeln!(out, " {}", sanitize_lp_name(&v.name))?;
            }
        }
        let binaries: Vec<_> = self
            .vars
            .iter()
            .filter(|v| v.domain == VarDomain::Binary)
            .collect();
        if !binaries.is_empty() {
            writeln!(out, "Binary")?;
            for v in binaries {
                writeln!(out, " {}", sanitize_lp_name(&v.name))?;
            }
        }
        writeln!(out, "End")?;
        Ok(())
    }

    fn fmt_lin(&self, expr: &LinExpr) -> String {
        let mut parts: Vec<String> = vec![];
        for (&var, &coeff) in &expr.terms {
            if coeff.abs() <= 1e-12 {
                continue;
            }
            let name = sanitize_lp_name(&self.vars[var.0].name);
            if (coeff - 1.0).abs() < 1e-12 {
                parts.push(format!("+1 {}", name));
            } else if (coeff + 1.0).abs() < 1e-12 {
                parts.push(format!("-1 {}", name));
            } else {
                parts.push(format!("{:+.6} {}", coeff, name));
            }
        }
        if parts.is_empty() {
            parts.push("+0".to_string());
        }
        if expr.constant.abs() > 1e-12 {
            parts.push(format!("{:+.6}", expr.constant));
        }
        parts.join(" ")
    }
}

fn fmt_sense(s: Sense) -> &'static str {
    match s {
        Sense::Le => "<=",
        Sense::Ge => ">=",
        Sense::Eq => "=",
    }
}

fn fmt_num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.6}", v)
    }
}

/// Restrict a name to the LP identifier charset.
fn sanitize_lp_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, 'v');
    }
    out
}
