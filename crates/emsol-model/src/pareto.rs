//! Pareto frontier sweeps over named objective buckets.
//!
//! [`Model::pareto`] scans the weight simplex spanned by the tracked
//! objectives: the integer grid `{0..npoints−1}^N` without the all-zero
//! corner, each vector scaled to sum 1, identical directions collapsed.
//! One weighted solve per direction records every tracked bucket's
//! realized value; a direction that does not reach optimality is recorded
//! as NaN. The dominance mask then marks the sweep points no other
//! retained point weakly dominates — frontier interpretation is the
//! caller's.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use emsol_core::{EmsolError, EmsolResult};

use crate::model::Model;
use crate::solver::SolveOptions;

/// Sweep outcome: per point a weight vector, the realized objective
/// values (aligned with `objectives`), and the dominance mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParetoFront {
    pub objectives: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub values: Vec<Vec<f64>>,
    pub mask: Vec<bool>,
}

impl ParetoFront {
    pub fn num_points(&self) -> usize {
        self.weights.len()
    }

    /// Indices of the retained (non-dominated) sweep points.
    pub fn efficient_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect()
    }
}

impl Model<'_> {
    /// Sweep the weight simplex over the named objectives with `npoints`
    /// grid points per axis.
    ///
    /// Duplicate names are dropped with a warning; fewer than two unique
    /// names, an unknown name, or `npoints < 2` fail before any solve.
    pub fn pareto<S: AsRef<str>>(
        &mut self,
        objectives: &[S],
        npoints: usize,
        options: &SolveOptions,
    ) -> EmsolResult<ParetoFront> {
        let mut tracked: Vec<String> = Vec::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut had_duplicates = false;
        for name in objectives {
            let name = name.as_ref();
            if seen.insert(name) {
                tracked.push(name.to_string());
            } else {
                had_duplicates = true;
            }
        }
        if had_duplicates {
            warn!("duplicate pareto objectives dropped");
        }
        if tracked.len() < 2 {
            return Err(EmsolError::Objective(
                "pareto needs at least 2 unique objectives".into(),
            ));
        }
        if npoints < 2 {
            return Err(EmsolError::Objective(format!(
                "pareto needs npoints >= 2, got {npoints}"
            )));
        }
        for name in &tracked {
            if self.objective_bucket(name).is_none() {
                return Err(self.unknown_objective(name));
            }
        }

        let directions = weight_directions(tracked.len(), npoints);
        info!(
            objectives = ?tracked,
            points = directions.len(),
            "sweeping pareto weight grid"
        );

        let mut weights = Vec::with_capacity(directions.len());
        let mut values = Vec::with_capacity(directions.len());
        for direction in directions {
            let sum: f64 = direction.iter().map(|&v| v as f64).sum();
            let normalized: Vec<f64> = direction.iter().map(|&v| v as f64 / sum).collect();
            let weight_map: BTreeMap<String, f64> = tracked
                .iter()
                .cloned()
                .zip(normalized.iter().copied())
                .collect();

            let (optimal, solution) = {
                let result = self.solve_weighted(&weight_map, options)?;
                (result.is_optimal(), result.values.clone())
            };
            let row = if optimal {
                tracked
                    .iter()
                    .map(|name| {
                        self.objective_bucket(name)
                            .map(|bucket| bucket.evaluate(&solution))
                            .unwrap_or(f64::NAN)
                    })
                    .collect()
            } else {
                warn!(
                    weights = ?normalized,
                    "pareto sweep point ended non-optimal; recording NaN"
                );
                vec![f64::NAN; tracked.len()]
            };
            weights.push(normalized);
            values.push(row);
        }

        let mask = pareto_mask(&values);
        Ok(ParetoFront {
            objectives: tracked,
            weights,
            values,
            mask,
        })
    }
}

/// Unique weight directions of the `{0..npoints−1}^ndim` grid without the
/// all-zero corner, as gcd-reduced integer vectors in sorted order. Two
/// grid vectors collapse exactly when they scale to the same direction.
fn weight_directions(ndim: usize, npoints: usize) -> Vec<Vec<u64>> {
    let base = npoints as u64;
    let total = base.pow(ndim as u32);
    let mut directions: BTreeSet<Vec<u64>> = BTreeSet::new();
    for code in 1..total {
        let mut rest = code;
        let mut vec = Vec::with_capacity(ndim);
        for _ in 0..ndim {
            vec.push(rest % base);
            rest /= base;
        }
        let g = vec.iter().copied().fold(0, gcd);
        for entry in &mut vec {
            *entry /= g;
        }
        directions.insert(vec);
    }
    directions.into_iter().collect()
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Dominance mask over cost rows (minimization).
///
/// A row is retained iff no other retained row weakly dominates it (≤ in
/// every coordinate); exact duplicates keep their first representative,
/// and rows containing NaN are never retained.
pub fn pareto_mask(costs: &[Vec<f64>]) -> Vec<bool> {
    let n = costs.len();
    let mut mask = vec![true; n];
    for (i, row) in costs.iter().enumerate() {
        if row.iter().any(|v| v.is_nan()) {
            mask[i] = false;
        }
    }
    for i in 0..n {
        if !mask[i] {
            continue;
        }
        for j in 0..n {
            if j == i || !mask[j] {
                continue;
            }
            // j survives the pivot only by being strictly better somewhere
            mask[j] = costs[j]
                .iter()
                .zip(costs[i].iter())
                .any(|(candidate, pivot)| candidate < pivot);
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_directions_drop_scalar_multiples() {
        let directions = weight_directions(2, 2);
        assert_eq!(directions, vec![vec![0, 1], vec![1, 0], vec![1, 1]]);

        // (2,2) collapses onto (1,1), (0,2) onto (0,1), (2,0) onto (1,0)
        let directions = weight_directions(2, 3);
        assert_eq!(
            directions,
            vec![
                vec![0, 1],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
                vec![2, 1],
            ]
        );
    }

    #[test]
    fn test_mask_keeps_mutually_nondominated_rows() {
        let costs = vec![vec![1.0, 4.0], vec![3.0, 1.0], vec![2.0, 2.0]];
        assert_eq!(pareto_mask(&costs), vec![true, true, true]);
    }

    #[test]
    fn test_mask_removes_dominated_and_duplicate_rows() {
        let costs = vec![vec![2.0, 2.0], vec![1.0, 1.0], vec![1.0, 1.0]];
        // the first duplicate to act as pivot represents both
        assert_eq!(pareto_mask(&costs), vec![false, true, false]);
    }

    #[test]
    fn test_mask_never_retains_nan_rows() {
        let costs = vec![vec![f64::NAN, 0.0], vec![5.0, 5.0]];
        assert_eq!(pareto_mask(&costs), vec![false, true]);
    }
}
