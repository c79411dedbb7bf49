//! Scalar-or-vector time series parameters.
//!
//! Nearly every flow attribute is "a number, or a number per timestep".
//! [`Sequence`] makes that distinction explicit once, so the model layer can
//! index any attribute at any timestep without re-checking which form the
//! caller supplied: a scalar broadcasts to every index, a vector is used
//! as-is after its length has been validated against the horizon.
//!
//! # Usage
//!
//! ```
//! use emsol_core::Sequence;
//!
//! let flat = Sequence::from(0.5);
//! let shaped = Sequence::from(vec![0.1, 0.9, 0.4]);
//!
//! assert_eq!(flat.value_at(17), 0.5);       // broadcast at any index
//! assert_eq!(shaped.value_at(1), 0.9);
//! assert_eq!(flat.materialize(3), vec![0.5, 0.5, 0.5]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EmsolError, EmsolResult};

/// A per-timestep parameter: a single broadcast value or one value per step.
///
/// The scalar form is the lazy/infinite case — it answers for any index, so
/// horizon-independent defaults (`min = 0`, `max = 1`, costs) need no
/// materialization. The vector form must match the model horizon exactly;
/// [`Sequence::check_len`] enforces that before any block indexes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sequence {
    /// One value broadcast to every timestep.
    Scalar(f64),
    /// One value per timestep; length must equal the model horizon.
    Values(Vec<f64>),
}

impl Sequence {
    /// Value at timestep `t`.
    ///
    /// Scalars answer for any `t`. For the vector form, callers must have
    /// run [`check_len`](Self::check_len) first; indexing past the end is a
    /// programming error and panics like any slice access.
    #[inline]
    pub fn value_at(&self, t: usize) -> f64 {
        match self {
            Sequence::Scalar(v) => *v,
            Sequence::Values(vs) => vs[t],
        }
    }

    /// Fixed-length view: broadcasts a scalar, clones a vector.
    pub fn materialize(&self, len: usize) -> Vec<f64> {
        match self {
            Sequence::Scalar(v) => vec![*v; len],
            Sequence::Values(vs) => vs.clone(),
        }
    }

    /// Validates the vector form against the horizon length.
    ///
    /// `what` names the attribute in the error message, e.g.
    /// `"max of flow (gas, boiler)"`.
    pub fn check_len(&self, len: usize, what: &str) -> EmsolResult<()> {
        match self {
            Sequence::Scalar(_) => Ok(()),
            Sequence::Values(vs) if vs.len() == len => Ok(()),
            Sequence::Values(vs) => Err(EmsolError::Validation(format!(
                "{} has {} entries but the time index has {} steps",
                what,
                vs.len(),
                len
            ))),
        }
    }

    /// True when every entry equals zero (used for "has this flow any
    /// standard cost" checks).
    pub fn is_zero(&self) -> bool {
        match self {
            Sequence::Scalar(v) => *v == 0.0,
            Sequence::Values(vs) => vs.iter().all(|v| *v == 0.0),
        }
    }
}

impl From<f64> for Sequence {
    fn from(v: f64) -> Self {
        Sequence::Scalar(v)
    }
}

impl From<Vec<f64>> for Sequence {
    fn from(vs: Vec<f64>) -> Self {
        Sequence::Values(vs)
    }
}

impl From<&[f64]> for Sequence {
    fn from(vs: &[f64]) -> Self {
        Sequence::Values(vs.to_vec())
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Sequence::Scalar(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_broadcasts_to_every_index() {
        let s = Sequence::from(2.5);
        for t in [0, 1, 7, 8760] {
            assert_eq!(s.value_at(t), 2.5);
        }
        assert_eq!(s.materialize(4), vec![2.5; 4]);
    }

    #[test]
    fn test_vector_passthrough_is_equal() {
        let vs = vec![1.0, 2.0, 3.0];
        let s = Sequence::from(vs.clone());
        assert_eq!(s.materialize(3), vs);
        assert_eq!(s, Sequence::from(vs));
    }

    #[test]
    fn test_length_check() {
        let s = Sequence::from(vec![1.0, 2.0]);
        assert!(s.check_len(2, "max").is_ok());

        let err = s.check_len(3, "max of flow (a, b)").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("max of flow (a, b)"), "message was: {msg}");
        assert!(msg.contains("2 entries"));
        assert!(msg.contains("3 steps"));

        // scalars fit any horizon
        assert!(Sequence::from(1.0).check_len(8760, "min").is_ok());
    }

    #[test]
    fn test_is_zero() {
        assert!(Sequence::from(0.0).is_zero());
        assert!(Sequence::from(vec![0.0, 0.0]).is_zero());
        assert!(!Sequence::from(vec![0.0, 0.1]).is_zero());
        assert!(!Sequence::from(3.0).is_zero());
    }

    #[test]
    fn test_serde_untagged_roundtrip() {
        let scalar: Sequence = serde_json::from_str("0.75").unwrap();
        assert_eq!(scalar, Sequence::Scalar(0.75));

        let vector: Sequence = serde_json::from_str("[1.0, 0.0, 2.0]").unwrap();
        assert_eq!(vector, Sequence::Values(vec![1.0, 0.0, 2.0]));
    }
}
