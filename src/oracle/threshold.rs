//! Per-pair link thresholds.

use serde::{Deserialize, Serialize};
use crate::model::VarId;
use crate::{Error, Result};

/// Symmetric `n × n` matrix of non-negative thresholds.
///
/// Entry `(i, j)` is the amount of unexplained colexification evidence a
/// link `i — j` must exceed to survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMatrix {
    n: usize,
    values: Vec<f64>,
}

impl ThresholdMatrix {
    /// Every pair gets the same threshold.
    pub fn uniform(n: usize, threshold: f64) -> Result<Self> {
        check(0, 0, threshold)?;
        Ok(Self { n, values: vec![threshold; n * n] })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: VarId, j: VarId) -> f64 {
        self.values[i * self.n + j]
    }

    /// Set `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: VarId, j: VarId, threshold: f64) -> Result<()> {
        check(i, j, threshold)?;
        if i >= self.n || j >= self.n {
            return Err(Error::DimensionMismatch { expected: self.n, got: i.max(j) + 1 });
        }
        self.values[i * self.n + j] = threshold;
        self.values[j * self.n + i] = threshold;
        Ok(())
    }
}

fn check(i: VarId, j: VarId, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { i, j, value })
    }
}
