//! Distances between value functions, used as convergence signals.

use std::collections::BTreeSet;

use ndarray::{stack, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RpsrError};
use crate::linalg::max_bigraph_distance;
use crate::value_function::ValueFunction;

/// Distance between two value functions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    /// Per action, the symmetric Hausdorff distance between the two alpha
    /// sets; the maximum over actions. Infinite when the action sets differ.
    Alpha,
    /// Absolute difference of the values at a fixed state
    BellmanAtStart(Array1<f64>),
}

impl Metric {
    pub fn distance(&self, x: &ValueFunction, y: &ValueFunction) -> Result<f64> {
        match self {
            Metric::Alpha => alpha_distance(x, y),
            Metric::BellmanAtStart(state) => Ok((x.value(state.view())? - y.value(state.view())?).abs()),
        }
    }
}

fn alpha_distance(x: &ValueFunction, y: &ValueFunction) -> Result<f64> {
    let actions: BTreeSet<Option<usize>> = x.actions().into_iter().collect();
    if actions != y.actions().into_iter().collect() {
        return Ok(f64::INFINITY);
    }
    if actions.is_empty() {
        return Err(RpsrError::EmptyInput("distance between empty value functions".to_string()));
    }

    let mut distance: f64 = 0.0;
    for action in actions {
        let xs = rows_for(x, action)?;
        let ys = rows_for(y, action)?;
        distance = distance.max(max_bigraph_distance(xs.view(), ys.view())?);
    }
    Ok(distance)
}

fn rows_for(vf: &ValueFunction, action: Option<usize>) -> Result<Array2<f64>> {
    let vectors: Vec<_> = vf
        .alphas()
        .iter()
        .filter(|alpha| alpha.action == action)
        .map(|alpha| alpha.vector.view())
        .collect();
    stack(Axis(0), &vectors).map_err(|e| {
        RpsrError::dimension_mismatch("alphas of equal length".to_string(), e.to_string())
    })
}
