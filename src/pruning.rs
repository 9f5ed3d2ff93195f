//! # Pruning Engine
//!
//! Reduces a set of alpha vectors to the minimal subset with the same upper
//! envelope over the region spanned by a set of witness points.
//!
//! Pruning runs in two phases:
//!
//! 1. **Domination check**: pointwise domination over the witness points,
//!    a cheap O(n²) filter.
//! 2. **Incremental enumeration**: for each remaining candidate, a linear
//!    program searches for a mixture of witness points where the candidate
//!    beats every vector accepted so far. Candidates without such a point
//!    are redundant; otherwise the best vector at the found point is
//!    accepted.
//!
//! [`Pruner::inc_prune`] folds a cross-sum slot by slot, pruning after every
//! pairwise combination to keep intermediate sets small.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use log::{debug, warn};
use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{Result, RpsrError};
use crate::linalg::cross_sum;

/// Relative slack on a witness margin, scaled by the largest LP coefficient
const LP_TOLERANCE: f64 = 1e-12;

/// Anything carrying a coefficient vector that pruning can act on
pub trait AsVector {
    fn as_vector(&self) -> ArrayView1<'_, f64>;
}

impl AsVector for Array1<f64> {
    fn as_vector(&self) -> ArrayView1<'_, f64> {
        self.view()
    }
}

/// Vector pruning against a fixed set of witness points
pub struct Pruner<'w> {
    witness: ArrayView2<'w, f64>,
    epsilon: f64,
    lp_failures: AtomicUsize,
}

impl<'w> Pruner<'w> {
    /// `witness` holds one point per row; `epsilon` is the margin a
    /// candidate must win by to survive (0 for exact pruning).
    pub fn new(witness: ArrayView2<'w, f64>, epsilon: f64) -> Result<Self> {
        if !(epsilon >= 0.0) {
            return Err(RpsrError::invalid_parameter(
                "epsilon".to_string(),
                format!("must be non-negative, got {}", epsilon),
            ));
        }
        if witness.nrows() == 0 || witness.ncols() == 0 {
            return Err(RpsrError::dimension_mismatch(
                "non-empty witness point matrix".to_string(),
                format!("{:?}", witness.dim()),
            ));
        }

        Ok(Pruner {
            witness,
            epsilon,
            lp_failures: AtomicUsize::new(0),
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of linear programs the solver failed on so far
    pub fn lp_failures(&self) -> usize {
        self.lp_failures.load(AtomicOrdering::Relaxed)
    }

    fn check_dimensions<T: AsVector>(&self, objects: &[T]) -> Result<()> {
        let dim = self.witness.ncols();
        match objects.iter().find(|object| object.as_vector().len() != dim) {
            Some(object) => Err(RpsrError::dimension_mismatch(
                format!("vectors of length {}", dim),
                format!("vector of length {}", object.as_vector().len()),
            )),
            None => Ok(()),
        }
    }

    fn values<T: AsVector>(&self, objects: &[T]) -> Vec<Array1<f64>> {
        objects
            .iter()
            .map(|object| self.witness.dot(&object.as_vector()))
            .collect()
    }

    /// Remove every object whose vector is never strictly best
    pub fn purge<T: AsVector>(&self, objects: Vec<T>) -> Result<Vec<T>> {
        self.check_dimensions(&objects)?;
        let count = objects.len();

        let objects = self.domination_check(objects)?;
        let undominated = objects.len();

        let keep = self.purge_indices(&objects);
        let purged: Vec<T> = objects
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, object)| object)
            .collect();

        debug!("purging result {} -> {} -> {}", count, undominated, purged.len());
        Ok(purged)
    }

    /// Drop objects pointwise dominated at every witness point
    pub fn domination_check<T: AsVector>(&self, objects: Vec<T>) -> Result<Vec<T>> {
        self.check_dimensions(&objects)?;
        if objects.len() < 2 {
            return Ok(objects);
        }

        let values = self.values(&objects);
        let dominates = |i: usize, j: usize| values[i].iter().zip(values[j].iter()).all(|(a, b)| a >= b);

        let mut accepted: Vec<usize> = Vec::new();
        for i in 0..objects.len() {
            if accepted.iter().any(|&j| dominates(j, i)) {
                continue;
            }
            accepted.retain(|&j| !dominates(i, j));
            accepted.push(i);
        }

        let keep: BTreeSet<usize> = accepted.into_iter().collect();
        Ok(objects
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, object)| object)
            .collect())
    }

    fn purge_indices<T: AsVector>(&self, objects: &[T]) -> BTreeSet<usize> {
        let mut accepted = BTreeSet::new();
        if objects.is_empty() {
            return accepted;
        }

        // Seed with the lexicographic maximum of the witness values, so ties
        // at the first witness point cannot seed a redundant vector.
        let values = self.values(objects);
        let mut seed = 0;
        for i in 1..objects.len() {
            if lexicographic(&values[i], &values[seed]) == Ordering::Greater {
                seed = i;
            }
        }
        accepted.insert(seed);

        let mut remaining: BTreeSet<usize> = (0..objects.len()).filter(|&i| i != seed).collect();
        while let Some(&k) = remaining.iter().next() {
            let others: Vec<ArrayView1<f64>> = accepted.iter().map(|&i| objects[i].as_vector()).collect();

            let witness = if others.is_empty() {
                None
            } else {
                match self.dominate(objects[k].as_vector(), &others) {
                    Some(point) => Some(point),
                    None => {
                        // no region where k beats the accepted set
                        remaining.remove(&k);
                        continue;
                    }
                }
            };

            let best = match witness {
                Some(point) => {
                    let mut best = k;
                    let mut best_value = f64::NEG_INFINITY;
                    for &i in &remaining {
                        let value = objects[i].as_vector().dot(&point);
                        if value > best_value {
                            best = i;
                            best_value = value;
                        }
                    }
                    best
                }
                None => k,
            };
            accepted.insert(best);
            remaining.remove(&best);
        }

        accepted
    }

    /// Search for a point where `alpha` beats every vector in `others` by
    /// more than epsilon.
    ///
    /// Solves `max d` s.t. `b ≥ 0`, `Σb = 1`, `(A − α)·Wᵗ·b + d ≤ 0` for each
    /// row `A` of `others`, with `W` the witness points. Returns `Wᵗ·b` when
    /// the optimum exceeds epsilon. Solver failures count as "no point".
    pub fn dominate(&self, alpha: ArrayView1<f64>, others: &[ArrayView1<f64>]) -> Option<Array1<f64>> {
        let num_points = self.witness.nrows();

        let mut problem = Problem::new(OptimizationDirection::Maximize);
        let b: Vec<_> = (0..num_points).map(|_| problem.add_var(0.0, (0.0, f64::INFINITY))).collect();
        let d = problem.add_var(1.0, (f64::NEG_INFINITY, f64::INFINITY));

        let mut simplex = LinearExpr::empty();
        for &var in &b {
            simplex.add(var, 1.0);
        }
        problem.add_constraint(simplex, ComparisonOp::Eq, 1.0);

        let mut scale: f64 = 0.0;
        for other in others {
            let coefficients = self.witness.dot(&(other - &alpha));
            scale = coefficients.iter().fold(scale, |m, c| m.max(c.abs()));
            let mut expr = LinearExpr::empty();
            for (&var, &coefficient) in b.iter().zip(coefficients.iter()) {
                expr.add(var, coefficient);
            }
            expr.add(d, 1.0);
            problem.add_constraint(expr, ComparisonOp::Le, 0.0);
        }

        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(err) => {
                self.record_lp_failure(&err, others.len());
                return None;
            }
        };

        if solution[d] <= self.epsilon {
            return None;
        }

        // The solver's optimum carries rounding error; re-check the margin
        // at the point it found, against a tolerance scaled to the LP.
        let weights = Array1::from_iter(b.iter().map(|&var| solution[var]));
        let point = self.witness.t().dot(&weights);
        let envelope = others
            .iter()
            .map(|other| other.dot(&point))
            .fold(f64::NEG_INFINITY, f64::max);
        let margin = alpha.dot(&point) - envelope;
        if margin <= self.epsilon + LP_TOLERANCE * scale {
            debug!("witness margin {} within tolerance; candidate redundant", margin);
            return None;
        }

        Some(point)
    }

    fn record_lp_failure(&self, reason: &dyn fmt::Display, against: usize) {
        let failures = self.lp_failures.fetch_add(1, AtomicOrdering::Relaxed) + 1;
        warn!(
            "witness LP failed ({}) against {} vectors; treating candidate as redundant ({} failures so far)",
            reason, against, failures
        );
    }

    /// Pruned cross-sum, folding one slot at a time
    pub fn inc_prune(&self, slots: &[Vec<Array1<f64>>]) -> Result<Vec<Array1<f64>>> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let head = slots.len().min(2);
        let mut pruned = self.purge(cross_sum(&slots[..head]))?;
        for slot in &slots[head..] {
            let pair = [pruned, slot.clone()];
            pruned = self.purge(cross_sum(&pair))?;
        }

        Ok(pruned)
    }
}

fn lexicographic(a: &Array1<f64>, b: &Array1<f64>) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Standalone pruning of plain vectors against `witness` points (rows)
pub fn prune(vectors: Vec<Array1<f64>>, witness: ArrayView2<f64>, epsilon: f64) -> Result<Vec<Array1<f64>>> {
    Pruner::new(witness, epsilon)?.purge(vectors)
}
