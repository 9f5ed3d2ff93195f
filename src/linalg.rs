//! Dense linear algebra helpers over `ndarray`.
//!
//! Singular values come from a one-sided Jacobi SVD, which is accurate for
//! the small, possibly rank-deficient outcome matrices this crate works with.

use log::{debug, error, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Result, RpsrError};

const MAX_SWEEPS: usize = 100;

/// Thin singular value decomposition `A = U · diag(s) · Vᵗ`
#[derive(Clone, Debug)]
pub struct Svd {
    /// `m × r` left singular vectors, `r = min(m, n)`
    pub u: Array2<f64>,
    /// singular values, descending
    pub s: Array1<f64>,
    /// `n × r` right singular vectors
    pub v: Array2<f64>,
}

impl Svd {
    pub fn new(matrix: ArrayView2<f64>) -> Self {
        let (rows, cols) = matrix.dim();
        if rows >= cols {
            let (u, s, v) = jacobi(matrix);
            Svd { u, s, v }
        } else {
            // Aᵗ = U Σ Vᵗ  =>  A = V Σ Uᵗ
            let (u, s, v) = jacobi(matrix.t());
            Svd { u: v, s, v: u }
        }
    }

    /// Singular value cutoff; `None` uses `σ_max · max(m, n) · ε`
    pub fn cutoff(&self, tolerance: Option<f64>) -> f64 {
        match tolerance {
            Some(tolerance) => tolerance,
            None => {
                let largest = self.s.iter().copied().fold(0.0, f64::max);
                let size = self.u.nrows().max(self.v.nrows()) as f64;
                largest * size * f64::EPSILON
            }
        }
    }

    pub fn rank(&self, tolerance: Option<f64>) -> usize {
        let cutoff = self.cutoff(tolerance);
        self.s.iter().filter(|&&sigma| sigma > cutoff).count()
    }

    /// Moore–Penrose pseudo-inverse `V · diag(s⁺) · Uᵗ`
    pub fn pseudo_inverse(&self, tolerance: Option<f64>) -> Array2<f64> {
        let cutoff = self.cutoff(tolerance);
        let inverted = self.s.mapv(|sigma| if sigma > cutoff { 1.0 / sigma } else { 0.0 });
        let scaled = &self.v * &inverted.insert_axis(Axis(0));
        scaled.dot(&self.u.t())
    }
}

/// One-sided Jacobi (Hestenes) SVD for a matrix with `m >= n`
fn jacobi(matrix: ArrayView2<f64>) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    let (rows, cols) = matrix.dim();
    let mut w = matrix.to_owned();
    let mut v = Array2::<f64>::eye(cols);

    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for p in 0..cols {
            for q in (p + 1)..cols {
                let alpha = w.column(p).dot(&w.column(p));
                let beta = w.column(q).dot(&w.column(q));
                let gamma = w.column(p).dot(&w.column(q));
                if gamma == 0.0 || gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let sign = if zeta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;

                rotate(&mut w, p, q, c, s);
                rotate(&mut v, p, q, c, s);
            }
        }
        if !rotated {
            break;
        }
    }

    let norms: Vec<f64> = w.axis_iter(Axis(1)).map(|column| column.dot(&column).sqrt()).collect();
    let mut order: Vec<usize> = (0..cols).collect();
    order.sort_by(|&i, &j| norms[j].total_cmp(&norms[i]));

    let mut u = Array2::zeros((rows, cols));
    let mut s = Array1::zeros(cols);
    let mut v_sorted = Array2::zeros((cols, cols));
    for (k, &j) in order.iter().enumerate() {
        s[k] = norms[j];
        if norms[j] > 0.0 {
            u.column_mut(k).assign(&(&w.column(j) / norms[j]));
        }
        v_sorted.column_mut(k).assign(&v.column(j));
    }

    (u, s, v_sorted)
}

fn rotate(matrix: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let x = row[p];
        let y = row[q];
        row[p] = c * x - s * y;
        row[q] = s * x + c * y;
    }
}

/// Numerical rank of `matrix`
pub fn matrix_rank(matrix: ArrayView2<f64>, tolerance: Option<f64>) -> usize {
    if matrix.is_empty() {
        return 0;
    }
    Svd::new(matrix).rank(tolerance)
}

/// Moore–Penrose pseudo-inverse of `matrix`
pub fn pinv(matrix: ArrayView2<f64>, tolerance: Option<f64>) -> Array2<f64> {
    let (rows, cols) = matrix.dim();
    if matrix.is_empty() {
        return Array2::zeros((cols, rows));
    }
    Svd::new(matrix).pseudo_inverse(tolerance)
}

/// Whether `vector` lies outside the span of `vectors`.
///
/// Compares the rank of the stacked vectors with and without the candidate.
/// The existing vectors must already be linearly independent; anything else
/// means the caller's basis is corrupt and this panics.
pub fn linearly_independent(vectors: &[Array1<f64>], vector: ArrayView1<f64>, tolerance: Option<f64>) -> bool {
    let dim = vector.len();
    let mut matrix = Array2::zeros((dim, vectors.len() + 1));
    for (j, column) in vectors.iter().enumerate() {
        matrix.column_mut(j).assign(column);
    }
    matrix.column_mut(vectors.len()).assign(&vector);

    let rank = if vectors.is_empty() {
        0
    } else {
        matrix_rank(matrix.slice(ndarray::s![.., ..vectors.len()]), tolerance)
    };

    if rank != vectors.len() {
        error!(
            "input vectors are not linearly independent (rank {} of {})",
            rank,
            vectors.len()
        );
        panic!("linear independence check on a dependent basis (rank {} of {})", rank, vectors.len());
    }

    let rank_with_vector = matrix_rank(matrix.view(), tolerance);
    debug!("ranks: {}, {}", rank, rank_with_vector);
    if rank_with_vector < rank || rank_with_vector > rank + 1 {
        warn!(
            "ranks ({}, {}) should either be the same or adjacent",
            rank, rank_with_vector
        );
    }

    rank_with_vector > rank
}

/// Every selection of one vector per slot, summed elementwise
pub fn cross_sum(slots: &[Vec<Array1<f64>>]) -> Vec<Array1<f64>> {
    if slots.is_empty() || slots.iter().any(|slot| slot.is_empty()) {
        return Vec::new();
    }

    let total: usize = slots.iter().map(|slot| slot.len()).product();
    let mut sums = Vec::with_capacity(total);
    let mut indices = vec![0usize; slots.len()];

    loop {
        let mut sum = slots[0][indices[0]].clone();
        for (slot, &i) in slots.iter().zip(indices.iter()).skip(1) {
            sum += &slot[i];
        }
        sums.push(sum);

        // odometer increment, last slot fastest
        let mut position = slots.len();
        loop {
            if position == 0 {
                return sums;
            }
            position -= 1;
            indices[position] += 1;
            if indices[position] < slots[position].len() {
                break;
            }
            indices[position] = 0;
        }
    }
}

/// Symmetric Hausdorff distance between the rows of `x` and the rows of `y`
pub fn max_bigraph_distance(x: ArrayView2<f64>, y: ArrayView2<f64>) -> Result<f64> {
    if x.ncols() != y.ncols() {
        return Err(RpsrError::dimension_mismatch(
            format!("{} columns", x.ncols()),
            format!("{} columns", y.ncols()),
        ));
    }
    if x.nrows() == 0 || y.nrows() == 0 {
        return Err(RpsrError::EmptyInput("distance between empty vector sets".to_string()));
    }

    let mut distances = Array2::zeros((x.nrows(), y.nrows()));
    for (i, xi) in x.axis_iter(Axis(0)).enumerate() {
        for (j, yj) in y.axis_iter(Axis(0)).enumerate() {
            let diff = &xi - &yj;
            distances[[i, j]] = diff.dot(&diff).sqrt();
        }
    }

    let x_to_y = distances
        .axis_iter(Axis(0))
        .map(|row| row.fold(f64::INFINITY, |a, &b| a.min(b)))
        .fold(0.0, f64::max);
    let y_to_x = distances
        .axis_iter(Axis(1))
        .map(|column| column.fold(f64::INFINITY, |a, &b| a.min(b)))
        .fold(0.0, f64::max);
    debug!("distance x -> y {}, y -> x {}", x_to_y, y_to_x);

    Ok(x_to_y.max(y_to_x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn standard_basis(n: usize) -> Vec<Array1<f64>> {
        Array2::<f64>::eye(n).axis_iter(Axis(0)).map(|row| row.to_owned()).collect()
    }

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_independent_rank() {
        let vectors = standard_basis(5);

        let vector = array![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(!linearly_independent(&vectors, vector.view(), None));
        assert!(linearly_independent(&vectors[..4], vector.view(), None));

        let vector = array![1.0, 2.0, 3.0, 4.0, 0.0];
        assert!(!linearly_independent(&vectors, vector.view(), None));
        assert!(!linearly_independent(&vectors[..4], vector.view(), None));
    }

    #[test]
    fn test_independent_edge_cases() {
        let zero = Array1::zeros(3);
        assert!(!linearly_independent(&[], zero.view(), None));
        assert!(linearly_independent(&[], array![0.0, 1e-3, 0.0].view(), None));
    }

    #[test]
    #[should_panic(expected = "dependent basis")]
    fn test_independent_rejects_dependent_basis() {
        let vectors = vec![array![1.0, 0.0], array![2.0, 0.0]];
        linearly_independent(&vectors, array![0.0, 1.0].view(), None);
    }

    #[test]
    fn test_svd_reconstructs() {
        let matrix = array![[3.0, 1.0], [1.0, 3.0], [0.0, 2.0]];
        let svd = Svd::new(matrix.view());
        let rebuilt = (&svd.u * &svd.s.clone().insert_axis(Axis(0))).dot(&svd.v.t());
        assert_close(&rebuilt, &matrix);
        assert!(svd.s[0] >= svd.s[1]);

        let wide = matrix.t().to_owned();
        let svd = Svd::new(wide.view());
        let rebuilt = (&svd.u * &svd.s.clone().insert_axis(Axis(0))).dot(&svd.v.t());
        assert_close(&rebuilt, &wide);
    }

    #[test]
    fn test_rank_deficient() {
        let matrix = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 0.0, 1.0]];
        assert_eq!(matrix_rank(matrix.view(), None), 2);
        assert_eq!(matrix_rank(Array2::<f64>::zeros((3, 3)).view(), None), 0);
        assert_eq!(matrix_rank(Array2::<f64>::eye(4).view(), None), 4);
    }

    #[test]
    fn test_pinv_properties() {
        let matrix = array![[1.0, 2.0], [2.0, 4.0], [0.0, 1.0]];
        let inverse = pinv(matrix.view(), None);
        assert_eq!(inverse.dim(), (2, 3));
        // A A⁺ A = A
        assert_close(&matrix.dot(&inverse).dot(&matrix), &matrix);
        // A⁺ A A⁺ = A⁺
        assert_close(&inverse.dot(&matrix).dot(&inverse), &inverse);

        let square = array![[2.0, 0.0], [0.0, 4.0]];
        assert_close(&pinv(square.view(), None), &array![[0.5, 0.0], [0.0, 0.25]]);
    }

    #[test]
    fn test_cross_sum() {
        let slots = vec![
            vec![array![1.0, 0.0], array![0.0, 1.0]],
            vec![array![10.0, 10.0], array![20.0, 20.0], array![30.0, 30.0]],
        ];
        let sums = cross_sum(&slots);
        assert_eq!(sums.len(), 6);
        assert_eq!(sums[0], array![11.0, 10.0]);
        assert_eq!(sums[5], array![30.0, 31.0]);

        assert_eq!(cross_sum(&slots[..1]), slots[0]);
        assert!(cross_sum(&[vec![array![1.0]], vec![]]).is_empty());
    }

    #[test]
    fn test_bigraph_distance() {
        let x = array![[0.0, 0.0], [1.0, 0.0]];
        let y = array![[0.0, 0.0]];
        assert_eq!(max_bigraph_distance(x.view(), x.view()).unwrap(), 0.0);
        assert!((max_bigraph_distance(x.view(), y.view()).unwrap() - 1.0).abs() < 1e-12);
        assert!(max_bigraph_distance(x.view(), array![[0.0]].view()).is_err());
    }
}
