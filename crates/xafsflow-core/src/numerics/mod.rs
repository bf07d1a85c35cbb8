pub mod interpolation;
pub mod kfold;
pub mod lasso;

pub use interpolation::{InterpolationError, InterpolationMethod, interpolate_series};
pub use kfold::{CrossValidationError, FoldSplit, KFold, SimpleRng};
pub use lasso::{
    CoordinateDescentSettings, CoordinateSelection, LassoError, LassoFit, alpha_grid,
    fit_positive_lasso, positive_lasso_path,
};

use faer::Mat;

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn dot(lhs: &[f64], rhs: &[f64]) -> f64 {
    lhs.iter().zip(rhs).map(|(a, b)| a * b).sum()
}

/// Dot product of column `col` of `matrix` with `vector`.
pub fn column_dot(matrix: &Mat<f64>, col: usize, vector: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (row, value) in vector.iter().enumerate() {
        sum += matrix[(row, col)] * value;
    }
    sum
}

/// `matrix · coefficients` for a dense column-major design matrix.
pub fn matvec(matrix: &Mat<f64>, coefficients: &[f64]) -> Vec<f64> {
    let mut output = vec![0.0; matrix.nrows()];
    for (col, &weight) in coefficients.iter().enumerate() {
        if weight == 0.0 {
            continue;
        }
        for (row, value) in output.iter_mut().enumerate() {
            *value += matrix[(row, col)] * weight;
        }
    }
    output
}

/// Rows `rows` of `matrix`, in the given order.
pub fn select_rows(matrix: &Mat<f64>, rows: &[usize]) -> Mat<f64> {
    Mat::from_fn(rows.len(), matrix.ncols(), |row, col| matrix[(rows[row], col)])
}

pub fn deterministic_argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_unstable_by(|lhs, rhs| {
        values[*lhs]
            .total_cmp(&values[*rhs])
            .then_with(|| lhs.cmp(rhs))
    });
    indices
}

/// Sorted, de-duplicated copy of the finite entries of `values`, with `-0.0`
/// folded into `0.0`.
pub fn sorted_unique(values: &[f64]) -> Vec<f64> {
    let mut output: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v + 0.0)
        .collect();
    output.sort_unstable_by(f64::total_cmp);
    output.dedup();
    output
}

/// Inclusive evenly spaced grid `start, start + step, ..` up to `stop`.
///
/// The end point is kept when it lies within half a millionth of a step of
/// the last generated point.
pub fn arange_grid(start: f64, stop: f64, step: f64) -> Option<Vec<f64>> {
    if !start.is_finite() || !stop.is_finite() || !step.is_finite() || step <= 0.0 {
        return None;
    }
    if stop < start {
        return Some(Vec::new());
    }

    let count = ((stop - start) / step + 5.0e-7).floor() as usize + 1;
    Some(
        (0..count)
            .map(|index| start + step * (index as f64))
            .collect(),
    )
}
