//! Non-negative lasso by cyclic (or random) coordinate descent.
//!
//! Minimises `(1 / 2n) * ||y - Xw||^2 + alpha * ||w||_1` subject to `w >= 0`
//! without an intercept. Convergence is declared when the duality gap drops
//! below `tol * ||y||^2`, checked whenever the largest coordinate update of a
//! sweep is small relative to the largest coefficient.

use super::kfold::SimpleRng;
use super::{column_dot, dot};
use faer::Mat;
use serde::{Deserialize, Serialize};

/// Smallest regularisation strength used when the target is orthogonal to
/// every column.
const ALPHA_RESOLUTION: f64 = 1.0e-15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSelection {
    #[default]
    Cyclic,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordinateDescentSettings {
    pub max_iter: usize,
    pub tol: f64,
    pub selection: CoordinateSelection,
}

impl Default for CoordinateDescentSettings {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1.0e-4,
            selection: CoordinateSelection::Cyclic,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LassoFit {
    pub alpha: f64,
    pub coefficients: Vec<f64>,
    pub iterations: usize,
    pub dual_gap: f64,
    pub tolerance: f64,
    pub converged: bool,
}

impl LassoFit {
    pub fn into_converged(self) -> Result<Self, LassoError> {
        if self.converged {
            Ok(self)
        } else {
            Err(LassoError::NotConverged {
                alpha: self.alpha,
                iterations: self.iterations,
                dual_gap: self.dual_gap,
                tolerance: self.tolerance,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LassoError {
    #[error("lasso requires a non-empty design matrix, got {rows}x{cols}")]
    EmptyDesign { rows: usize, cols: usize },
    #[error("design matrix has {rows} rows but the target has {target} values")]
    ShapeMismatch { rows: usize, target: usize },
    #[error("warm start has {actual} coefficients, expected {expected}")]
    WarmStartMismatch { expected: usize, actual: usize },
    #[error("regularisation strength must be finite and >= 0, got {value}")]
    InvalidAlpha { value: f64 },
    #[error("lasso input must be finite ({location})")]
    NonFiniteInput { location: &'static str },
    #[error(
        "coordinate descent did not converge at alpha={alpha} after {iterations} iterations (duality gap {dual_gap:.3e}, tolerance {tolerance:.3e})"
    )]
    NotConverged {
        alpha: f64,
        iterations: usize,
        dual_gap: f64,
        tolerance: f64,
    },
}

pub fn fit_positive_lasso(
    design: &Mat<f64>,
    target: &[f64],
    alpha: f64,
    settings: &CoordinateDescentSettings,
    warm_start: Option<&[f64]>,
    rng: Option<&mut SimpleRng>,
) -> Result<LassoFit, LassoError> {
    validate_problem(design, target)?;
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(LassoError::InvalidAlpha { value: alpha });
    }

    let rows = design.nrows();
    let cols = design.ncols();
    let mut coefficients = match warm_start {
        Some(start) if start.len() != cols => {
            return Err(LassoError::WarmStartMismatch {
                expected: cols,
                actual: start.len(),
            });
        }
        Some(start) => start.iter().map(|value| value.max(0.0)).collect(),
        None => vec![0.0; cols],
    };

    let mut fallback_rng = SimpleRng::new(0);
    let rng = match rng {
        Some(rng) => rng,
        None => &mut fallback_rng,
    };

    let column_norms: Vec<f64> = (0..cols)
        .map(|col| (0..rows).map(|row| design[(row, col)].powi(2)).sum())
        .collect();
    let mut residual = target.to_vec();
    for (col, &weight) in coefficients.iter().enumerate() {
        if weight != 0.0 {
            axpy_column(design, col, -weight, &mut residual);
        }
    }

    let tolerance = settings.tol * dot(target, target);
    let scaled_alpha = alpha * rows as f64;
    let mut dual_gap = f64::INFINITY;

    for iteration in 0..settings.max_iter {
        let mut w_max: f64 = 0.0;
        let mut d_w_max: f64 = 0.0;

        for step in 0..cols {
            let col = match settings.selection {
                CoordinateSelection::Cyclic => step,
                CoordinateSelection::Random => rng.next_index(cols),
            };
            if column_norms[col] == 0.0 {
                continue;
            }

            let previous = coefficients[col];
            if previous != 0.0 {
                axpy_column(design, col, previous, &mut residual);
            }

            let correlation = column_dot(design, col, &residual);
            let updated = (correlation - scaled_alpha).max(0.0) / column_norms[col];
            coefficients[col] = updated;
            if updated != 0.0 {
                axpy_column(design, col, -updated, &mut residual);
            }

            d_w_max = d_w_max.max((updated - previous).abs());
            w_max = w_max.max(updated.abs());
        }

        let last_iteration = iteration + 1 == settings.max_iter;
        if w_max == 0.0 || d_w_max / w_max < settings.tol || last_iteration {
            dual_gap = duality_gap(design, target, &residual, &coefficients, scaled_alpha);
            if dual_gap <= tolerance {
                return Ok(LassoFit {
                    alpha,
                    coefficients,
                    iterations: iteration + 1,
                    dual_gap,
                    tolerance,
                    converged: true,
                });
            }
        }
    }

    Ok(LassoFit {
        alpha,
        coefficients,
        iterations: settings.max_iter,
        dual_gap,
        tolerance,
        converged: false,
    })
}

/// Fits every strength of `alphas` in order, warm-starting each fit from the
/// previous solution.
pub fn positive_lasso_path(
    design: &Mat<f64>,
    target: &[f64],
    alphas: &[f64],
    settings: &CoordinateDescentSettings,
    mut rng: Option<&mut SimpleRng>,
) -> Result<Vec<LassoFit>, LassoError> {
    let mut fits: Vec<LassoFit> = Vec::with_capacity(alphas.len());
    for &alpha in alphas {
        let warm_start = fits.last().map(|fit| fit.coefficients.as_slice());
        let fit = fit_positive_lasso(
            design,
            target,
            alpha,
            settings,
            warm_start,
            rng.as_deref_mut(),
        )?;
        fits.push(fit);
    }
    Ok(fits)
}

/// Descending log-spaced strengths from `alpha_max = max_j |X_j . y| / n`
/// down to `eps * alpha_max`.
pub fn alpha_grid(design: &Mat<f64>, target: &[f64], count: usize, eps: f64) -> Vec<f64> {
    let rows = design.nrows().max(1) as f64;
    let alpha_max = (0..design.ncols())
        .map(|col| column_dot(design, col, target).abs())
        .fold(0.0, f64::max)
        / rows;

    if count == 0 {
        return Vec::new();
    }
    if alpha_max <= ALPHA_RESOLUTION {
        return vec![ALPHA_RESOLUTION; count];
    }
    if count == 1 {
        return vec![alpha_max];
    }

    let upper = alpha_max.log10();
    let lower = (alpha_max * eps).log10();
    let step = (upper - lower) / (count - 1) as f64;
    (0..count)
        .map(|index| 10f64.powf(upper - step * index as f64))
        .collect()
}

fn validate_problem(design: &Mat<f64>, target: &[f64]) -> Result<(), LassoError> {
    let rows = design.nrows();
    let cols = design.ncols();
    if rows == 0 || cols == 0 {
        return Err(LassoError::EmptyDesign { rows, cols });
    }
    if target.len() != rows {
        return Err(LassoError::ShapeMismatch {
            rows,
            target: target.len(),
        });
    }
    if target.iter().any(|value| !value.is_finite()) {
        return Err(LassoError::NonFiniteInput { location: "target" });
    }
    for col in 0..cols {
        for row in 0..rows {
            if !design[(row, col)].is_finite() {
                return Err(LassoError::NonFiniteInput { location: "design" });
            }
        }
    }
    Ok(())
}

fn axpy_column(design: &Mat<f64>, col: usize, scale: f64, output: &mut [f64]) {
    for (row, value) in output.iter_mut().enumerate() {
        *value += scale * design[(row, col)];
    }
}

fn duality_gap(
    design: &Mat<f64>,
    target: &[f64],
    residual: &[f64],
    coefficients: &[f64],
    scaled_alpha: f64,
) -> f64 {
    let residual_norm2 = dot(residual, residual);
    let dual_norm = (0..design.ncols())
        .map(|col| column_dot(design, col, residual))
        .fold(f64::NEG_INFINITY, f64::max);
    let l1_norm: f64 = coefficients.iter().map(|value| value.abs()).sum();

    let (constant, gap) = if dual_norm > scaled_alpha {
        let constant = scaled_alpha / dual_norm;
        let dual_norm2 = residual_norm2 * constant * constant;
        (constant, 0.5 * (residual_norm2 + dual_norm2))
    } else {
        (1.0, residual_norm2)
    };

    gap + scaled_alpha * l1_norm - constant * dot(residual, target)
}
