use crate::domain::{XafsError, XafsResult};
use crate::modules::LinearModel;
use crate::numerics::{
    CoordinateDescentSettings, KFold, LassoError, LassoFit, SimpleRng, alpha_grid,
    fit_positive_lasso, matvec, positive_lasso_path, select_rows, stable_sum,
};
use faer::Mat;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOLDS: usize = 5;
pub const DEFAULT_ALPHA_COUNT: usize = 100;
pub const DEFAULT_ALPHA_EPS: f64 = 1.0e-3;

/// Non-negative, intercept-free lasso at a fixed regularisation strength.
#[derive(Debug, Clone, PartialEq)]
pub struct PositiveLasso {
    alpha: f64,
    settings: CoordinateDescentSettings,
    seed: Option<u64>,
    fit: Option<LassoFit>,
}

impl PositiveLasso {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            settings: CoordinateDescentSettings::default(),
            seed: None,
            fit: None,
        }
    }

    pub fn with_settings(mut self, settings: CoordinateDescentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn last_fit(&self) -> Option<&LassoFit> {
        self.fit.as_ref()
    }
}

impl LinearModel for PositiveLasso {
    fn fit(&mut self, design: &Mat<f64>, target: &[f64]) -> XafsResult<()> {
        let mut rng = SimpleRng::new(self.seed.unwrap_or(0));
        let fit = fit_positive_lasso(
            design,
            target,
            self.alpha,
            &self.settings,
            None,
            Some(&mut rng),
        )
        .and_then(LassoFit::into_converged)
        .map_err(lasso_error)?;
        self.fit = Some(fit);
        Ok(())
    }

    fn predict(&self, design: &Mat<f64>) -> XafsResult<Vec<f64>> {
        predict_with(design, self.coefficients())
    }

    fn coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|fit| fit.coefficients.as_slice())
    }

    fn set_random_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LassoCvSettings {
    pub folds: usize,
    pub alpha_count: usize,
    /// Ratio of the smallest to the largest strength on the automatic grid.
    pub alpha_eps: f64,
    /// Explicit strengths to search instead of the automatic grid.
    pub alphas: Option<Vec<f64>>,
    pub solver: CoordinateDescentSettings,
}

impl Default for LassoCvSettings {
    fn default() -> Self {
        Self {
            folds: DEFAULT_FOLDS,
            alpha_count: DEFAULT_ALPHA_COUNT,
            alpha_eps: DEFAULT_ALPHA_EPS,
            alphas: None,
            solver: CoordinateDescentSettings::default(),
        }
    }
}

/// Cross-validation outcome of the most recent [`PositiveLassoCv`] fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossValidationPath {
    pub alphas: Vec<f64>,
    /// Held-out mean squared error, `[alpha][fold]`.
    pub mse_path: Vec<Vec<f64>>,
    pub mean_mse: Vec<f64>,
    pub selected_alpha: f64,
}

/// Non-negative, intercept-free lasso whose strength is chosen by k-fold
/// cross-validation over a log-spaced grid, then refit on every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositiveLassoCv {
    settings: LassoCvSettings,
    seed: Option<u64>,
    path: Option<CrossValidationPath>,
    fit: Option<LassoFit>,
}

impl PositiveLassoCv {
    pub fn new(settings: LassoCvSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &LassoCvSettings {
        &self.settings
    }

    pub fn selected_alpha(&self) -> Option<f64> {
        self.path.as_ref().map(|path| path.selected_alpha)
    }

    pub fn cross_validation_path(&self) -> Option<&CrossValidationPath> {
        self.path.as_ref()
    }

    pub fn last_fit(&self) -> Option<&LassoFit> {
        self.fit.as_ref()
    }

    fn cross_validate(
        &self,
        design: &Mat<f64>,
        target: &[f64],
        alphas: &[f64],
        rng: &mut SimpleRng,
    ) -> XafsResult<Vec<Vec<f64>>> {
        let splits = KFold::new(self.settings.folds)
            .with_seed(self.seed)
            .split(design.nrows())
            .map_err(|source| {
                XafsError::input_validation("INPUT.LASSO_CV", source.to_string())
            })?;

        let mut mse_path = vec![Vec::with_capacity(splits.len()); alphas.len()];
        for (fold, split) in splits.iter().enumerate() {
            let train_design = select_rows(design, &split.train);
            let train_target: Vec<f64> = split.train.iter().map(|&row| target[row]).collect();
            let test_design = select_rows(design, &split.test);

            let fits = positive_lasso_path(
                &train_design,
                &train_target,
                alphas,
                &self.settings.solver,
                Some(&mut *rng),
            )
            .map_err(lasso_error)?;

            for (index, fit) in fits.iter().enumerate() {
                if !fit.converged {
                    tracing::warn!(
                        fold,
                        alpha = fit.alpha,
                        dual_gap = fit.dual_gap,
                        tolerance = fit.tolerance,
                        "coordinate descent did not converge on cross-validation path"
                    );
                }
                let predicted = matvec(&test_design, &fit.coefficients);
                let squared: Vec<f64> = split
                    .test
                    .iter()
                    .zip(&predicted)
                    .map(|(&row, value)| (target[row] - value).powi(2))
                    .collect();
                mse_path[index].push(stable_sum(&squared) / squared.len() as f64);
            }
        }

        Ok(mse_path)
    }
}

impl LinearModel for PositiveLassoCv {
    fn fit(&mut self, design: &Mat<f64>, target: &[f64]) -> XafsResult<()> {
        let alphas = match &self.settings.alphas {
            Some(alphas) if alphas.is_empty() => {
                return Err(XafsError::input_validation(
                    "INPUT.LASSO_CV",
                    "explicit regularisation grid must not be empty",
                ));
            }
            Some(alphas) => alphas.clone(),
            None => alpha_grid(
                design,
                target,
                self.settings.alpha_count,
                self.settings.alpha_eps,
            ),
        };
        if alphas.is_empty() {
            return Err(XafsError::input_validation(
                "INPUT.LASSO_CV",
                "regularisation grid needs at least one strength",
            ));
        }

        let mut rng = SimpleRng::new(self.seed.unwrap_or(0));
        let mse_path = self.cross_validate(design, target, &alphas, &mut rng)?;
        let mean_mse: Vec<f64> = mse_path
            .iter()
            .map(|folds| stable_sum(folds) / folds.len() as f64)
            .collect();

        let mut best = 0;
        for (index, mse) in mean_mse.iter().enumerate() {
            if *mse < mean_mse[best] {
                best = index;
            }
        }
        let selected_alpha = alphas[best];
        tracing::debug!(
            selected_alpha,
            mean_mse = mean_mse[best],
            candidates = alphas.len(),
            "selected regularisation strength"
        );

        let fit = fit_positive_lasso(
            design,
            target,
            selected_alpha,
            &self.settings.solver,
            None,
            Some(&mut rng),
        )
        .and_then(LassoFit::into_converged)
        .map_err(lasso_error)?;

        self.path = Some(CrossValidationPath {
            alphas,
            mse_path,
            mean_mse,
            selected_alpha,
        });
        self.fit = Some(fit);
        Ok(())
    }

    fn predict(&self, design: &Mat<f64>) -> XafsResult<Vec<f64>> {
        predict_with(design, self.coefficients())
    }

    fn coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|fit| fit.coefficients.as_slice())
    }

    fn set_random_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }
}

/// Model used when the caller does not supply one. Built fresh per call.
pub fn default_model() -> PositiveLassoCv {
    PositiveLassoCv::default()
}

fn predict_with(design: &Mat<f64>, coefficients: Option<&[f64]>) -> XafsResult<Vec<f64>> {
    let coefficients = coefficients.ok_or_else(|| {
        XafsError::computation("RUN.MODEL_NOT_FITTED", "model must be fitted before predicting")
    })?;
    if design.ncols() != coefficients.len() {
        return Err(XafsError::input_validation(
            "INPUT.DECOMPOSE_SHAPE",
            format!(
                "design has {} columns but the model has {} coefficients",
                design.ncols(),
                coefficients.len()
            ),
        ));
    }
    Ok(matvec(design, coefficients))
}

fn lasso_error(error: LassoError) -> XafsError {
    match error {
        LassoError::NotConverged { .. } => {
            XafsError::computation("RUN.LASSO_CONVERGENCE", error.to_string())
        }
        other => XafsError::input_validation("INPUT.LASSO", other.to_string()),
    }
}
