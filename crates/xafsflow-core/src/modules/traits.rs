use crate::domain::XafsResult;
use faer::Mat;

/// Linear regression model used by the decomposition engine.
///
/// `design` has one row per grid point and one column per reference
/// spectrum; `target` is one unknown spectrum on the same grid.
pub trait LinearModel {
    fn fit(&mut self, design: &Mat<f64>, target: &[f64]) -> XafsResult<()>;

    fn predict(&self, design: &Mat<f64>) -> XafsResult<Vec<f64>>;

    /// Coefficients of the most recent fit, one per design column.
    fn coefficients(&self) -> Option<&[f64]>;

    fn set_random_seed(&mut self, _seed: u64) {}
}

impl<M> LinearModel for &mut M
where
    M: LinearModel + ?Sized,
{
    fn fit(&mut self, design: &Mat<f64>, target: &[f64]) -> XafsResult<()> {
        (**self).fit(design, target)
    }

    fn predict(&self, design: &Mat<f64>) -> XafsResult<Vec<f64>> {
        (**self).predict(design)
    }

    fn coefficients(&self) -> Option<&[f64]> {
        (**self).coefficients()
    }

    fn set_random_seed(&mut self, seed: u64) {
        (**self).set_random_seed(seed)
    }
}
