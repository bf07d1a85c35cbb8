//! Linear-combination decomposition of unknown spectra into references.
//!
//! Each unknown column of `y` is fitted independently against the reference
//! columns of `x` with one model instance, which is returned after fitting the
//! last unknown.

mod classes;
mod model;

pub use classes::{ClassAssignment, ClassMatrix, CoefficientTable, class_matrix};
pub use model::{
    CrossValidationPath, DEFAULT_ALPHA_COUNT, DEFAULT_ALPHA_EPS, DEFAULT_FOLDS, LassoCvSettings,
    PositiveLasso, PositiveLassoCv, default_model,
};

use crate::domain::{XafsError, XafsResult};
use crate::modules::LinearModel;
use crate::modules::aligned::AlignedArray;
use faer::Mat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecompositionOptions {
    pub random_seed: Option<u64>,
    #[serde(alias = "includeCoefs")]
    pub include_coefficients: bool,
    #[serde(alias = "includeMatrix")]
    pub include_class_matrix: bool,
    pub classes: ClassAssignment,
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        Self {
            random_seed: None,
            include_coefficients: true,
            include_class_matrix: false,
            classes: ClassAssignment::default(),
        }
    }
}

impl DecompositionOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_class_matrix(mut self, classes: ClassAssignment) -> Self {
        self.include_class_matrix = true;
        self.classes = classes;
        self
    }
}

/// Everything one decomposition run produces, serialisable as one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecompositionResult {
    /// Model prediction for every unknown, shaped like `y`.
    pub prediction: AlignedArray,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<CoefficientTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_matrix: Option<ClassMatrix>,
}

pub fn fit_decomposition<M: LinearModel>(
    references: &AlignedArray,
    unknowns: &AlignedArray,
    mut model: M,
    options: &DecompositionOptions,
) -> XafsResult<(DecompositionResult, M)> {
    validate_inputs(references, unknowns)?;
    if let Some(seed) = options.random_seed {
        model.set_random_seed(seed);
    }

    let design = references.values();
    let mut predictions: Vec<Vec<f64>> = Vec::with_capacity(unknowns.label_count());
    let mut weights: Vec<Vec<f64>> = Vec::with_capacity(unknowns.label_count());
    for (index, sample) in unknowns.labels().iter().enumerate() {
        let target = unknowns.column(index);
        model.fit(design, &target)?;
        let coefficients = model.coefficients().ok_or_else(|| {
            XafsError::internal(
                "SYS.MODEL_COEFFICIENTS",
                format!("model reported no coefficients after fitting '{}'", sample),
            )
        })?;
        if coefficients.len() != references.label_count() {
            return Err(XafsError::internal(
                "SYS.MODEL_COEFFICIENTS",
                format!(
                    "model returned {} coefficients for {} references",
                    coefficients.len(),
                    references.label_count()
                ),
            ));
        }
        weights.push(coefficients.to_vec());
        predictions.push(model.predict(design)?);
        tracing::debug!(sample = sample.as_str(), "decomposed unknown spectrum");
    }

    let prediction = unknowns.with_values(Mat::from_fn(
        unknowns.grid_len(),
        predictions.len(),
        |row, col| predictions[col][row],
    ))?;
    let coefficient_table = CoefficientTable {
        samples: unknowns.labels().to_vec(),
        references: references.labels().to_vec(),
        values: weights,
    };
    let class_matrix = if options.include_class_matrix {
        Some(class_matrix(&coefficient_table, &options.classes)?)
    } else {
        None
    };

    Ok((
        DecompositionResult {
            prediction,
            coefficients: options.include_coefficients.then_some(coefficient_table),
            class_matrix,
        },
        model,
    ))
}

/// [`fit_decomposition`] with a freshly built [`default_model`].
pub fn fit_default_decomposition(
    references: &AlignedArray,
    unknowns: &AlignedArray,
    options: &DecompositionOptions,
) -> XafsResult<(DecompositionResult, PositiveLassoCv)> {
    fit_decomposition(references, unknowns, default_model(), options)
}

fn validate_inputs(references: &AlignedArray, unknowns: &AlignedArray) -> XafsResult<()> {
    if references.grid_len() == 0 {
        return Err(XafsError::input_validation(
            "INPUT.DECOMPOSE_GRID",
            "decomposition needs a non-empty grid",
        ));
    }
    if references.grid() != unknowns.grid() {
        return Err(XafsError::input_validation(
            "INPUT.DECOMPOSE_GRID",
            format!(
                "reference grid ({} points) and unknown grid ({} points) differ",
                references.grid_len(),
                unknowns.grid_len()
            ),
        ));
    }
    if references.label_count() == 0 {
        return Err(XafsError::input_validation(
            "INPUT.DECOMPOSE_SHAPE",
            "decomposition needs at least one reference spectrum",
        ));
    }
    for (name, array) in [("reference", references), ("unknown", unknowns)] {
        if !array.all_finite() {
            return Err(XafsError::input_validation(
                "INPUT.DECOMPOSE_VALUES",
                format!(
                    "{} spectra contain missing or non-finite values; bound the grid to the shared domain first",
                    name
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        ClassAssignment, DecompositionOptions, PositiveLasso, fit_decomposition,
        fit_default_decomposition,
    };
    use crate::domain::{ENERGY_COLUMN, SAMPLE_NAME_COLUMN, XafsResult};
    use crate::modules::LinearModel;
    use crate::modules::aligned::AlignedArray;
    use crate::numerics::matvec;
    use faer::Mat;

    fn peak(center: f64, x: f64) -> f64 {
        (-((x - center) / 3.0).powi(2)).exp()
    }

    fn references(centers: &[f64], labels: &[&str]) -> AlignedArray {
        AlignedArray::new(
            ENERGY_COLUMN,
            (0..50).map(|row| row as f64).collect(),
            SAMPLE_NAME_COLUMN,
            labels.iter().map(|label| label.to_string()).collect(),
            Mat::from_fn(50, centers.len(), |row, col| peak(centers[col], row as f64)),
        )
        .expect("references")
    }

    fn unknowns(design: &AlignedArray, mixtures: &[Vec<f64>]) -> AlignedArray {
        let columns: Vec<Vec<f64>> = mixtures
            .iter()
            .map(|weights| matvec(design.values(), weights))
            .collect();
        AlignedArray::new(
            ENERGY_COLUMN,
            design.grid().to_vec(),
            SAMPLE_NAME_COLUMN,
            (0..mixtures.len()).map(|index| format!("unknown.{index}")).collect(),
            Mat::from_fn(50, columns.len(), |row, col| columns[col][row]),
        )
        .expect("unknowns")
    }

    #[test]
    fn three_references_decompose_one_unknown() {
        let x = references(&[10.0, 25.0, 40.0], &["a.1", "b.1", "c.1"]);
        let y = unknowns(&x, &[vec![0.2, 0.5, 0.3]]);
        let (result, model) =
            fit_default_decomposition(&x, &y, &DecompositionOptions::default().with_seed(1))
                .expect("decompose");

        let coefficients = result.coefficients.expect("coefficients");
        let weights = coefficients.row("unknown.0").expect("row");
        assert_eq!(weights.len(), 3);
        assert!(weights.iter().all(|value| *value >= 0.0));
        assert!(weights.iter().sum::<f64>().is_finite());
        assert!((weights[1] - 0.5).abs() < 0.05);

        let expected = matvec(x.values(), weights);
        let predicted = result.prediction.column(0);
        for (lhs, rhs) in predicted.iter().zip(&expected) {
            assert!((lhs - rhs).abs() < 1.0e-12);
        }
        assert_eq!(result.prediction.labels(), y.labels());
        assert!(model.selected_alpha().is_some());
        assert!(result.class_matrix.is_none());
    }

    #[test]
    fn class_matrix_sums_to_one_per_sample() {
        let x = references(
            &[6.0, 18.0, 30.0, 42.0],
            &["hematite.1", "hematite.2", "goethite.1", "goethite.2"],
        );
        let y = unknowns(&x, &[vec![0.3, 0.1, 0.4, 0.2], vec![0.0, 0.5, 0.5, 0.0]]);
        let options = DecompositionOptions::default().with_class_matrix(ClassAssignment::default());
        let (result, _) = fit_default_decomposition(&x, &y, &options).expect("decompose");

        let matrix = result.class_matrix.expect("class matrix");
        assert_eq!(matrix.classes, vec!["hematite", "goethite"]);
        for row in &matrix.fractions {
            assert_eq!(row.len(), 2);
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1.0e-9);
        }
        let first = matrix.row("unknown.0").expect("row");
        assert!((first[0] - 0.4).abs() < 0.05);
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let x = references(&[10.0, 30.0], &["a", "b"]);
        let shifted = AlignedArray::new(
            ENERGY_COLUMN,
            (1..51).map(|row| row as f64).collect(),
            SAMPLE_NAME_COLUMN,
            vec!["u".to_string()],
            Mat::zeros(50, 1),
        )
        .expect("unknown");

        let error = fit_default_decomposition(&x, &shifted, &DecompositionOptions::default())
            .expect_err("grid mismatch");
        assert_eq!(error.placeholder(), "INPUT.DECOMPOSE_GRID");
    }

    #[test]
    fn missing_values_are_rejected() {
        let x = references(&[10.0, 30.0], &["a", "b"]);
        let y = AlignedArray::new(
            ENERGY_COLUMN,
            x.grid().to_vec(),
            SAMPLE_NAME_COLUMN,
            vec!["u".to_string()],
            Mat::from_fn(50, 1, |row, _| if row == 3 { f64::NAN } else { 0.0 }),
        )
        .expect("unknown");

        let error = fit_default_decomposition(&x, &y, &DecompositionOptions::default())
            .expect_err("nan");
        assert_eq!(error.placeholder(), "INPUT.DECOMPOSE_VALUES");
    }

    struct FixedModel {
        weights: Vec<f64>,
        seed: Option<u64>,
        fits: usize,
    }

    impl LinearModel for FixedModel {
        fn fit(&mut self, _design: &Mat<f64>, _target: &[f64]) -> XafsResult<()> {
            self.fits += 1;
            Ok(())
        }

        fn predict(&self, design: &Mat<f64>) -> XafsResult<Vec<f64>> {
            Ok(matvec(design, &self.weights))
        }

        fn coefficients(&self) -> Option<&[f64]> {
            Some(self.weights.as_slice())
        }

        fn set_random_seed(&mut self, seed: u64) {
            self.seed = Some(seed);
        }
    }

    #[test]
    fn caller_supplied_models_receive_seed_and_every_unknown() {
        let x = references(&[10.0, 30.0], &["a", "b"]);
        let y = unknowns(&x, &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]);
        let model = FixedModel {
            weights: vec![0.25, 0.75],
            seed: None,
            fits: 0,
        };
        let options = DecompositionOptions {
            include_coefficients: false,
            ..DecompositionOptions::default().with_seed(42)
        };

        let (result, model) = fit_decomposition(&x, &y, model, &options).expect("decompose");
        assert_eq!(model.seed, Some(42));
        assert_eq!(model.fits, 3);
        assert!(result.coefficients.is_none());
        assert_eq!(result.prediction.label_count(), 3);
    }

    #[test]
    fn fixed_strength_model_is_a_drop_in_replacement() {
        let x = references(&[10.0, 30.0], &["a", "b"]);
        let y = unknowns(&x, &[vec![0.6, 0.4]]);
        let (result, model) =
            fit_decomposition(&x, &y, PositiveLasso::new(1.0e-6), &DecompositionOptions::default())
                .expect("decompose");
        assert!(model.last_fit().is_some_and(|fit| fit.converged));

        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["coefficients"]["references"][1], "b");
        assert!(json.get("classMatrix").is_none());
    }
}
