use crate::domain::{XafsError, XafsResult};
use crate::numerics::stable_sum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How reference spectra are grouped into classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ClassAssignment {
    /// Reference label -> class name.
    Explicit { classes: BTreeMap<String, String> },
    /// Class is the reference label up to the first separator
    /// (`goethite.2` -> `goethite`).
    LabelPrefix { separator: String },
}

impl Default for ClassAssignment {
    fn default() -> Self {
        Self::LabelPrefix {
            separator: ".".to_string(),
        }
    }
}

impl ClassAssignment {
    pub fn class_of(&self, reference: &str) -> XafsResult<String> {
        match self {
            Self::Explicit { classes } => classes.get(reference).cloned().ok_or_else(|| {
                XafsError::input_validation(
                    "INPUT.DECOMPOSE_CLASSES",
                    format!("reference '{}' has no class assignment", reference),
                )
            }),
            Self::LabelPrefix { separator } if separator.is_empty() => Ok(reference.to_string()),
            Self::LabelPrefix { separator } => Ok(reference
                .split(separator.as_str())
                .next()
                .unwrap_or(reference)
                .to_string()),
        }
    }
}

/// Fitted weights, one row per unknown sample and one column per reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoefficientTable {
    pub samples: Vec<String>,
    pub references: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CoefficientTable {
    pub fn row(&self, sample: &str) -> Option<&[f64]> {
        self.samples
            .iter()
            .position(|candidate| candidate == sample)
            .map(|index| self.values[index].as_slice())
    }
}

/// Per-sample class fractions. Each row sums to one unless the sample's
/// coefficients sum to zero, in which case it is all `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMatrix {
    pub samples: Vec<String>,
    pub classes: Vec<String>,
    pub fractions: Vec<Vec<f64>>,
}

impl ClassMatrix {
    pub fn row(&self, sample: &str) -> Option<&[f64]> {
        self.samples
            .iter()
            .position(|candidate| candidate == sample)
            .map(|index| self.fractions[index].as_slice())
    }
}

/// Normalises each sample's coefficients to sum to one and sums them within
/// each reference class. Classes are listed in order of first reference.
pub fn class_matrix(
    coefficients: &CoefficientTable,
    assignment: &ClassAssignment,
) -> XafsResult<ClassMatrix> {
    let mut classes: Vec<String> = Vec::new();
    let mut reference_class = Vec::with_capacity(coefficients.references.len());
    for reference in &coefficients.references {
        let class = assignment.class_of(reference)?;
        let index = match classes.iter().position(|candidate| *candidate == class) {
            Some(index) => index,
            None => {
                classes.push(class);
                classes.len() - 1
            }
        };
        reference_class.push(index);
    }

    let fractions = coefficients
        .samples
        .iter()
        .zip(&coefficients.values)
        .map(|(sample, weights)| {
            let total = stable_sum(weights);
            if total == 0.0 || !total.is_finite() {
                tracing::warn!(
                    sample = sample.as_str(),
                    total,
                    "coefficients do not sum to a positive value; class fractions are undefined"
                );
                return vec![f64::NAN; classes.len()];
            }

            let mut row = vec![0.0; classes.len()];
            for (weight, &class) in weights.iter().zip(&reference_class) {
                row[class] += weight / total;
            }
            row
        })
        .collect();

    Ok(ClassMatrix {
        samples: coefficients.samples.clone(),
        classes,
        fractions,
    })
}

#[cfg(test)]
mod tests {
    use super::{ClassAssignment, CoefficientTable, class_matrix};
    use std::collections::BTreeMap;

    fn table(values: Vec<Vec<f64>>) -> CoefficientTable {
        CoefficientTable {
            samples: (0..values.len()).map(|index| format!("unknown.{index}")).collect(),
            references: ["hematite.1", "goethite.1", "hematite.2", "goethite.2"]
                .map(str::to_string)
                .to_vec(),
            values,
        }
    }

    #[test]
    fn label_prefix_classes_aggregate_normalised_weights() {
        let matrix = class_matrix(
            &table(vec![vec![0.1, 0.2, 0.3, 0.4]]),
            &ClassAssignment::default(),
        )
        .expect("matrix");

        assert_eq!(matrix.classes, vec!["hematite", "goethite"]);
        let row = matrix.row("unknown.0").expect("row");
        assert!((row[0] - 0.4).abs() < 1.0e-12);
        assert!((row[1] - 0.6).abs() < 1.0e-12);
    }

    #[test]
    fn explicit_assignment_requires_every_reference() {
        let mut classes = BTreeMap::new();
        classes.insert("hematite.1".to_string(), "oxide".to_string());
        let error = class_matrix(
            &table(vec![vec![1.0, 0.0, 0.0, 0.0]]),
            &ClassAssignment::Explicit { classes },
        )
        .expect_err("unassigned reference");
        assert_eq!(error.placeholder(), "INPUT.DECOMPOSE_CLASSES");
    }

    #[test]
    fn zero_coefficients_give_undefined_fractions() {
        let matrix = class_matrix(&table(vec![vec![0.0; 4]]), &ClassAssignment::default())
            .expect("matrix");
        assert!(matrix.fractions[0].iter().all(|value| value.is_nan()));
    }

    #[test]
    fn assignment_deserialises_from_tagged_json() {
        let assignment: ClassAssignment =
            serde_json::from_str(r#"{"kind": "labelPrefix", "separator": "_"}"#).expect("json");
        assert_eq!(assignment.class_of("ferrihydrite_2").expect("class"), "ferrihydrite");
    }
}
