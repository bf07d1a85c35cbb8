use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Piecewise linear in the numeric x value.
    #[default]
    Index,
    /// Piecewise linear in ordinal position, ignoring x spacing.
    Linear,
    Nearest,
    /// Zero-order hold of the last known point at or before x.
    Previous,
}

impl InterpolationMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Linear => "linear",
            Self::Nearest => "nearest",
            Self::Previous => "previous",
        }
    }

    /// Whether the kernel runs over row ordinals instead of x values.
    pub const fn uses_ordinal_positions(self) -> bool {
        matches!(self, Self::Linear)
    }
}

impl Display for InterpolationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for InterpolationMethod {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "index" | "values" => Ok(Self::Index),
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            "previous" | "pad" | "ffill" => Ok(Self::Previous),
            other => Err(format!(
                "unknown interpolation method '{other}' (expected index, linear, nearest, previous)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    #[error("interpolation input length mismatch: positions={positions}, values={values}")]
    LengthMismatch { positions: usize, values: usize },
    #[error("interpolation position must be finite at index {index}, got {value}")]
    NonFinitePosition { index: usize, value: f64 },
    #[error(
        "interpolation positions must be strictly increasing, index {index} has {current} after {previous}"
    )]
    NonIncreasingPositions {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// Evaluates the series `(positions, values)` at `queries`.
///
/// `NaN` entries of `values` are treated as missing and skipped. Queries
/// outside the first/last non-missing position evaluate to `NaN`.
pub fn interpolate_series(
    method: InterpolationMethod,
    positions: &[f64],
    values: &[f64],
    queries: &[f64],
) -> Result<Vec<f64>, InterpolationError> {
    validate_positions(positions, values)?;

    let (known_positions, known_values): (Vec<f64>, Vec<f64>) = positions
        .iter()
        .zip(values)
        .filter(|(_, value)| !value.is_nan())
        .map(|(&position, &value)| (position, value))
        .unzip();

    Ok(queries
        .iter()
        .map(|&query| evaluate(method, &known_positions, &known_values, query))
        .collect())
}

fn evaluate(method: InterpolationMethod, positions: &[f64], values: &[f64], query: f64) -> f64 {
    let Some((&first, &last)) = positions.first().zip(positions.last()) else {
        return f64::NAN;
    };
    if query.is_nan() || query < first || query > last {
        return f64::NAN;
    }

    // `<` treats `-0.0` and `0.0` as equal, so `upper` stays in bounds and
    // is never zero past the exact-match branch.
    let upper = positions.partition_point(|&position| position < query);
    if positions[upper] == query {
        return values[upper];
    }

    let lower = upper - 1;
    let x0 = positions[lower];
    let x1 = positions[upper];
    let y0 = values[lower];
    let y1 = values[upper];
    match method {
        InterpolationMethod::Index | InterpolationMethod::Linear => {
            let fraction = (query - x0) / (x1 - x0);
            y0 + (y1 - y0) * fraction
        }
        InterpolationMethod::Nearest => {
            if query - x0 <= x1 - query {
                y0
            } else {
                y1
            }
        }
        InterpolationMethod::Previous => y0,
    }
}

fn validate_positions(positions: &[f64], values: &[f64]) -> Result<(), InterpolationError> {
    if positions.len() != values.len() {
        return Err(InterpolationError::LengthMismatch {
            positions: positions.len(),
            values: values.len(),
        });
    }

    for (index, value) in positions.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(InterpolationError::NonFinitePosition { index, value });
        }

        if index > 0 {
            let previous = positions[index - 1];
            if value <= previous {
                return Err(InterpolationError::NonIncreasingPositions {
                    index,
                    previous,
                    current: value,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{InterpolationError, InterpolationMethod, interpolate_series};

    #[test]
    fn index_method_is_linear_in_position() {
        let result = interpolate_series(
            InterpolationMethod::Index,
            &[0.0, 1.0, 4.0],
            &[0.0, 10.0, 40.0],
            &[0.5, 2.5, 4.0],
        )
        .expect("interpolate");
        assert_eq!(result, vec![5.0, 25.0, 40.0]);
    }

    #[test]
    fn missing_values_are_bridged_but_not_extrapolated() {
        let result = interpolate_series(
            InterpolationMethod::Index,
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[f64::NAN, 1.0, f64::NAN, 3.0, f64::NAN],
            &[0.0, 1.0, 2.0, 3.0, 4.0],
        )
        .expect("interpolate");
        assert!(result[0].is_nan());
        assert_eq!(result[1..4], [1.0, 2.0, 3.0]);
        assert!(result[4].is_nan());
    }

    #[test]
    fn nearest_and_previous_kernels_select_neighbours() {
        let positions = [0.0, 1.0, 2.0];
        let values = [10.0, 20.0, 30.0];
        let queries = [0.25, 0.5, 0.75, 2.0];

        let nearest =
            interpolate_series(InterpolationMethod::Nearest, &positions, &values, &queries)
                .expect("nearest");
        assert_eq!(nearest, vec![10.0, 10.0, 20.0, 30.0]);

        let previous =
            interpolate_series(InterpolationMethod::Previous, &positions, &values, &queries)
                .expect("previous");
        assert_eq!(previous, vec![10.0, 10.0, 10.0, 30.0]);
    }

    #[test]
    fn signed_zero_positions_match_zero_queries() {
        let result = interpolate_series(
            InterpolationMethod::Index,
            &[-1.0, -0.0],
            &[1.0, 2.0],
            &[0.0, -0.5, -0.0],
        )
        .expect("interpolate");
        assert_eq!(result, vec![2.0, 1.5, 2.0]);

        let previous = interpolate_series(
            InterpolationMethod::Previous,
            &[-0.0, 1.0],
            &[5.0, 6.0],
            &[0.0],
        )
        .expect("previous");
        assert_eq!(previous, vec![5.0]);
    }

    #[test]
    fn all_missing_series_yields_missing_values() {
        let result = interpolate_series(
            InterpolationMethod::Index,
            &[0.0, 1.0],
            &[f64::NAN, f64::NAN],
            &[0.5],
        )
        .expect("interpolate");
        assert!(result[0].is_nan());
    }

    #[test]
    fn rejects_unsorted_positions_and_shape_mismatch() {
        let error = interpolate_series(
            InterpolationMethod::Index,
            &[0.0, 2.0, 1.0],
            &[0.0, 2.0, 1.0],
            &[0.5],
        )
        .expect_err("unsorted positions should fail");
        assert_eq!(
            error,
            InterpolationError::NonIncreasingPositions {
                index: 2,
                previous: 2.0,
                current: 1.0
            }
        );

        let error = interpolate_series(InterpolationMethod::Index, &[0.0, 1.0], &[0.0], &[0.5])
            .expect_err("length mismatch should fail");
        assert_eq!(
            error,
            InterpolationError::LengthMismatch {
                positions: 2,
                values: 1
            }
        );
    }

    #[test]
    fn method_names_parse_with_aliases() {
        assert_eq!(
            "index".parse::<InterpolationMethod>(),
            Ok(InterpolationMethod::Index)
        );
        assert_eq!(
            "PAD".parse::<InterpolationMethod>(),
            Ok(InterpolationMethod::Previous)
        );
        assert!("cubic".parse::<InterpolationMethod>().is_err());
        assert!(InterpolationMethod::Linear.uses_ordinal_positions());
        assert_eq!(InterpolationMethod::Nearest.to_string(), "nearest");
    }
}
