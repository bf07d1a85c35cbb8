//! Grouped re-sampling of spectral columns onto requested x values.

use crate::domain::{ENERGY_COLUMN, XafsError, XafsResult};
use crate::modules::bound::BoundedDomain;
use crate::numerics::{InterpolationMethod, deterministic_argsort, interpolate_series, sorted_unique};
use crate::table::{Column, ColumnKind, Partition, SpectralTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterpolationOptions {
    pub x_column: String,
    pub group_keys: Vec<String>,
    pub method: InterpolationMethod,
    /// Clip the targets to each group's own observed x range.
    #[serde(alias = "maskMinmax")]
    pub clip_to_overlap: bool,
    /// Return the union of existing and target x values instead of only the
    /// targets.
    #[serde(alias = "retAll")]
    pub return_all_points: bool,
    pub sort_groups: bool,
    /// Columns to resample; every float column except x and the keys when
    /// unset.
    pub value_columns: Option<Vec<String>>,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            x_column: ENERGY_COLUMN.to_string(),
            group_keys: Vec::new(),
            method: InterpolationMethod::default(),
            clip_to_overlap: true,
            return_all_points: false,
            sort_groups: false,
            value_columns: None,
        }
    }
}

impl InterpolationOptions {
    pub fn new(x_column: impl Into<String>) -> Self {
        Self {
            x_column: x_column.into(),
            ..Self::default()
        }
    }

    pub fn grouped_by<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_method(mut self, method: InterpolationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_clip_to_overlap(mut self, clip: bool) -> Self {
        self.clip_to_overlap = clip;
        self
    }

    pub fn with_return_all_points(mut self, all_points: bool) -> Self {
        self.return_all_points = all_points;
        self
    }

    pub fn with_sorted_groups(mut self, sorted: bool) -> Self {
        self.sort_groups = sorted;
        self
    }

    pub fn with_value_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Re-samples every value column of every group onto `targets`.
///
/// The result holds the group key columns, then the x column, then the value
/// columns. Groups whose range does not reach any target contribute no rows.
pub fn interpolate_table(
    table: &SpectralTable,
    targets: &[f64],
    options: &InterpolationOptions,
) -> XafsResult<SpectralTable> {
    if let Some(index) = targets.iter().position(|value| value.is_nan()) {
        return Err(XafsError::input_validation(
            "INPUT.INTERPOLATE_TARGETS",
            format!("interpolation target {} is NaN", index),
        ));
    }

    let x_values = table.float_column(&options.x_column)?;
    let value_names = value_column_names(table, options)?;
    let mut partitions = table.partition(&options.group_keys)?;
    if options.sort_groups {
        partitions.sort_by(|lhs, rhs| lhs.key.cmp(&rhs.key));
    }
    tracing::debug!(
        groups = partitions.len(),
        targets = targets.len(),
        method = %options.method,
        "interpolating {} columns",
        value_names.len()
    );

    let mut slices = Vec::with_capacity(partitions.len());
    for partition in &partitions {
        slices.push(interpolate_partition(
            table,
            x_values,
            partition,
            targets,
            &value_names,
            options,
        )?);
    }

    if slices.is_empty() {
        return empty_result(table, &value_names, options);
    }
    SpectralTable::concat(slices)
}

fn value_column_names(
    table: &SpectralTable,
    options: &InterpolationOptions,
) -> XafsResult<Vec<String>> {
    if let Some(columns) = &options.value_columns {
        for name in columns {
            table.float_column(name)?;
        }
        return Ok(columns.clone());
    }

    Ok(table
        .named_columns()
        .filter(|(name, column)| {
            column.kind() == ColumnKind::Float
                && *name != options.x_column
                && !options.group_keys.iter().any(|key| key == name)
        })
        .map(|(name, _)| name.to_string())
        .collect())
}

fn interpolate_partition(
    table: &SpectralTable,
    x_values: &[f64],
    partition: &Partition,
    targets: &[f64],
    value_names: &[String],
    options: &InterpolationOptions,
) -> XafsResult<SpectralTable> {
    let rows = sorted_unique_rows(x_values, partition, &options.x_column);
    // Adding zero folds `-0.0` into `0.0` so x and targets compare alike.
    let known_x: Vec<f64> = rows.iter().map(|&row| x_values[row] + 0.0).collect();

    let targets: Vec<f64> = if options.clip_to_overlap {
        match BoundedDomain::observed(known_x.iter().copied()) {
            Some(domain) => domain.clip(targets),
            None => Vec::new(),
        }
    } else {
        targets.to_vec()
    };
    let targets: Vec<f64> = targets.into_iter().map(|value| value + 0.0).collect();

    let union = sorted_unique(&known_x.iter().chain(&targets).copied().collect::<Vec<_>>());
    let (known_positions, union_positions) = if options.method.uses_ordinal_positions() {
        let known: Vec<f64> = known_x
            .iter()
            .map(|value| union_index(&union, *value) as f64)
            .collect();
        let all: Vec<f64> = (0..union.len()).map(|index| index as f64).collect();
        (known, all)
    } else {
        (known_x.clone(), union.clone())
    };

    let output_indices: Vec<usize> = if options.return_all_points {
        (0..union.len()).collect()
    } else {
        targets.iter().map(|value| union_index(&union, *value)).collect()
    };

    let mut slice = SpectralTable::new();
    for (name, value) in options.group_keys.iter().zip(partition.key.values()) {
        slice = slice.with_column(name.clone(), Column::repeat_key(value, output_indices.len()))?;
    }
    slice = slice.with_column(
        options.x_column.clone(),
        Column::Float(output_indices.iter().map(|&index| union[index]).collect()),
    )?;

    for name in value_names {
        let column = table.float_column(name)?;
        let known_values: Vec<f64> = rows.iter().map(|&row| column[row]).collect();
        let resampled =
            interpolate_series(options.method, &known_positions, &known_values, &union_positions)
                .map_err(|source| {
                    XafsError::computation(
                        "RUN.INTERPOLATE",
                        format!(
                            "failed to interpolate '{}' for group {}: {}",
                            name, partition.key, source
                        ),
                    )
                })?;
        slice = slice.with_column(
            name.clone(),
            Column::Float(output_indices.iter().map(|&index| resampled[index]).collect()),
        )?;
    }

    Ok(slice)
}

/// Rows of `partition` with a finite x, ordered by x, keeping the first row
/// of every run of equal x values.
fn sorted_unique_rows(x_values: &[f64], partition: &Partition, x_column: &str) -> Vec<usize> {
    let finite: Vec<usize> = partition
        .rows
        .iter()
        .copied()
        .filter(|&row| x_values[row].is_finite())
        .collect();
    let keys: Vec<f64> = finite.iter().map(|&row| x_values[row]).collect();

    let mut rows: Vec<usize> = Vec::with_capacity(finite.len());
    for index in deterministic_argsort(&keys) {
        let row = finite[index];
        match rows.last() {
            Some(&last) if x_values[last] == x_values[row] => {}
            _ => rows.push(row),
        }
    }

    let dropped = finite.len() - rows.len();
    if dropped > 0 {
        tracing::warn!(
            group = %partition.key,
            dropped,
            "dropped duplicate {} values, keeping the first occurrence",
            x_column
        );
    }
    rows
}

fn union_index(union: &[f64], value: f64) -> usize {
    union.partition_point(|&point| point < value)
}

fn empty_result(
    table: &SpectralTable,
    value_names: &[String],
    options: &InterpolationOptions,
) -> XafsResult<SpectralTable> {
    let mut result = SpectralTable::new();
    for key in &options.group_keys {
        result = result.with_column(key.clone(), table.require_column(key)?.empty_like())?;
    }
    result = result.with_column(options.x_column.clone(), Column::Float(Vec::new()))?;
    for name in value_names {
        result = result.with_column(name.clone(), Column::Float(Vec::new()))?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{InterpolationOptions, interpolate_table};
    use crate::domain::{ENERGY_COLUMN, FLAT_COLUMN, SAMPLE_NAME_COLUMN, SAMPLE_NUMBER_COLUMN};
    use crate::modules::sample_id::{SplitOptions, split_sample_identifier};
    use crate::numerics::InterpolationMethod;
    use crate::table::{Column, ColumnKind, SpectralTable};

    fn single_spectrum(x: Vec<f64>, flat: Vec<f64>) -> SpectralTable {
        SpectralTable::from_columns([
            (ENERGY_COLUMN, Column::Float(x)),
            (FLAT_COLUMN, Column::Float(flat)),
        ])
        .expect("table")
    }

    fn two_samples() -> SpectralTable {
        SpectralTable::from_columns([
            (
                ENERGY_COLUMN,
                Column::Float(vec![0.0, 5.0, 10.0, 5.0, 10.0, 15.0]),
            ),
            (
                FLAT_COLUMN,
                Column::Float(vec![0.0, 0.5, 1.0, 2.0, 3.0, 4.0]),
            ),
            (
                SAMPLE_NAME_COLUMN,
                Column::Text(["A", "A", "A", "B", "B", "B"].map(str::to_string).to_vec()),
            ),
        ])
        .expect("table")
    }

    fn floats<'a>(table: &'a SpectralTable, name: &str) -> &'a [f64] {
        table.float_column(name).expect("float column")
    }

    #[test]
    fn interpolating_onto_own_index_is_identity() {
        let table = single_spectrum(vec![3.0, 0.0, 1.0, 2.0], vec![30.0, 0.0, 10.0, 20.0]);
        let options = InterpolationOptions::default()
            .with_clip_to_overlap(false)
            .with_return_all_points(true);

        let result = interpolate_table(&table, &[3.0, 0.0, 1.0, 2.0], &options).expect("interp");
        assert_eq!(floats(&result, ENERGY_COLUMN), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(floats(&result, FLAT_COLUMN), &[0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn reinterpolating_reduced_output_is_idempotent() {
        let table = single_spectrum(vec![0.0, 1.0, 2.0, 4.0], vec![0.0, 1.0, 4.0, 16.0]);
        let targets = [0.5, 1.5, 3.0];
        let options = InterpolationOptions::default();

        let once = interpolate_table(&table, &targets, &options).expect("first pass");
        let twice = interpolate_table(&once, &targets, &options).expect("second pass");
        assert_eq!(once, twice);
        assert_eq!(floats(&once, FLAT_COLUMN), &[0.5, 2.5, 10.0]);
    }

    #[test]
    fn grouped_interpolation_clips_each_group_to_its_range() {
        let options = InterpolationOptions::default().grouped_by([SAMPLE_NAME_COLUMN]);
        let result = interpolate_table(&two_samples(), &[0.0, 5.0, 7.5, 10.0, 15.0], &options)
            .expect("interp");

        assert_eq!(
            result.column_names().collect::<Vec<_>>(),
            vec![SAMPLE_NAME_COLUMN, ENERGY_COLUMN, FLAT_COLUMN]
        );
        assert_eq!(
            result.text_column(SAMPLE_NAME_COLUMN).expect("names"),
            ["A", "A", "A", "A", "B", "B", "B", "B"]
        );
        assert_eq!(
            floats(&result, ENERGY_COLUMN),
            &[0.0, 5.0, 7.5, 10.0, 5.0, 7.5, 10.0, 15.0]
        );
        assert_eq!(
            floats(&result, FLAT_COLUMN),
            &[0.0, 0.5, 0.75, 1.0, 2.0, 2.5, 3.0, 4.0]
        );
    }

    #[test]
    fn unclipped_targets_outside_range_stay_missing() {
        let options = InterpolationOptions::default().with_clip_to_overlap(false);
        let table = single_spectrum(vec![1.0, 2.0], vec![10.0, 20.0]);
        let result = interpolate_table(&table, &[0.0, 1.5, 3.0], &options).expect("interp");

        let flat = floats(&result, FLAT_COLUMN);
        assert!(flat[0].is_nan());
        assert_eq!(flat[1], 15.0);
        assert!(flat[2].is_nan());
    }

    #[test]
    fn reduced_output_follows_target_order_and_keeps_duplicates() {
        let table = single_spectrum(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]);
        let result = interpolate_table(&table, &[2.0, 0.5, 2.0], &InterpolationOptions::default())
            .expect("interp");
        assert_eq!(floats(&result, ENERGY_COLUMN), &[2.0, 0.5, 2.0]);
        assert_eq!(floats(&result, FLAT_COLUMN), &[2.0, 0.5, 2.0]);
    }

    #[test]
    fn linear_method_ignores_x_spacing() {
        let table = single_spectrum(vec![0.0, 1.0, 4.0], vec![0.0, 10.0, 40.0]);
        let linear = InterpolationOptions::default().with_method(InterpolationMethod::Linear);
        let index = InterpolationOptions::default();

        let by_ordinal = interpolate_table(&table, &[2.0], &linear).expect("linear");
        let by_value = interpolate_table(&table, &[2.0], &index).expect("index");
        assert_eq!(floats(&by_ordinal, FLAT_COLUMN), &[25.0]);
        assert_eq!(floats(&by_value, FLAT_COLUMN), &[20.0]);
    }

    #[test]
    fn duplicate_and_missing_x_values_are_dropped() {
        let table = single_spectrum(
            vec![1.0, f64::NAN, 0.0, 1.0, 2.0],
            vec![10.0, 99.0, 0.0, 11.0, 20.0],
        );
        let options = InterpolationOptions::default().with_return_all_points(true);
        let result = interpolate_table(&table, &[], &options).expect("interp");
        assert_eq!(floats(&result, ENERGY_COLUMN), &[0.0, 1.0, 2.0]);
        assert_eq!(floats(&result, FLAT_COLUMN), &[0.0, 10.0, 20.0]);
    }

    #[test]
    fn non_overlapping_group_yields_empty_slice() {
        let options = InterpolationOptions::default()
            .grouped_by([SAMPLE_NAME_COLUMN])
            .with_sorted_groups(true);
        let result = interpolate_table(&two_samples(), &[12.0], &options).expect("interp");
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.text_column(SAMPLE_NAME_COLUMN).expect("names"), ["B"]);
        assert!((floats(&result, FLAT_COLUMN)[0] - 3.4).abs() < 1.0e-12);
    }

    #[test]
    fn empty_input_keeps_result_schema() {
        let table = SpectralTable::from_columns([
            (ENERGY_COLUMN, Column::Float(Vec::new())),
            (FLAT_COLUMN, Column::Float(Vec::new())),
            (SAMPLE_NAME_COLUMN, Column::Text(Vec::new())),
        ])
        .expect("table");
        let options = InterpolationOptions::default().grouped_by([SAMPLE_NAME_COLUMN]);
        let result = interpolate_table(&table, &[1.0], &options).expect("interp");
        assert_eq!(result.row_count(), 0);
        assert_eq!(result.column_count(), 3);
    }

    #[test]
    fn signed_zero_x_values_match_zero_target() {
        let table = single_spectrum(vec![-1.0, -0.0], vec![1.0, 2.0]);

        let result =
            interpolate_table(&table, &[0.0], &InterpolationOptions::default()).expect("interp");
        assert_eq!(floats(&result, ENERGY_COLUMN), &[0.0]);
        assert!(floats(&result, ENERGY_COLUMN)[0].is_sign_positive());
        assert_eq!(floats(&result, FLAT_COLUMN), &[2.0]);

        let linear = InterpolationOptions::default().with_method(InterpolationMethod::Linear);
        let result = interpolate_table(&table, &[-0.5, 0.0], &linear).expect("linear");
        assert_eq!(floats(&result, FLAT_COLUMN), &[1.5, 2.0]);
    }

    #[test]
    fn split_identifiers_group_by_name_and_number() {
        let labels = [
            "goethite.1",
            "goethite.1",
            "goethite.2",
            "goethite.2",
            "hematite",
            "hematite",
        ];
        let table = SpectralTable::from_columns([
            (
                ENERGY_COLUMN,
                Column::Float(vec![0.0, 2.0, 0.0, 2.0, 1.0, 3.0]),
            ),
            (
                FLAT_COLUMN,
                Column::Float(vec![0.0, 2.0, 10.0, 30.0, 100.0, 300.0]),
            ),
            (
                SAMPLE_NAME_COLUMN,
                Column::Text(labels.map(str::to_string).to_vec()),
            ),
        ])
        .expect("table");
        let split = split_sample_identifier(&table, &SplitOptions::default()).expect("split");

        let options = InterpolationOptions::default()
            .grouped_by([SAMPLE_NAME_COLUMN, SAMPLE_NUMBER_COLUMN]);
        let result = interpolate_table(&split, &[1.0, 2.0], &options).expect("interp");

        assert_eq!(
            result.column_names().collect::<Vec<_>>(),
            vec![SAMPLE_NAME_COLUMN, SAMPLE_NUMBER_COLUMN, ENERGY_COLUMN, FLAT_COLUMN]
        );
        assert_eq!(
            result.require_column(SAMPLE_NAME_COLUMN).expect("names").kind(),
            ColumnKind::Text
        );
        assert_eq!(
            result.require_column(SAMPLE_NUMBER_COLUMN).expect("numbers").kind(),
            ColumnKind::Integer
        );
        assert_eq!(
            result.text_column(SAMPLE_NAME_COLUMN).expect("names"),
            ["goethite", "goethite", "goethite", "goethite", "hematite", "hematite"]
        );
        assert_eq!(
            result.integer_column(SAMPLE_NUMBER_COLUMN).expect("numbers"),
            &[Some(1), Some(1), Some(2), Some(2), None, None]
        );
        assert_eq!(
            floats(&result, ENERGY_COLUMN),
            &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]
        );
        assert_eq!(
            floats(&result, FLAT_COLUMN),
            &[1.0, 2.0, 20.0, 30.0, 100.0, 200.0]
        );
    }

    #[test]
    fn nan_targets_are_rejected() {
        let table = single_spectrum(vec![0.0, 1.0], vec![0.0, 1.0]);
        let error = interpolate_table(&table, &[0.5, f64::NAN], &InterpolationOptions::default())
            .expect_err("nan target");
        assert_eq!(error.placeholder(), "INPUT.INTERPOLATE_TARGETS");
    }

    #[test]
    fn options_accept_legacy_keyword_names() {
        let options: InterpolationOptions = serde_json::from_str(
            r#"{"xColumn": "energy", "groupKeys": ["sample_name"], "maskMinmax": false, "retAll": true}"#,
        )
        .expect("options");
        assert!(!options.clip_to_overlap);
        assert!(options.return_all_points);
        assert_eq!(options.method, InterpolationMethod::Index);
    }
}
