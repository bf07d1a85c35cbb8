//! Splits `name.number` sample labels into a name and a replicate index.

use crate::domain::{SAMPLE_NAME_COLUMN, SAMPLE_NUMBER_COLUMN, XafsError, XafsResult};
use crate::table::{Column, SpectralTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitOptions {
    pub sample_column: String,
    pub number_column: String,
    pub separator: String,
    /// Replicate index stored when a label has no separator. `None` leaves
    /// it missing; `Some(-1)` reproduces the legacy sentinel.
    pub missing_number: Option<i64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            sample_column: SAMPLE_NAME_COLUMN.to_string(),
            number_column: SAMPLE_NUMBER_COLUMN.to_string(),
            separator: ".".to_string(),
            missing_number: None,
        }
    }
}

impl SplitOptions {
    pub fn with_missing_number(mut self, sentinel: i64) -> Self {
        self.missing_number = Some(sentinel);
        self
    }
}

/// Name and replicate index of one label. Pieces after the second are
/// ignored.
pub fn split_label<'a>(label: &'a str, separator: &str) -> (&'a str, Option<&'a str>) {
    let mut pieces = label.split(separator);
    let name = pieces.next().unwrap_or(label);
    (name, pieces.next())
}

/// Returns a copy of `table` whose sample column holds only the name part
/// and whose number column holds the parsed replicate index.
pub fn split_sample_identifier(
    table: &SpectralTable,
    options: &SplitOptions,
) -> XafsResult<SpectralTable> {
    if options.separator.is_empty() {
        return Err(XafsError::input_validation(
            "INPUT.SPLIT_OPTIONS",
            "sample identifier separator must not be empty",
        ));
    }

    let labels = table.text_column(&options.sample_column)?;
    let mut names = Vec::with_capacity(labels.len());
    let mut numbers = Vec::with_capacity(labels.len());
    for (row, label) in labels.iter().enumerate() {
        let (name, number) = split_label(label, &options.separator);
        let number = match number {
            Some(token) => Some(token.trim().parse::<i64>().map_err(|_| {
                XafsError::input_validation(
                    "INPUT.SAMPLE_NUMBER",
                    format!(
                        "row {} label '{}' has replicate suffix '{}' that is not an integer",
                        row, label, token
                    ),
                )
            })?),
            None => options.missing_number,
        };
        names.push(name.to_string());
        numbers.push(number);
    }

    table
        .clone()
        .with_column(options.sample_column.clone(), Column::Text(names))?
        .with_column(options.number_column.clone(), Column::Integer(numbers))
}

#[cfg(test)]
mod tests {
    use super::{SplitOptions, split_label, split_sample_identifier};
    use crate::domain::{ENERGY_COLUMN, SAMPLE_NAME_COLUMN, SAMPLE_NUMBER_COLUMN};
    use crate::modules::reader::sample_label;
    use crate::table::{Column, SpectralTable};
    use std::path::Path;

    fn labelled(labels: &[&str]) -> SpectralTable {
        SpectralTable::from_columns([
            (ENERGY_COLUMN, Column::Float(vec![0.0; labels.len()])),
            (
                SAMPLE_NAME_COLUMN,
                Column::Text(labels.iter().map(|label| label.to_string()).collect()),
            ),
        ])
        .expect("table")
    }

    #[test]
    fn file_label_splits_into_name_and_number() {
        let label = sample_label(Path::new("sampleA.1.csv"));
        assert_eq!(label, "sampleA.1");

        let table = labelled(&[label.as_str(), "sampleB.12.extra"]);
        let split = split_sample_identifier(&table, &SplitOptions::default()).expect("split");
        assert_eq!(
            split.text_column(SAMPLE_NAME_COLUMN).expect("names"),
            ["sampleA", "sampleB"]
        );
        assert_eq!(
            split.integer_column(SAMPLE_NUMBER_COLUMN).expect("numbers"),
            &[Some(1), Some(12)]
        );
        assert_eq!(
            table.text_column(SAMPLE_NAME_COLUMN).expect("input untouched")[0],
            "sampleA.1"
        );
    }

    #[test]
    fn missing_suffix_is_absent_or_legacy_sentinel() {
        let table = labelled(&["hematite"]);
        let split = split_sample_identifier(&table, &SplitOptions::default()).expect("split");
        assert_eq!(
            split.integer_column(SAMPLE_NUMBER_COLUMN).expect("numbers"),
            &[None]
        );

        let legacy = SplitOptions::default().with_missing_number(-1);
        let split = split_sample_identifier(&table, &legacy).expect("split");
        assert_eq!(
            split.integer_column(SAMPLE_NUMBER_COLUMN).expect("numbers"),
            &[Some(-1)]
        );
    }

    #[test]
    fn non_integer_suffix_is_rejected() {
        let error = split_sample_identifier(&labelled(&["a.1", "b.x"]), &SplitOptions::default())
            .expect_err("bad suffix");
        assert_eq!(error.placeholder(), "INPUT.SAMPLE_NUMBER");
        assert!(error.message().contains("row 1"));
    }

    #[test]
    fn custom_separator_is_honoured() {
        assert_eq!(split_label("ferrihydrite_3", "_"), ("ferrihydrite", Some("3")));
        assert_eq!(split_label("ferrihydrite", "_"), ("ferrihydrite", None));
    }
}
