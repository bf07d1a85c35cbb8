//! Labelled 2-D arrays (grid rows x sample columns) pivoted from tables.

use crate::domain::{XafsError, XafsResult};
use crate::table::SpectralTable;
use faer::Mat;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone)]
pub struct AlignedArray {
    grid_name: String,
    grid: Vec<f64>,
    label_name: String,
    labels: Vec<String>,
    values: Mat<f64>,
}

impl AlignedArray {
    pub fn new(
        grid_name: impl Into<String>,
        grid: Vec<f64>,
        label_name: impl Into<String>,
        labels: Vec<String>,
        values: Mat<f64>,
    ) -> XafsResult<Self> {
        if values.nrows() != grid.len() || values.ncols() != labels.len() {
            return Err(XafsError::input_validation(
                "INPUT.ALIGNED_SHAPE",
                format!(
                    "aligned values are {}x{} but the grid has {} points and there are {} labels",
                    values.nrows(),
                    values.ncols(),
                    grid.len(),
                    labels.len()
                ),
            ));
        }

        Ok(Self {
            grid_name: grid_name.into(),
            grid,
            label_name: label_name.into(),
            labels,
            values,
        })
    }

    /// Pivots `value_column` into one column per distinct `label_column`
    /// value. Every label must carry the same `grid_column` values in the
    /// same order.
    pub fn from_table(
        table: &SpectralTable,
        grid_column: &str,
        label_column: &str,
        value_column: &str,
    ) -> XafsResult<Self> {
        let grid_values = table.float_column(grid_column)?;
        let values = table.float_column(value_column)?;
        let partitions = table.partition(&[label_column.to_string()])?;

        let mut grid: Option<Vec<f64>> = None;
        let mut labels = Vec::with_capacity(partitions.len());
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(partitions.len());
        for partition in partitions {
            if partition.rows.is_empty() {
                continue;
            }
            let label = partition.key.label();
            let partition_grid: Vec<f64> =
                partition.rows.iter().map(|&row| grid_values[row]).collect();

            match grid.as_ref() {
                Some(shared) if *shared != partition_grid => {
                    return Err(XafsError::input_validation(
                        "INPUT.ALIGNED_GRID",
                        format!(
                            "label '{}' has {} '{}' points that differ from the shared grid of {} points",
                            label,
                            partition_grid.len(),
                            grid_column,
                            shared.len()
                        ),
                    ));
                }
                Some(_) => {}
                None => grid = Some(partition_grid),
            }

            labels.push(label);
            columns.push(partition.rows.iter().map(|&row| values[row]).collect());
        }

        let grid = grid.unwrap_or_default();
        let matrix = Mat::from_fn(grid.len(), columns.len(), |row, col| columns[col][row]);
        Self::new(grid_column, grid, label_column, labels, matrix)
    }

    pub fn grid_name(&self) -> &str {
        &self.grid_name
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &Mat<f64> {
        &self.values
    }

    pub fn grid_len(&self) -> usize {
        self.grid.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        (0..self.values.nrows())
            .map(|row| self.values[(row, index)])
            .collect()
    }

    /// Array with the same grid and labels holding `values`.
    pub fn with_values(&self, values: Mat<f64>) -> XafsResult<Self> {
        Self::new(
            self.grid_name.clone(),
            self.grid.clone(),
            self.label_name.clone(),
            self.labels.clone(),
            values,
        )
    }

    pub fn all_finite(&self) -> bool {
        (0..self.values.ncols())
            .all(|col| (0..self.values.nrows()).all(|row| self.values[(row, col)].is_finite()))
    }
}

impl PartialEq for AlignedArray {
    fn eq(&self, other: &Self) -> bool {
        self.grid_name == other.grid_name
            && self.grid == other.grid
            && self.label_name == other.label_name
            && self.labels == other.labels
            && (0..self.values.ncols()).all(|col| self.column(col) == other.column(col))
    }
}

impl Serialize for AlignedArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns: Vec<Vec<f64>> = (0..self.values.ncols()).map(|col| self.column(col)).collect();
        let mut state = serializer.serialize_struct("AlignedArray", 5)?;
        state.serialize_field("gridName", &self.grid_name)?;
        state.serialize_field("grid", &self.grid)?;
        state.serialize_field("labelName", &self.label_name)?;
        state.serialize_field("labels", &self.labels)?;
        state.serialize_field("columns", &columns)?;
        state.end()
    }
}
