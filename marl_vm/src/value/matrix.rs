//! Dense numeric matrix.
//!
//! Storage is a nalgebra `DMatrix<f64>` (column-major internally); the API
//! here is row-major throughout, which is how the language indexes and
//! prints matrices.

use std::fmt;

use nalgebra::DMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: DMatrix<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    pub fn empty() -> Self {
        Self::zeros(0, 0)
    }

    /// Build from rows; shorter rows are padded with zeros to the widest row.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        if cols == 0 {
            return Self::empty();
        }
        let data = DMatrix::from_fn(rows.len(), cols, |r, c| {
            rows[r].get(c).copied().unwrap_or(0.0)
        });
        Self { data }
    }

    /// Row-major flat data with the given shape. `values.len()` must equal `rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, values: &[f64]) -> Option<Self> {
        if values.len() != rows * cols {
            return None;
        }
        Some(Self {
            data: DMatrix::from_row_slice(rows, cols, values),
        })
    }

    pub fn row_vector(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        let cols = values.len();
        Self {
            data: DMatrix::from_row_slice(1, cols, &values),
        }
    }

    pub fn column_vector(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        let rows = values.len();
        Self {
            data: DMatrix::from_column_slice(rows, 1, &values),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_vector(&self) -> bool {
        self.rows() == 1 || self.cols() == 1
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows() && col < self.cols()).then(|| self.data[(row, col)])
    }

    /// Row-major linear access
    pub fn get_linear(&self, index: usize) -> Option<f64> {
        let (row, col) = self.split_linear(index)?;
        Some(self.data[(row, col)])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        if row < self.rows() && col < self.cols() {
            self.data[(row, col)] = value;
            true
        } else {
            false
        }
    }

    pub fn set_linear(&mut self, index: usize, value: f64) -> bool {
        match self.split_linear(index) {
            Some((row, col)) => self.set(row, col, value),
            None => false,
        }
    }

    fn split_linear(&self, index: usize) -> Option<(usize, usize)> {
        let cols = self.cols();
        (index < self.len() && cols > 0).then(|| (index / cols, index % cols))
    }

    /// Elements in row-major order
    pub fn to_row_major(&self) -> Vec<f64> {
        self.data.transpose().as_slice().to_vec()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        (row < self.rows()).then(|| self.data.row(row).iter().copied().collect())
    }

    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose(),
        }
    }

    pub fn map(&self, f: impl FnMut(f64) -> f64) -> Self {
        Self {
            data: self.data.map(f),
        }
    }

    /// Elementwise combination of two equally shaped matrices
    pub fn zip_map(&self, other: &Matrix, f: impl FnMut(f64, f64) -> f64) -> Option<Self> {
        if self.data.shape() != other.data.shape() {
            return None;
        }
        Some(Self {
            data: self.data.zip_map(&other.data, f),
        })
    }

    /// Matrix product; inner dimensions must agree
    pub fn product(&self, other: &Matrix) -> Option<Self> {
        if self.cols() != other.rows() {
            return None;
        }
        Some(Self {
            data: &self.data * &other.data,
        })
    }

    /// Horizontal concatenation; row counts must agree
    pub fn hconcat(&self, other: &Matrix) -> Option<Self> {
        if self.is_empty() {
            return Some(other.clone());
        }
        if other.is_empty() {
            return Some(self.clone());
        }
        if self.rows() != other.rows() {
            return None;
        }
        let rows: Vec<Vec<f64>> = self
            .to_rows()
            .into_iter()
            .zip(other.to_rows())
            .map(|(mut left, right)| {
                left.extend(right);
                left
            })
            .collect();
        Some(Self::from_rows(&rows))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (r, row) in self.to_rows().iter().enumerate() {
            if r > 0 {
                write!(f, "; ")?;
            }
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", super::format_number(*value))?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
    }

    #[test]
    fn test_row_major_access() {
        let m = sample();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.get_linear(4), Some(5.0));
        assert_eq!(m.get(1, 1), Some(5.0));
        assert_eq!(m.get_linear(6), None);
        assert_eq!(m.get(1, 3), None);
        assert_eq!(m.to_row_major(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let m = Matrix::from_rows(&[vec![1.0], vec![2.0, 3.0]]);
        assert_eq!(m.to_rows(), vec![vec![1.0, 0.0], vec![2.0, 3.0]]);
    }

    #[test]
    fn test_product_checks_inner_dimension() {
        let m = sample();
        let t = m.transpose();
        let p = m.product(&t).unwrap();
        assert_eq!(p.to_rows(), vec![vec![14.0, 32.0], vec![32.0, 77.0]]);
        assert!(m.product(&m).is_none());
    }

    #[test]
    fn test_set_linear() {
        let mut m = sample();
        assert!(m.set_linear(2, 9.0));
        assert_eq!(m.get(0, 2), Some(9.0));
        assert!(!m.set_linear(10, 1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "[1, 2, 3; 4, 5, 6]");
        assert_eq!(Matrix::empty().to_string(), "[]");
    }

    #[test]
    fn test_hconcat() {
        let a = Matrix::row_vector(vec![1.0, 2.0]);
        let b = Matrix::row_vector(vec![3.0]);
        assert_eq!(a.hconcat(&b).unwrap().to_row_major(), vec![1.0, 2.0, 3.0]);
        assert!(sample().hconcat(&a).is_none());
    }
}
