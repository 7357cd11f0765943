//! Dataset payloads: the physical layouts a stored array can take.
//!
//! Each layout is extensible along at most one axis and grows only by
//! appending. A `fixed` creation flag turns into a hard bound on that axis
//! (`max_cols`/`max_len`); growth past the bound fails with
//! [`Error::CapacityExceeded`] without mutating the payload.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::ObjectId;

/// Immutable ordered list of strings (source-id mapping datasets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringVec {
    values: Vec<String>,
}

impl StringVec {
    /// Create from an ordered list. The length is fixed for good.
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// The stored strings, in declaration order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One row of a [`SourceRefRows`] dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRefRow {
    /// Source identifier owning this row.
    pub source: String,
    /// Reference to the source's dataset, filled on first write.
    pub data: Option<ObjectId>,
}

/// Two-column mapping dataset: (source id, dataset reference) per row.
///
/// Used by the per-source layout, where each row gains a reference to its
/// source's dataset once that dataset is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRefRows {
    rows: Vec<SourceRefRow>,
}

impl SourceRefRows {
    /// Create with one null-reference row per source, in order.
    pub fn new(sources: Vec<String>) -> Self {
        Self {
            rows: sources
                .into_iter()
                .map(|source| SourceRefRow { source, data: None })
                .collect(),
        }
    }

    /// All rows in declaration order.
    pub fn rows(&self) -> &[SourceRefRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Source ids in declaration order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.source.as_str())
    }

    /// Fill the dataset reference slot of one row.
    pub fn set_ref(&mut self, row: usize, target: ObjectId) -> Result<()> {
        let rows = self.rows.len();
        let slot = self
            .rows
            .get_mut(row)
            .ok_or(Error::RowOutOfRange { row, rows })?;
        slot.data = Some(target);
        Ok(())
    }
}

/// Extensible row-major 2-D array.
///
/// The row count is fixed at creation; the width grows by whole columns
/// ([`append_cols`](Matrix::append_cols)) or to an explicit target
/// ([`grow_width`](Matrix::grow_width)), new cells taking the fill value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    max_cols: Option<usize>,
    fill: f64,
}

impl Matrix {
    /// Create from a block of equal-length rows.
    ///
    /// `max_cols` caps later width growth; `fill` is the value new cells
    /// take when the width grows past a row's written extent.
    pub fn from_rows(block: &[&[f64]], max_cols: Option<usize>, fill: f64) -> Result<Self> {
        let cols = block.first().map_or(0, |row| row.len());
        for row in block {
            if row.len() != cols {
                return Err(Error::UnevenBlock {
                    first: cols,
                    other: row.len(),
                });
            }
        }
        let mut data = Vec::with_capacity(block.len() * cols);
        for row in block {
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: block.len(),
            cols,
            data,
            max_cols,
            fill,
        })
    }

    /// Create sentinel-filled with the given shape.
    pub fn filled(rows: usize, cols: usize, max_cols: Option<usize>, fill: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![fill; rows * cols],
            max_cols,
            fill,
        }
    }

    /// (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Result<&[f64]> {
        if row >= self.rows {
            return Err(Error::RowOutOfRange {
                row,
                rows: self.rows,
            });
        }
        Ok(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    fn check_width(&self, requested: usize) -> Result<()> {
        if let Some(bound) = self.max_cols {
            if requested > bound {
                return Err(Error::CapacityExceeded { requested, bound });
            }
        }
        Ok(())
    }

    /// Append a block of columns after the current last column.
    ///
    /// The block must carry one row per matrix row, all of equal length.
    pub fn append_cols(&mut self, block: &[&[f64]]) -> Result<()> {
        if block.len() != self.rows {
            return Err(Error::RowCountMismatch {
                expected: self.rows,
                got: block.len(),
            });
        }
        let added = block.first().map_or(0, |row| row.len());
        for row in block {
            if row.len() != added {
                return Err(Error::UnevenBlock {
                    first: added,
                    other: row.len(),
                });
            }
        }
        self.check_width(self.cols + added)?;

        let new_cols = self.cols + added;
        let mut data = Vec::with_capacity(self.rows * new_cols);
        for (row, extra) in block.iter().enumerate() {
            data.extend_from_slice(&self.data[row * self.cols..(row + 1) * self.cols]);
            data.extend_from_slice(extra);
        }
        self.data = data;
        self.cols = new_cols;
        Ok(())
    }

    /// Grow the width to `new_cols`, filling new cells with the fill value.
    /// Shrinking is a no-op.
    pub fn grow_width(&mut self, new_cols: usize) -> Result<()> {
        if new_cols <= self.cols {
            return Ok(());
        }
        self.check_width(new_cols)?;
        let mut data = Vec::with_capacity(self.rows * new_cols);
        for row in 0..self.rows {
            data.extend_from_slice(&self.data[row * self.cols..(row + 1) * self.cols]);
            data.extend(std::iter::repeat(self.fill).take(new_cols - self.cols));
        }
        self.data = data;
        self.cols = new_cols;
        Ok(())
    }

    /// Overwrite part of one row, starting at `start`.
    pub fn write_row_segment(&mut self, row: usize, start: usize, values: &[f64]) -> Result<()> {
        if row >= self.rows {
            return Err(Error::RowOutOfRange {
                row,
                rows: self.rows,
            });
        }
        if start + values.len() > self.cols {
            return Err(Error::SegmentOverflow {
                start,
                len: values.len(),
                cols: self.cols,
            });
        }
        let offset = row * self.cols + start;
        self.data[offset..offset + values.len()].copy_from_slice(values);
        Ok(())
    }
}

/// Extensible 1-D array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    data: Vec<f64>,
    max_len: Option<usize>,
}

impl Vector {
    /// Create from initial values; `max_len` caps later growth.
    pub fn new(data: Vec<f64>, max_len: Option<usize>) -> Self {
        Self { data, max_len }
    }

    /// The stored values.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append values after the current last element.
    pub fn append(&mut self, values: &[f64]) -> Result<()> {
        let requested = self.data.len() + values.len();
        if let Some(bound) = self.max_len {
            if requested > bound {
                return Err(Error::CapacityExceeded { requested, bound });
            }
        }
        self.data.extend_from_slice(values);
        Ok(())
    }
}

/// Per-row variable-length 2-D array.
///
/// The row count is fixed at creation. Rows are read and rewritten whole:
/// there is no in-place partial extension of a ragged row. Sealing the
/// dataset (the `fixed` creation flag) rejects every later rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ragged {
    rows: Vec<Vec<f64>>,
    sealed: bool,
}

impl Ragged {
    /// Create with `rows` empty rows.
    pub fn new(rows: usize) -> Self {
        Self {
            rows: vec![Vec::new(); rows],
            sealed: false,
        }
    }

    /// Seal the dataset against further row rewrites.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Result<&[f64]> {
        self.rows.get(row).map(Vec::as_slice).ok_or(Error::RowOutOfRange {
            row,
            rows: self.rows.len(),
        })
    }

    /// Replace one row wholesale. Fails once the dataset is sealed.
    pub fn set_row(&mut self, row: usize, values: Vec<f64>) -> Result<()> {
        if self.sealed {
            return Err(Error::Fixed);
        }
        let rows = self.rows.len();
        let slot = self
            .rows
            .get_mut(row)
            .ok_or(Error::RowOutOfRange { row, rows })?;
        *slot = values;
        Ok(())
    }
}

/// The physical layout of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Ordered string list.
    Strings(StringVec),
    /// (source, dataset-reference) rows.
    SourceRefs(SourceRefRows),
    /// Extensible 2-D array.
    Matrix(Matrix),
    /// Extensible 1-D array.
    Vector(Vector),
    /// Per-row variable-length 2-D array.
    Ragged(Ragged),
}

impl Payload {
    /// Layout name used in error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Strings(_) => "strings",
            Payload::SourceRefs(_) => "source-refs",
            Payload::Matrix(_) => "matrix",
            Payload::Vector(_) => "vector",
            Payload::Ragged(_) => "ragged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_append_cols_extends_every_row() {
        let mut m = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]], None, 0.0).unwrap();
        m.append_cols(&[&[5.0], &[6.0]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row(0).unwrap(), &[1.0, 2.0, 5.0]);
        assert_eq!(m.row(1).unwrap(), &[3.0, 4.0, 6.0]);
    }

    #[test]
    fn matrix_append_rejects_uneven_block() {
        let mut m = Matrix::from_rows(&[&[1.0], &[2.0]], None, 0.0).unwrap();
        let err = m.append_cols(&[&[1.0, 2.0], &[3.0]]).unwrap_err();
        assert!(matches!(err, Error::UnevenBlock { .. }));
        assert_eq!(m.shape(), (2, 1));
    }

    #[test]
    fn matrix_respects_fixed_width() {
        let mut m = Matrix::from_rows(&[&[1.0, 2.0]], Some(2), 0.0).unwrap();
        let err = m.append_cols(&[&[3.0]]).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                requested: 3,
                bound: 2
            }
        ));
        assert_eq!(m.shape(), (1, 2));
    }

    #[test]
    fn matrix_grow_width_fills_with_sentinel() {
        let mut m = Matrix::from_rows(&[&[1.0]], None, f64::NAN).unwrap();
        m.grow_width(3).unwrap();
        let row = m.row(0).unwrap();
        assert_eq!(row[0], 1.0);
        assert!(row[1].is_nan() && row[2].is_nan());
    }

    #[test]
    fn vector_append_respects_bound() {
        let mut v = Vector::new(vec![1.0, 2.0], Some(3));
        v.append(&[3.0]).unwrap();
        assert!(matches!(
            v.append(&[4.0]),
            Err(Error::CapacityExceeded { .. })
        ));
        assert_eq!(v.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn ragged_rows_are_independent() {
        let mut r = Ragged::new(2);
        r.set_row(0, vec![1.0, 2.0]).unwrap();
        r.set_row(1, vec![3.0]).unwrap();
        assert_eq!(r.row(0).unwrap(), &[1.0, 2.0]);
        assert_eq!(r.row(1).unwrap(), &[3.0]);
        assert!(matches!(r.row(2), Err(Error::RowOutOfRange { .. })));
    }

    #[test]
    fn sealed_ragged_rejects_rewrites() {
        let mut r = Ragged::new(1);
        r.set_row(0, vec![1.0]).unwrap();
        r.seal();
        assert!(matches!(r.set_row(0, vec![2.0]), Err(Error::Fixed)));
        assert_eq!(r.row(0).unwrap(), &[1.0]);
    }

    #[test]
    fn source_ref_slots_start_null() {
        let mut rows = SourceRefRows::new(vec!["a".into(), "b".into()]);
        assert!(rows.rows().iter().all(|row| row.data.is_none()));
        rows.set_ref(1, ObjectId(7)).unwrap();
        assert_eq!(rows.rows()[1].data, Some(ObjectId(7)));
    }
}
