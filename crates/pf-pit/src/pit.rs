//! Dense pit storage.

use std::ops::Range;

use nalgebra::DMatrix;

use crate::error::{PitError, PitResult};

/// One internal table: a row per node (or branch), a column per quantity.
///
/// Equality compares cells bit for bit, so unset (NaN) cells match.
#[derive(Debug, Clone)]
pub struct Pit {
    data: DMatrix<f64>,
}

impl PartialEq for Pit {
    fn eq(&self, other: &Self) -> bool {
        self.data.shape() == other.data.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Pit {
    /// A NaN filled table.
    pub fn nan(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::from_element(rows, cols, f64::NAN),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: f64) {
        self.data[(row, col)] = v;
    }

    /// Read a row index stored in a column (negative or NaN yields `None`).
    pub fn get_index(&self, row: usize, col: usize) -> Option<usize> {
        let v = self.get(row, col);
        (v.is_finite() && v >= 0.0).then_some(v as usize)
    }

    pub fn flag(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == 1.0
    }

    pub fn set_flag(&mut self, row: usize, col: usize, on: bool) {
        self.set(row, col, if on { 1.0 } else { 0.0 });
    }

    /// Copy of one column.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.data.column(col).iter().copied().collect()
    }

    pub fn set_column(&mut self, col: usize, values: &[f64]) -> PitResult<()> {
        if values.len() != self.rows() {
            return Err(PitError::Shape {
                what: "pit column",
                expected: self.rows(),
                got: values.len(),
            });
        }
        for (r, v) in values.iter().enumerate() {
            self.data[(r, col)] = *v;
        }
        Ok(())
    }

    pub fn fill_column(&mut self, col: usize, v: f64) {
        self.data.column_mut(col).fill(v);
    }

    /// New pit holding only the given rows, in order.
    pub fn select_rows(&self, rows: &[usize]) -> Pit {
        Pit {
            data: self.data.select_rows(rows),
        }
    }

    /// Copy row `src_row` of `src` into row `dst_row`, skipping `keep` columns.
    pub fn copy_row_from(&mut self, dst_row: usize, src: &Pit, src_row: usize, keep: &[usize]) {
        for c in 0..self.cols() {
            if !keep.contains(&c) {
                self.data[(dst_row, c)] = src.data[(src_row, c)];
            }
        }
    }

    /// Mutable view on a contiguous row range.
    pub fn slice_mut(&mut self, rows: Range<usize>) -> PitSliceMut<'_> {
        PitSliceMut { pit: self, rows }
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

/// The rows of one component table inside a pit.
///
/// Row arguments are local (`0..len()`); column values that reference node
/// rows stay global.
pub struct PitSliceMut<'a> {
    pit: &'a mut Pit,
    rows: Range<usize>,
}

impl PitSliceMut<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pit row of a local row.
    pub fn global_row(&self, local: usize) -> usize {
        self.rows.start + local
    }

    #[inline]
    pub fn get(&self, local: usize, col: usize) -> f64 {
        debug_assert!(local < self.len());
        self.pit.get(self.rows.start + local, col)
    }

    #[inline]
    pub fn set(&mut self, local: usize, col: usize, v: f64) {
        debug_assert!(local < self.len());
        self.pit.set(self.rows.start + local, col, v);
    }

    pub fn get_index(&self, local: usize, col: usize) -> Option<usize> {
        self.pit.get_index(self.rows.start + local, col)
    }

    pub fn flag(&self, local: usize, col: usize) -> bool {
        self.pit.flag(self.rows.start + local, col)
    }

    pub fn set_flag(&mut self, local: usize, col: usize, on: bool) {
        self.pit.set_flag(self.rows.start + local, col, on);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_writes_land_in_range() {
        let mut pit = Pit::nan(5, 2);
        {
            let mut slice = pit.slice_mut(2..4);
            assert_eq!(slice.len(), 2);
            slice.set(0, 1, 7.0);
            slice.set_flag(1, 0, true);
            assert_eq!(slice.global_row(1), 3);
        }
        assert_eq!(pit.get(2, 1), 7.0);
        assert!(pit.flag(3, 0));
        assert!(pit.get(4, 1).is_nan());
    }

    #[test]
    fn select_and_copy_rows() {
        let mut pit = Pit::nan(3, 2);
        pit.set_column(0, &[0.0, 1.0, 2.0]).unwrap();
        pit.set_column(1, &[10.0, 11.0, 12.0]).unwrap();
        let sel = pit.select_rows(&[0, 2]);
        assert_eq!(sel.column(1), vec![10.0, 12.0]);

        let mut target = Pit::nan(3, 2);
        target.copy_row_from(1, &sel, 1, &[0]);
        assert!(target.get(1, 0).is_nan());
        assert_eq!(target.get(1, 1), 12.0);
    }

    #[test]
    fn equality_treats_unset_cells_as_equal() {
        let mut a = Pit::nan(2, 2);
        let b = a.clone();
        assert_eq!(a, b);
        a.set(0, 0, 1.0);
        assert_ne!(a, b);
        assert_ne!(Pit::nan(2, 2), Pit::nan(2, 3));
    }

    #[test]
    fn index_decoding() {
        let mut pit = Pit::nan(1, 1);
        assert_eq!(pit.get_index(0, 0), None);
        pit.set(0, 0, -1.0);
        assert_eq!(pit.get_index(0, 0), None);
        pit.set(0, 0, 4.0);
        assert_eq!(pit.get_index(0, 0), Some(4));
        assert!(pit.set_column(0, &[1.0, 2.0]).is_err());
    }
}
