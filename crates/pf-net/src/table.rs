//! Element tables with explicit indices.

use crate::error::{NetError, NetResult};

/// Rows of one element type, in insertion order, each with a unique element
/// index. Indices need not be contiguous.
#[derive(Debug, Clone)]
pub struct Table<T> {
    name: &'static str,
    index: Vec<usize>,
    rows: Vec<T>,
}

impl<T> Table<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append a row under the next free index (max + 1) and return it.
    pub fn push(&mut self, row: T) -> usize {
        let idx = self.max_index().map_or(0, |m| m + 1);
        self.index.push(idx);
        self.rows.push(row);
        idx
    }

    /// Append a row under an explicit index.
    pub fn insert(&mut self, index: usize, row: T) -> NetResult<usize> {
        if self.index.contains(&index) {
            return Err(NetError::DuplicateIndex {
                table: self.name,
                index,
            });
        }
        self.index.push(index);
        self.rows.push(row);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Element indices in row order.
    pub fn indices(&self) -> &[usize] {
        &self.index
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn max_index(&self) -> Option<usize> {
        self.index.iter().copied().max()
    }

    /// Row position of an element index.
    pub fn position(&self, index: usize) -> Option<usize> {
        self.index.iter().position(|&i| i == index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.position(index).map(|p| &self.rows[p])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.position(index).map(move |p| &mut self.rows[p])
    }

    /// `(element index, row)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.index.iter().copied().zip(self.rows.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_uses_next_free_index() {
        let mut t: Table<u8> = Table::new("junction");
        assert_eq!(t.push(1), 0);
        t.insert(10, 2).unwrap();
        assert_eq!(t.push(3), 11);
        assert_eq!(t.indices(), &[0, 10, 11]);
        assert_eq!(t.get(10), Some(&2));
        assert_eq!(t.position(11), Some(2));
    }

    #[test]
    fn duplicate_index_rejected() {
        let mut t: Table<u8> = Table::new("pipe");
        t.insert(4, 0).unwrap();
        assert!(matches!(
            t.insert(4, 1),
            Err(NetError::DuplicateIndex { index: 4, .. })
        ));
    }
}
