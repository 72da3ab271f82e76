//! Named result columns of one element table.

/// One row per element (in input order), NaN where an element is inactive.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub table: &'static str,
    pub index: Vec<usize>,
    columns: Vec<(&'static str, Vec<f64>)>,
}

impl ResultTable {
    pub fn new(table: &'static str, index: Vec<usize>) -> Self {
        Self {
            table,
            index,
            columns: Vec::new(),
        }
    }

    /// Append (or replace) a column. Values must follow `index`.
    pub fn push_column(&mut self, name: &'static str, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.index.len());
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = values,
            None => self.columns.push((name, values)),
        }
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Value of column `name` for element index `element`.
    pub fn get(&self, name: &str, element: usize) -> Option<f64> {
        let pos = self.index.iter().position(|&i| i == element)?;
        self.column(name).map(|c| c[pos])
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_element() {
        let mut t = ResultTable::new("junction", vec![4, 2]);
        t.push_column("p_bar", vec![1.0, f64::NAN]);
        assert_eq!(t.get("p_bar", 4), Some(1.0));
        assert!(t.get("p_bar", 2).is_some_and(f64::is_nan));
        assert_eq!(t.get("p_bar", 3), None);
        assert_eq!(t.get("t_k", 4), None);
        t.push_column("p_bar", vec![0.0, 0.0]);
        assert_eq!(t.column_names().count(), 1);
    }
}
