//! Lookups between element tables and pit rows.

use std::ops::Range;

use crate::connectivity::Connectivity;
use crate::error::{PitError, PitResult};

/// Bidirectional map between table names and numeric table ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRegistry {
    names: Vec<String>,
}

impl TableRegistry {
    /// Id of `name`, registering it if it is new.
    pub fn register(&mut self, name: &str) -> usize {
        match self.id(name) {
            Some(id) => id,
            None => {
                self.names.push(name.to_owned());
                self.names.len() - 1
            }
        }
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Ordered row ranges per table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FromTo {
    ranges: Vec<(String, Range<usize>)>,
}

impl FromTo {
    /// Append a table of `len` rows after the last range.
    pub fn push(&mut self, name: &str, len: usize) -> PitResult<Range<usize>> {
        if self.range(name).is_some() {
            return Err(PitError::DuplicateTable {
                name: name.to_owned(),
            });
        }
        let start = self.total();
        let range = start..start + len;
        self.ranges.push((name.to_owned(), range.clone()));
        Ok(range)
    }

    pub fn range(&self, name: &str) -> Option<Range<usize>> {
        self.ranges
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.clone())
    }

    pub fn total(&self) -> usize {
        self.ranges.last().map_or(0, |(_, r)| r.end)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Range<usize>)> + '_ {
        self.ranges.iter().map(|(n, r)| (n.as_str(), r.clone()))
    }
}

/// Element index -> pit row for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexLookup {
    rows: Vec<Option<usize>>,
}

impl IndexLookup {
    pub fn insert(&mut self, element: usize, row: usize) {
        if element >= self.rows.len() {
            self.rows.resize(element + 1, None);
        }
        self.rows[element] = Some(row);
    }

    pub fn get(&self, element: usize) -> Option<usize> {
        self.rows.get(element).copied().flatten()
    }

    /// `(element, row)` pairs in element order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(e, r)| r.map(|r| (e, r)))
    }
}

/// Registry, row ranges and element index maps of one pit kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableLookup {
    pub registry: TableRegistry,
    pub from_to: FromTo,
    index: Vec<(String, IndexLookup)>,
}

impl TableLookup {
    /// A lookup sharing the table ids of `registry`, without any rows yet.
    pub fn with_registry(registry: TableRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Register a table and allot `len` rows. Returns the table id and range.
    pub fn add_table(&mut self, name: &str, len: usize) -> PitResult<(usize, Range<usize>)> {
        let range = self.from_to.push(name, len)?;
        Ok((self.registry.register(name), range))
    }

    pub fn range(&self, name: &str) -> Option<Range<usize>> {
        self.from_to.range(name)
    }

    pub fn set_index(&mut self, name: &str, lookup: IndexLookup) {
        match self.index.iter_mut().find(|(n, _)| n == name) {
            Some((_, l)) => *l = lookup,
            None => self.index.push((name.to_owned(), lookup)),
        }
    }

    pub fn index(&self, name: &str) -> Option<&IndexLookup> {
        self.index.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }

    /// Pit row of element `element` of table `name`.
    pub fn row_of(&self, name: &str, element: usize) -> Option<usize> {
        self.index(name).and_then(|l| l.get(element))
    }

    pub fn len(&self) -> usize {
        self.from_to.total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn index_tables(&self) -> impl Iterator<Item = (&str, &IndexLookup)> + '_ {
        self.index.iter().map(|(n, l)| (n.as_str(), l))
    }
}

/// Lookups of the full pits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookups {
    pub node: TableLookup,
    pub branch: TableLookup,
}

/// Lookups of a reduced view: connectivity masks of the full pits plus the
/// row ranges and index maps inside the reduced pits.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLookups {
    pub connectivity: Connectivity,
    pub node: TableLookup,
    pub branch: TableLookup,
}
