//! Row-indexed typed columns.

/// A named column of optional values addressable by row index.
///
/// `None` is the undefined sentinel: warm-up rows, rows whose inputs are
/// undefined, and rows that were allocated but not yet computed.
#[derive(Debug, Clone)]
pub struct Var<T> {
    name: &'static str,
    values: Vec<Option<T>>,
}

impl<T: Copy> Var<T> {
    /// Creates an empty column.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: Vec::new(),
        }
    }

    /// Creates an empty column with room for `capacity` rows.
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            values: Vec::with_capacity(capacity),
        }
    }

    /// Column name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of allocated rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no row has been allocated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `row`, `None` when undefined or not allocated.
    pub fn get(&self, row: usize) -> Option<T> {
        self.values.get(row).copied().flatten()
    }

    /// Writes a defined value at `row`.
    pub fn set(&mut self, row: usize, value: T) {
        self.put(row, Some(value));
    }

    /// Writes `value` at `row`, appending or overwriting.
    ///
    /// Writing past the end pads the gap with undefined rows.
    pub fn put(&mut self, row: usize, value: Option<T>) {
        if let Some(slot) = self.values.get_mut(row) {
            *slot = value;
        } else {
            self.values.resize(row, None);
            self.values.push(value);
        }
    }

    /// Marks `row` undefined, allocating it if needed.
    pub fn reset(&mut self, row: usize) {
        self.put(row, None);
    }

    /// Drops every row at or after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// Last allocated value.
    pub fn last(&self) -> Option<T> {
        self.values.last().copied().flatten()
    }

    /// Iterates over all allocated rows.
    pub fn iter(&self) -> impl Iterator<Item = Option<T>> + '_ {
        self.values.iter().copied()
    }
}
