//! Grid position mapping.
//!
//! Pure index arithmetic for the card grid: a linear feed index maps to
//! (row, column) for the current column count. Callers re-derive positions
//! every render instead of caching them, so a density or list-mode change
//! can never leave stale coordinates behind.

/// A cell in the rendered feed grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub row: usize,
    pub column: usize,
}

/// Map a linear index to its grid cell for `columns` columns.
///
/// `columns` is clamped to at least 1; list mode is simply `columns == 1`,
/// where every item sits in column 0 of its own row.
pub fn position(index: usize, columns: usize) -> GridPosition {
    let columns = columns.max(1);
    GridPosition {
        row: index / columns,
        column: index % columns,
    }
}

/// Number of grid rows needed for `len` items.
pub fn row_count(len: usize, columns: usize) -> usize {
    let columns = columns.max(1);
    len.div_ceil(columns)
}
