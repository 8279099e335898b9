//! Data structures to deal with locations in the grid.

use std::fmt;

/// A coordinate in the grid. The numbers are 0-indexed.
///
/// Used as a map/set key throughout, so it is `Copy` and hashes as the
/// plain (row, col) pair. Negative or fractional coordinates are
/// unrepresentable; callers never need to validate before constructing.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Coordinate {
    row: usize,
    col: usize,
}

impl Coordinate {
    pub fn new(row: usize, col: usize) -> Coordinate {
        Coordinate { row, col }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
