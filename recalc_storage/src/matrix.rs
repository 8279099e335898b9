use crate::location::Coordinate;
use crate::StorageErrorKind;

use im::Vector;
use std::collections::HashMap;
use std::fmt::Display;

/// Counts of the rows and columns in a matrix.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Size {
    pub rows: usize,
    pub columns: usize,
}

/// A persistent two-dimensional container keyed by (row, column).
///
/// Absent cells hold an explicit `None`, distinct from any value of
/// `T`. Rows are persistent vectors, so an updated matrix shares every
/// row the update did not touch with its original.
///
/// Row 0's length is the authoritative column count: `has` and `size`
/// consult it, and any write that extends the column count extends
/// row 0 to match even when row 0 itself is not written. Rows other
/// than row 0 may be physically shorter; their missing tail reads as
/// empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T: Clone> {
    rows: Vector<Vector<Option<T>>>,
}

impl<T: Clone> Default for Matrix<T> {
    fn default() -> Self {
        Matrix {
            rows: Vector::new(),
        }
    }
}

impl<T: Clone> Matrix<T> {
    /// Creates an empty matrix with the given rows and columns.
    pub fn new(rows: usize, columns: usize) -> Matrix<T> {
        let row: Vector<Option<T>> = empty_row(columns);

        Matrix {
            rows: std::iter::repeat(row).take(rows).collect(),
        }
    }

    /// Builds a matrix from nested rows. Row 0 is widened to the
    /// longest input row so the authoritative-width invariant holds
    /// from the start.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<Option<T>>>) -> Matrix<T> {
        let mut rows: Vector<Vector<Option<T>>> =
            rows.into_iter().map(Vector::from_iter).collect();

        let width = rows.iter().map(Vector::len).max().unwrap_or(0);
        if let Some(first) = rows.get(0) {
            if first.len() < width {
                let padded = padded_to(first, width);
                rows.set(0, padded);
            }
        }

        Matrix { rows }
    }

    /// Gets the value at the coordinate, or `None` for absent cells and
    /// out-of-range reads. Never fails.
    pub fn get(&self, coord: &Coordinate) -> Option<&T> {
        self.rows.get(coord.row())?.get(coord.col())?.as_ref()
    }

    /// Whether the coordinate exists in the matrix. Defined relative to
    /// row 0's width, not the physical length of the addressed row.
    pub fn has(&self, coord: &Coordinate) -> bool {
        coord.row() < self.rows.len() && coord.col() < self.columns_count()
    }

    pub fn size(&self) -> Size {
        Size {
            rows: self.rows.len(),
            columns: self.columns_count(),
        }
    }

    pub fn rows_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns_count(&self) -> usize {
        self.rows.get(0).map_or(0, Vector::len)
    }

    /// Sets the value at the coordinate, returning a new matrix. Rows
    /// not touched by the write are shared with `self`. Missing row
    /// slots up to the coordinate are created, and row 0 is widened
    /// when the write extends the column count.
    pub fn set(&self, coord: Coordinate, value: T) -> Matrix<T> {
        let mut rows = self.rows.clone();
        ensure_row_slots(&mut rows, coord.row() + 1);

        let width_needed = coord.col() + 1;
        let first = rows.get(0).expect("row slots were just ensured");
        if first.len() < width_needed {
            let widened = padded_to(first, width_needed);
            rows.set(0, widened);
        }

        let mut row = padded_to(
            rows.get(coord.row()).expect("row slots were just ensured"),
            coord.col() + 1,
        );
        row.set(coord.col(), Some(value));
        rows.set(coord.row(), row);

        Matrix { rows }
    }

    /// Applies a batch of writes in one pass. Each touched row is
    /// copied once regardless of how many of its columns change;
    /// untouched rows are shared with `self`. An empty batch returns
    /// the input unchanged.
    pub fn set_multiple(
        &self,
        entries: impl IntoIterator<Item = (Coordinate, T)>,
    ) -> Matrix<T> {
        let mut changes: HashMap<usize, Vec<(usize, T)>> = HashMap::new();
        let mut rows_needed = self.rows.len();
        let mut width_needed = self.columns_count();

        for (coord, value) in entries {
            rows_needed = rows_needed.max(coord.row() + 1);
            width_needed = width_needed.max(coord.col() + 1);
            changes
                .entry(coord.row())
                .or_default()
                .push((coord.col(), value));
        }

        if changes.is_empty() {
            return self.clone();
        }

        let mut rows = self.rows.clone();
        ensure_row_slots(&mut rows, rows_needed);

        for (row_index, row_changes) in changes {
            let len_needed = row_changes
                .iter()
                .map(|(col, _)| col + 1)
                .max()
                .unwrap_or(0);

            let mut row = padded_to(
                rows.get(row_index).expect("row slots were just ensured"),
                len_needed,
            );
            for (col, value) in row_changes {
                row.set(col, Some(value));
            }
            rows.set(row_index, row);
        }

        let first = rows.get(0).expect("row slots were just ensured");
        if first.len() < width_needed {
            let widened = padded_to(first, width_needed);
            rows.set(0, widened);
        }

        Matrix { rows }
    }

    /// Clears the coordinate, returning a new matrix. Clearing an
    /// absent cell returns the input unchanged. Row lengths are
    /// preserved so the column count never shrinks.
    pub fn unset(&self, coord: &Coordinate) -> Matrix<T> {
        let occupied = self.get(coord).is_some();
        if !self.has(coord) || !occupied {
            return self.clone();
        }

        let mut rows = self.rows.clone();
        let mut row = rows.get(coord.row()).cloned().unwrap_or_default();
        row.set(coord.col(), None);
        rows.set(coord.row(), row);

        Matrix { rows }
    }

    /// The inclusive sub-rectangle between the two coordinates.
    pub fn slice(
        &self,
        start: &Coordinate,
        end: &Coordinate,
    ) -> Result<Matrix<T>, StorageErrorKind> {
        if start.row() > end.row() || start.col() > end.col() {
            return Err(StorageErrorKind::InvalidParameter);
        }

        let rows = (start.row()..=end.row())
            .map(|row| {
                (start.col()..=end.col())
                    .map(|col| self.get(&Coordinate::new(row, col)).cloned())
                    .collect::<Vector<Option<T>>>()
            })
            .collect();

        Ok(Matrix { rows })
    }

    /// Runs every position within the matrix's logical size through
    /// `func`, producing a matrix of the same size.
    pub fn map<U, F>(&self, func: F) -> Matrix<U>
    where
        U: Clone,
        F: Fn(Option<&T>, Coordinate) -> Option<U>,
    {
        let Size { rows, columns } = self.size();

        let mapped = (0..rows)
            .map(|row| {
                (0..columns)
                    .map(|col| {
                        let coord = Coordinate::new(row, col);
                        func(self.get(&coord), coord)
                    })
                    .collect::<Vector<Option<U>>>()
            })
            .collect();

        Matrix { rows: mapped }
    }

    /// Iterates the occupied cells in row-major order. Each call
    /// returns a fresh, finite iterator.
    pub fn entries(&self) -> impl Iterator<Item = (Coordinate, &T)> {
        self.rows.iter().enumerate().flat_map(|(row, values)| {
            values.iter().enumerate().filter_map(move |(col, value)| {
                value.as_ref().map(|value| (Coordinate::new(row, col), value))
            })
        })
    }

    /// Grows the matrix to at least the given size. Never shrinks; a
    /// matrix already large enough is returned unchanged. Column growth
    /// lands on row 0, so a matrix left with zero rows stays empty.
    pub fn pad(&self, target: Size) -> Matrix<T> {
        let current = self.size();
        if current.rows >= target.rows && current.columns >= target.columns {
            return self.clone();
        }

        let columns = current.columns.max(target.columns);
        let mut rows = self.rows.clone();

        if columns > current.columns {
            if let Some(first) = rows.get(0) {
                let widened = padded_to(first, columns);
                rows.set(0, widened);
            }
        }

        while rows.len() < target.rows {
            rows.push_back(empty_row(columns));
        }

        Matrix { rows }
    }
}

impl<T: Clone + Display> Matrix<T> {
    /// Joins every cell within the logical size into one string, rows
    /// separated by `vertical_separator`, cells by
    /// `horizontal_separator`. Empty cells render as the empty string.
    pub fn join(&self, horizontal_separator: &str, vertical_separator: &str) -> String {
        let Size { rows, columns } = self.size();
        if rows == 0 || columns == 0 {
            return String::new();
        }

        (0..rows)
            .map(|row| {
                (0..columns)
                    .map(|col| {
                        self.get(&Coordinate::new(row, col))
                            .map_or_else(String::new, ToString::to_string)
                    })
                    .collect::<Vec<_>>()
                    .join(horizontal_separator)
            })
            .collect::<Vec<_>>()
            .join(vertical_separator)
    }
}

impl<T: Clone> Matrix<T> {
    /// Parses separator-delimited text into a matrix, one row per line.
    ///
    /// Quoted fields are atomic: a separator or line break inside
    /// double quotes belongs to the field, and a doubled quote inside a
    /// quoted field is an escaped quote. Every field, including empty
    /// ones, runs through `transform`.
    pub fn split<F>(input: &str, horizontal_separator: char, transform: F) -> Matrix<T>
    where
        F: Fn(&str) -> T,
    {
        let mut rows: Vec<Vec<Option<T>>> = Vec::new();
        let mut current_row: Vec<Option<T>> = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;

        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        field.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    field.push(c);
                }
                continue;
            }

            match c {
                '"' => in_quotes = true,
                '\r' | '\n' => {
                    if c == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    current_row.push(Some(transform(&field)));
                    field.clear();
                    rows.push(std::mem::take(&mut current_row));
                }
                c if c == horizontal_separator => {
                    current_row.push(Some(transform(&field)));
                    field.clear();
                }
                _ => field.push(c),
            }
        }

        current_row.push(Some(transform(&field)));
        rows.push(current_row);

        Matrix::from_rows(rows)
    }
}

fn empty_row<T: Clone>(columns: usize) -> Vector<Option<T>> {
    std::iter::repeat_with(|| None).take(columns).collect()
}

fn padded_to<T: Clone>(row: &Vector<Option<T>>, len: usize) -> Vector<Option<T>> {
    let mut row = row.clone();
    while row.len() < len {
        row.push_back(None);
    }
    row
}

fn ensure_row_slots<T: Clone>(rows: &mut Vector<Vector<Option<T>>>, len: usize) {
    while rows.len() < len {
        rows.push_back(Vector::new());
    }
}
