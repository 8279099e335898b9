//! The storage layer for `recalc`.
//!
//! Provides the value types the engine computes over: grid coordinates,
//! immutable coordinate sets, the persistent sparse matrix, and the cell
//! record that flows through the raw and evaluated snapshots.
//!
//! Everything here is a value. Updating a set or a matrix returns a new
//! instance; the previous one is untouched and keeps sharing whatever
//! substructure the update did not reach.

pub mod location;

mod cell;
mod coordinate_set;
mod matrix;

pub use crate::cell::*;
pub use crate::location::Coordinate;
pub use crate::coordinate_set::*;
pub use crate::matrix::*;

use thiserror::Error;

/// The error types that storage operations can result in.
///
/// Read paths are total (`get`/`has` answer `None`/`false` instead of
/// failing); only operations handed structurally impossible arguments
/// report an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageErrorKind {
    #[error("Invalid Parameter")]
    InvalidParameter,
}
