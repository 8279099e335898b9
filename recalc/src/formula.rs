//! The seam between the engine and the external formula collaborator.
//!
//! The engine does not know any formula grammar. It hands a
//! marker-stripped formula source plus the target coordinate to an
//! evaluator bound to a raw-data snapshot, and gets back either the
//! referenced coordinates or a computed value. Every evaluation failure
//! is caught at the call site and stored as an error value; nothing
//! here propagates to the engine's public contract.

use crate::storage::{Cell, Coordinate, CoordinateSet, Matrix, Value};

use thiserror::Error;

/// The error types that can result from evaluating a formula.
///
/// The engine converts all of these into
/// [`Value::EvalError`](crate::storage::Value) markers; they exist so
/// collaborator implementations can report failures precisely.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalErrorKind {
    #[error("Parse Error")]
    ParseError,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid reference")]
    InvalidReference,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// A formula evaluator bound to one raw-data snapshot.
pub trait FormulaEvaluator {
    /// The coordinates the formula reads. A formula that fails to parse
    /// degrades to the empty set rather than an error.
    fn references(&self, formula: &str, at: &Coordinate) -> CoordinateSet;

    /// The computed value of the formula at the coordinate, resolved
    /// against the bound snapshot.
    fn evaluate(&self, formula: &str, at: &Coordinate) -> Result<Value, EvalErrorKind>;
}

/// Produces evaluators bound to a given raw-data snapshot.
///
/// Implementations typically clone the matrix into the evaluator;
/// snapshots are persistent, so the clone is an O(1) handle copy.
pub trait EvaluatorFactory {
    fn bind(&self, data: &Matrix<Cell>) -> Box<dyn FormulaEvaluator>;
}
