//! `recalc` is an embeddable grid-cell model: it tracks which cells
//! reference which other cells through formulas, detects circular
//! references, and incrementally recomputes only the cells affected by
//! an edit, in dependency order.
//!
//! The crate does not parse or evaluate formulas itself. A formula
//! collaborator (see [`formula`]) is bound to each raw-data snapshot
//! and asked for a formula's references and computed value. The
//! dependency graph, the persistent matrices, and the incremental
//! recompute all live here.
//!
//! A quick example with a minimal collaborator whose only formula shape
//! is `"row,col"`, a reference to one other cell:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use recalc::engine::Model;
//! use recalc::formula::{EvalErrorKind, EvaluatorFactory, FormulaEvaluator};
//! use recalc::storage::{Cell, Coordinate, CoordinateSet, Matrix, Value};
//!
//! struct RefEvaluator {
//!     data: Matrix<Cell>,
//! }
//!
//! fn parse(formula: &str) -> Option<Coordinate> {
//!     let (row, col) = formula.split_once(',')?;
//!     Some(Coordinate::new(
//!         row.trim().parse().ok()?,
//!         col.trim().parse().ok()?,
//!     ))
//! }
//!
//! impl FormulaEvaluator for RefEvaluator {
//!     fn references(&self, formula: &str, _at: &Coordinate) -> CoordinateSet {
//!         parse(formula).map_or_else(CoordinateSet::new, |coord| {
//!             CoordinateSet::from(vec![coord])
//!         })
//!     }
//!
//!     fn evaluate(&self, formula: &str, _at: &Coordinate) -> Result<Value, EvalErrorKind> {
//!         let coord = parse(formula).ok_or(EvalErrorKind::ParseError)?;
//!         Ok(self
//!             .data
//!             .get(&coord)
//!             .map_or(Value::Blank, |cell| cell.value().clone()))
//!     }
//! }
//!
//! struct RefFactory;
//!
//! impl EvaluatorFactory for RefFactory {
//!     fn bind(&self, data: &Matrix<Cell>) -> Box<dyn FormulaEvaluator> {
//!         // Snapshots are persistent; the clone is an O(1) handle copy.
//!         Box::new(RefEvaluator { data: data.clone() })
//!     }
//! }
//!
//! let data = Matrix::from_rows(vec![vec![
//!     Some(Cell::with_value(Value::Number(10.0))),
//!     Some(Cell::with_fact("=0,0")),
//! ]]);
//!
//! let model = Model::new(Arc::new(RefFactory), data);
//! assert_eq!(
//!     model
//!         .evaluated_data()
//!         .get(&Coordinate::new(0, 1))
//!         .unwrap()
//!         .value(),
//!     &Value::Number(10.0)
//! );
//!
//! // Edits produce a new model and recompute only the affected cells.
//! let model = model.update_cell_value(
//!     Coordinate::new(0, 0),
//!     Cell::with_value(Value::Number(42.0)),
//! );
//! assert_eq!(
//!     model
//!         .evaluated_data()
//!         .get(&Coordinate::new(0, 1))
//!         .unwrap()
//!         .value(),
//!     &Value::Number(42.0)
//! );
//! ```

pub mod dependency;
pub mod engine;
pub mod formula;

pub use recalc_storage as storage;
