//! The evaluation engine: builds the dependency graph from raw cell
//! data, computes the initial evaluated snapshot in dependency order,
//! and recomputes the minimal affected set on each edit.

use crate::dependency::DependencyGraph;
use crate::formula::{EvaluatorFactory, FormulaEvaluator};
use crate::storage::{Cell, Coordinate, CoordinateSet, EvalErrorVal, Matrix, Value};

use std::collections::HashSet;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The aggregate state of a grid: the raw data matrix, the evaluated
/// data matrix, the dependency graph between formula cells, and the
/// factory that binds the formula collaborator to raw-data snapshots.
///
/// A `Model` is immutable. [`update_cell_value`](Model::update_cell_value)
/// produces a new `Model` that shares every row, set, and edge the edit
/// did not touch. Callers serialize edits: apply one, take the new
/// `Model`, apply the next.
#[derive(Clone)]
pub struct Model {
    data: Matrix<Cell>,
    evaluated_data: Matrix<Cell>,
    reference_graph: DependencyGraph,
    evaluator_factory: Arc<dyn EvaluatorFactory>,
}

impl Debug for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("data", &self.data)
            .field("evaluated_data", &self.evaluated_data)
            .field("reference_graph", &self.reference_graph)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Builds a model from raw cell data: scans every formula cell for
    /// its references, then computes the initial evaluated snapshot in
    /// leaves-first dependency order.
    pub fn new(evaluator_factory: Arc<dyn EvaluatorFactory>, data: Matrix<Cell>) -> Model {
        let reference_graph = build_reference_graph(&data, evaluator_factory.as_ref());
        let evaluated_data =
            build_evaluated_data(&data, &reference_graph, evaluator_factory.as_ref());

        Model {
            data,
            evaluated_data,
            reference_graph,
            evaluator_factory,
        }
    }

    pub fn data(&self) -> &Matrix<Cell> {
        &self.data
    }

    pub fn evaluated_data(&self) -> &Matrix<Cell> {
        &self.evaluated_data
    }

    pub fn reference_graph(&self) -> &DependencyGraph {
        &self.reference_graph
    }

    /// Applies one cell edit, recomputing only the affected cells.
    /// Total: reference and evaluation failures surface as error values
    /// in the evaluated matrix, never as a failed update.
    pub fn update_cell_value(&self, coord: Coordinate, cell: Cell) -> Model {
        let next_data = self.data.set(coord, cell.clone());

        // A formula edit rewires this coordinate's forward edges; any
        // other edit reuses the graph snapshot as-is.
        let next_graph = match cell.formula_source() {
            Some(source) => {
                let evaluator = self.evaluator_factory.bind(&next_data);
                let references = evaluator.references(source, &coord);
                self.reference_graph.set(coord, references)
            }
            None => self.reference_graph.clone(),
        };

        let evaluator = self.evaluator_factory.bind(&next_data);
        let next_evaluated = evaluate_cell(
            &self.evaluated_data,
            &next_data,
            &next_graph,
            &coord,
            &cell,
            evaluator.as_ref(),
        );

        Model {
            data: next_data,
            evaluated_data: next_evaluated,
            reference_graph: next_graph,
            evaluator_factory: Arc::clone(&self.evaluator_factory),
        }
    }
}

/// Scans every cell of `data` and stores a forward edge for each
/// formula cell.
fn build_reference_graph(data: &Matrix<Cell>, factory: &dyn EvaluatorFactory) -> DependencyGraph {
    let evaluator = factory.bind(data);

    DependencyGraph::from(data.entries().filter_map(|(coord, cell)| {
        cell.formula_source()
            .map(|source| (coord, evaluator.references(source, &coord)))
    }))
}

/// Walks the graph leaves-first and evaluates each formula cell against
/// a progressively-updated snapshot, so later formulas resolve to
/// just-computed results. With no formula cells the evaluated matrix is
/// the raw matrix itself.
fn build_evaluated_data(
    data: &Matrix<Cell>,
    graph: &DependencyGraph,
    factory: &dyn EvaluatorFactory,
) -> Matrix<Cell> {
    let mut formula_cells: Vec<(Coordinate, Cell)> = graph
        .traverse_bfs_backwards()
        .filter_map(|coord| {
            data.get(&coord)
                .filter(|cell| cell.is_formula())
                .map(|cell| (coord, cell.clone()))
        })
        .collect();

    // Formula cells with no references have no graph entry and never
    // surface in the traversal. They depend on nothing, so they can be
    // computed in any order after the walk. Cells with forward edges
    // that the traversal skipped are on a cycle and stay raw.
    let mut covered: HashSet<Coordinate> =
        formula_cells.iter().map(|(coord, _)| *coord).collect();
    for (coord, cell) in data.entries() {
        if cell.is_formula() && graph.get(&coord).is_empty() && covered.insert(coord) {
            formula_cells.push((coord, cell.clone()));
        }
    }

    if formula_cells.is_empty() {
        return data.clone();
    }

    let mut evaluated = data.clone();
    for (coord, cell) in formula_cells {
        // A fresh binding after each computed cell: evaluation is
        // pull-based against the current snapshot.
        let evaluator = factory.bind(&evaluated);
        let value = computed_value(&cell, &coord, evaluator.as_ref());
        evaluated = evaluated.set(coord, cell.replacing_value(value));
    }

    evaluated
}

/// Re-evaluates the edited cell and its transitive dependents, applying
/// the result to the evaluated matrix as one batched write.
fn evaluate_cell(
    prev_evaluated: &Matrix<Cell>,
    data: &Matrix<Cell>,
    graph: &DependencyGraph,
    coord: &Coordinate,
    cell: &Cell,
    evaluator: &dyn FormulaEvaluator,
) -> Matrix<Cell> {
    if graph.has_circular_dependency(coord) {
        let mut updates = vec![(
            *coord,
            cell.replacing_value(Value::EvalError(EvalErrorVal::CyclicDependency)),
        )];

        let mut processed = CoordinateSet::from(vec![*coord]);
        for referrer in &graph.get_backwards_recursive(coord) {
            // Skip an already-processed dependent and keep walking;
            // the remaining dependents still need their marker.
            if processed.has(referrer) {
                continue;
            }
            processed = processed.add(*referrer);

            let Some(referrer_cell) = data.get(referrer) else {
                continue;
            };
            updates.push((
                *referrer,
                referrer_cell.replacing_value(Value::EvalError(EvalErrorVal::CyclicDependency)),
            ));
        }

        return prev_evaluated.set_multiple(updates);
    }

    let mut updates = vec![(
        *coord,
        cell.replacing_value(computed_value(cell, coord, evaluator)),
    )];

    // Every dependent is re-read from the raw matrix and evaluated
    // against the same bound snapshot: one consistent raw-data view for
    // the whole update.
    for referrer in &graph.get_backwards_recursive(coord) {
        let Some(referrer_cell) = data.get(referrer) else {
            continue;
        };
        updates.push((
            *referrer,
            referrer_cell.replacing_value(computed_value(referrer_cell, referrer, evaluator)),
        ));
    }

    prev_evaluated.set_multiple(updates)
}

/// A formula cell's computed value, degrading any collaborator failure
/// to the invalid-value marker. Literal cells pass their value through.
fn computed_value(cell: &Cell, coord: &Coordinate, evaluator: &dyn FormulaEvaluator) -> Value {
    match cell.formula_source() {
        Some(source) => evaluator
            .evaluate(source, coord)
            .unwrap_or(Value::EvalError(EvalErrorVal::Invalid)),
        None => cell.value().clone(),
    }
}
