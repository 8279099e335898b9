use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use recalc::engine::Model;
use recalc::formula::{EvalErrorKind, EvaluatorFactory, FormulaEvaluator};
use recalc::storage::{Cell, Coordinate, CoordinateSet, Matrix, Value};

// Single-reference formulas ("=row,col") exercise the dependency
// plumbing without dragging a real parser into the measurement.
struct RefEvaluator {
    data: Matrix<Cell>,
}

struct RefFactory;

fn parse(formula: &str) -> Option<Coordinate> {
    let (row, col) = formula.split_once(',')?;
    Some(Coordinate::new(row.parse().ok()?, col.parse().ok()?))
}

impl FormulaEvaluator for RefEvaluator {
    fn references(&self, formula: &str, _at: &Coordinate) -> CoordinateSet {
        parse(formula).into_iter().collect()
    }

    fn evaluate(&self, formula: &str, _at: &Coordinate) -> Result<Value, EvalErrorKind> {
        let mut target = parse(formula).ok_or(EvalErrorKind::ParseError)?;
        for _ in 0..1_000_000 {
            match self.data.get(&target) {
                None => return Ok(Value::Blank),
                Some(cell) => match cell.formula_source() {
                    Some(source) => target = parse(source).ok_or(EvalErrorKind::ParseError)?,
                    None => return Ok(cell.value().clone()),
                },
            }
        }
        Err(EvalErrorKind::InvalidReference)
    }
}

impl EvaluatorFactory for RefFactory {
    fn bind(&self, data: &Matrix<Cell>) -> Box<dyn FormulaEvaluator> {
        Box::new(RefEvaluator { data: data.clone() })
    }
}

fn chain_model(length: usize) -> Model {
    let mut rows = vec![vec![Some(Cell::with_value(Value::Number(1.0)))]];
    for row in 1..length {
        rows.push(vec![Some(Cell::with_fact(format!("={},0", row - 1)))]);
    }

    Model::new(Arc::new(RefFactory), Matrix::from_rows(rows))
}

fn bench_update_cell_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("update-cell-value");
    for length in [100usize, 1_000] {
        let model = chain_model(length);
        group.bench_with_input(BenchmarkId::from_parameter(length), &model, |b, model| {
            b.iter(|| {
                black_box(model.update_cell_value(
                    Coordinate::new(0, 0),
                    Cell::with_value(Value::Number(2.0)),
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update_cell_value);
criterion_main!(benches);
