#![allow(dead_code)]

use recalc::engine::Model;
use recalc::formula::{EvalErrorKind, EvaluatorFactory, FormulaEvaluator};
use recalc::storage::{Cell, Coordinate, CoordinateSet, Matrix, Value};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Deep enough for the longest dependent chains the tests build.
const MAX_RESOLVE_DEPTH: usize = 256;

/// A small arithmetic collaborator for tests. Formulas are chains of
/// terms joined by `+ - * /`, evaluated left to right; a term is an
/// A1-style reference or a numeric literal. References to formula cells
/// resolve recursively against the bound snapshot.
pub struct ArithmeticFactory;

impl EvaluatorFactory for ArithmeticFactory {
    fn bind(&self, data: &Matrix<Cell>) -> Box<dyn FormulaEvaluator> {
        Box::new(ArithmeticEvaluator { data: data.clone() })
    }
}

/// Same arithmetic collaborator, but counts every `evaluate` call so
/// tests can assert how many cells an operation actually recomputed.
pub struct CountingFactory {
    pub evaluations: Arc<AtomicUsize>,
}

impl EvaluatorFactory for CountingFactory {
    fn bind(&self, data: &Matrix<Cell>) -> Box<dyn FormulaEvaluator> {
        Box::new(CountingEvaluator {
            inner: ArithmeticEvaluator { data: data.clone() },
            evaluations: Arc::clone(&self.evaluations),
        })
    }
}

struct CountingEvaluator {
    inner: ArithmeticEvaluator,
    evaluations: Arc<AtomicUsize>,
}

impl FormulaEvaluator for CountingEvaluator {
    fn references(&self, formula: &str, at: &Coordinate) -> CoordinateSet {
        self.inner.references(formula, at)
    }

    fn evaluate(&self, formula: &str, at: &Coordinate) -> Result<Value, EvalErrorKind> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.inner.evaluate(formula, at)
    }
}

/// Builds the raw cell matrix from rows of string facts, the way user
/// input arrives: `"10"` is a literal, `"=A1*2"` a formula, `None` an
/// empty cell.
pub fn facts_matrix(rows: Vec<Vec<Option<&str>>>) -> Matrix<Cell> {
    Matrix::from_rows(
        rows.into_iter()
            .map(|row| row.into_iter().map(|fact| fact.map(Cell::with_fact)).collect()),
    )
}

pub fn model_from_facts(rows: Vec<Vec<Option<&str>>>) -> Model {
    Model::new(Arc::new(ArithmeticFactory), facts_matrix(rows))
}

pub fn coord(row: usize, col: usize) -> Coordinate {
    Coordinate::new(row, col)
}

pub fn evaluated_value(model: &Model, row: usize, col: usize) -> Value {
    model
        .evaluated_data()
        .get(&coord(row, col))
        .map_or(Value::Blank, |cell| cell.value().clone())
}

struct ArithmeticEvaluator {
    data: Matrix<Cell>,
}

enum Term {
    Reference(Coordinate),
    Literal(f64),
}

impl FormulaEvaluator for ArithmeticEvaluator {
    fn references(&self, formula: &str, _at: &Coordinate) -> CoordinateSet {
        match parse_terms(formula) {
            Ok((terms, _)) => terms
                .into_iter()
                .filter_map(|term| match term {
                    Term::Reference(coord) => Some(coord),
                    Term::Literal(_) => None,
                })
                .collect(),
            Err(_) => CoordinateSet::new(),
        }
    }

    fn evaluate(&self, formula: &str, _at: &Coordinate) -> Result<Value, EvalErrorKind> {
        self.eval_formula(formula, 0).map(Value::Number)
    }
}

impl ArithmeticEvaluator {
    fn eval_formula(&self, formula: &str, depth: usize) -> Result<f64, EvalErrorKind> {
        if depth > MAX_RESOLVE_DEPTH {
            return Err(EvalErrorKind::InvalidReference);
        }

        let (terms, operators) = parse_terms(formula)?;
        let mut values = terms.into_iter().map(|term| match term {
            Term::Literal(number) => Ok(number),
            Term::Reference(coord) => self.resolve(&coord, depth),
        });

        let mut accumulator = values.next().expect("parse_terms yields at least one term")?;
        for (operator, value) in operators.into_iter().zip(values) {
            let value = value?;
            accumulator = match operator {
                '+' => accumulator + value,
                '-' => accumulator - value,
                '*' => accumulator * value,
                '/' => {
                    if value == 0.0 {
                        return Err(EvalErrorKind::InvalidArgument("division by zero".into()));
                    }
                    accumulator / value
                }
                _ => unreachable!("parse_terms only emits known operators"),
            };
        }

        Ok(accumulator)
    }

    fn resolve(&self, coord: &Coordinate, depth: usize) -> Result<f64, EvalErrorKind> {
        let Some(cell) = self.data.get(coord) else {
            return Ok(0.0);
        };

        match cell.formula_source() {
            Some(source) => self.eval_formula(source, depth + 1),
            None => match cell.value() {
                Value::Number(number) => Ok(*number),
                Value::Blank => Ok(0.0),
                Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
                Value::String(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| EvalErrorKind::InvalidArgument(s.to_string())),
                Value::EvalError(_) => Err(EvalErrorKind::InvalidReference),
            },
        }
    }
}

fn parse_terms(formula: &str) -> Result<(Vec<Term>, Vec<char>), EvalErrorKind> {
    let mut terms = Vec::new();
    let mut operators = Vec::new();
    let mut current = String::new();

    for c in formula.chars() {
        match c {
            '+' | '-' | '*' | '/' => {
                terms.push(parse_term(current.trim())?);
                operators.push(c);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    terms.push(parse_term(current.trim())?);

    Ok((terms, operators))
}

fn parse_term(term: &str) -> Result<Term, EvalErrorKind> {
    if let Ok(number) = term.parse::<f64>() {
        return Ok(Term::Literal(number));
    }

    parse_reference(term)
        .map(Term::Reference)
        .ok_or(EvalErrorKind::ParseError)
}

/// Parses an A1-style reference: letters are the column (A = 0),
/// digits the 1-based row.
pub fn parse_reference(term: &str) -> Option<Coordinate> {
    let first_digit = term.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = term.split_at(first_digit);

    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }

    let col = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c as usize - 'A' as usize + 1))
        - 1;
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some(Coordinate::new(row - 1, col))
}
