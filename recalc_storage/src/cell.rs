use std::fmt;
use std::fmt::{Display, Formatter};

/// The marker character that makes a string value a formula.
pub const FORMULA_MARKER: char = '=';

/// Error values resulting from evaluating a formula.
///
/// These circulate through the evaluated matrix as ordinary values; the
/// engine never raises them as failures.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalErrorVal {
    /// The cell participates in, or transitively depends on, a circular
    /// reference.
    CyclicDependency,
    /// The collaborator failed to compute the formula (undefined
    /// function, bad argument, unresolvable reference, ...).
    Invalid,
}

/// The value stored in every cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Blank,
    Bool(bool),
    Number(f64),
    String(Box<str>),
    EvalError(EvalErrorVal),
}

impl Default for Value {
    fn default() -> Self {
        Value::Blank
    }
}

impl Value {
    /// Whether this value is a formula source string. True iff it is a
    /// string beginning with [`FORMULA_MARKER`].
    pub fn is_formula(&self) -> bool {
        matches!(self, Value::String(s) if s.starts_with(FORMULA_MARKER))
    }

    /// The formula source with the leading marker stripped, or `None`
    /// for non-formula values.
    pub fn formula_source(&self) -> Option<&str> {
        match self {
            Value::String(s) => s.strip_prefix(FORMULA_MARKER),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Blank => Ok(()),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::EvalError(EvalErrorVal::CyclicDependency) => write!(f, "#REF!"),
            Value::EvalError(EvalErrorVal::Invalid) => write!(f, "#ERROR!"),
        }
    }
}

/// A typical cell in the grid: a value (literal or formula source)
/// plus whatever rendering metadata the surrounding layer attaches.
/// The engine reads only the value.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Cell {
    value: Value,
}

impl Cell {
    pub fn with_value(value: Value) -> Cell {
        Cell { value }
    }

    /// Convenience constructor mirroring how raw user input arrives: a
    /// plain string that may or may not carry the formula marker.
    pub fn with_fact(fact: impl Into<String>) -> Cell {
        Cell {
            value: Value::String(fact.into().into_boxed_str()),
        }
    }

    pub fn new_blank() -> Cell {
        Cell::default()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_formula(&self) -> bool {
        self.value.is_formula()
    }

    /// Marker-stripped formula source, or `None` for literal cells.
    pub fn formula_source(&self) -> Option<&str> {
        if self.value.is_formula() {
            self.value.formula_source()
        } else {
            None
        }
    }

    /// Returns a copy of this cell carrying `value` instead, leaving
    /// any metadata intact.
    pub fn replacing_value(&self, value: Value) -> Cell {
        let mut next = self.clone();
        next.value = value;
        next
    }
}
