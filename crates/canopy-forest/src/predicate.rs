//! Field/operator/constant comparisons and their evaluation.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ForestError;
use crate::record::Record;

/// Comparison operator of a simple predicate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub enum Operator {
    /// `value > constant`
    GreaterThan,
    /// `value <= constant`
    LessOrEqual,
}

impl Operator {
    /// Parse an operator from its model-document name.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::UnsupportedOperator`] for any name other than
    /// `greaterThan` or `lessOrEqual`.
    pub fn parse(name: &str, field: &str) -> Result<Self, ForestError> {
        match name {
            "greaterThan" => Ok(Self::GreaterThan),
            "lessOrEqual" => Ok(Self::LessOrEqual),
            other => Err(ForestError::UnsupportedOperator {
                operator: other.to_string(),
                field: field.to_string(),
            }),
        }
    }

    /// Apply the comparison with IEEE semantics (any NaN yields `false`).
    #[must_use]
    pub fn apply(self, value: f64, constant: f64) -> bool {
        match self {
            Self::GreaterThan => value > constant,
            Self::LessOrEqual => value <= constant,
        }
    }

    /// Return the infix symbol used when printing expressions.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessOrEqual => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An immutable `field operator constant` comparison.
///
/// Equality and hashing are structural; the constant is compared by its bit
/// pattern so the type can key a hash map.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PredicateExpr {
    field: String,
    operator: Operator,
    constant: f64,
}

impl PredicateExpr {
    /// Create a new comparison expression.
    pub fn new(field: impl Into<String>, operator: Operator, constant: f64) -> Self {
        Self {
            field: field.into(),
            operator,
            constant,
        }
    }

    /// Return the compared field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Return the comparison operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Return the threshold constant.
    #[must_use]
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Evaluate the comparison against a record.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::MissingField`] when the record has no value
    /// for [`field`](Self::field).
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> Result<bool, ForestError> {
        let value = record
            .field(&self.field)
            .ok_or_else(|| ForestError::MissingField {
                field: self.field.clone(),
            })?;
        Ok(self.operator.apply(value, self.constant))
    }
}

impl PartialEq for PredicateExpr {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.operator == other.operator
            && self.constant.to_bits() == other.constant.to_bits()
    }
}

impl Eq for PredicateExpr {}

impl Hash for PredicateExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.operator.hash(state);
        self.constant.to_bits().hash(state);
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.constant)
    }
}
