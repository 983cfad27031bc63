//! Name-keyed access to the numeric fields of an input record.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::ForestError;

/// A record whose numeric fields can be looked up by name.
pub trait Record {
    /// Return the value of `name`, or `None` if the record lacks it.
    fn field(&self, name: &str) -> Option<f64>;
}

impl<S: BuildHasher> Record for HashMap<String, f64, S> {
    fn field(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Record for BTreeMap<String, f64> {
    fn field(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<f64> {
        (**self).field(name)
    }
}

/// Ordered field names used to bind positional rows to names.
///
/// Binding is explicit and checks the row width, so a row can never be
/// silently read against a shifted column order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    fields: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Schema {
    /// Create a schema from field names in column order.
    ///
    /// If a name repeats, the first position wins.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut positions = HashMap::with_capacity(fields.len());
        for (i, name) in fields.iter().enumerate() {
            positions.entry(name.clone()).or_insert(i);
        }
        Self { fields, positions }
    }

    /// Return the field names in column order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Return the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Return `true` if the schema declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Return the column position of `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Bind a positional row to this schema.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::RowLengthMismatch`] when `row.len()` differs
    /// from the number of schema fields.
    pub fn bind<'a>(&'a self, row: &'a [f64]) -> Result<BoundRecord<'a>, ForestError> {
        if row.len() != self.fields.len() {
            return Err(ForestError::RowLengthMismatch {
                expected: self.fields.len(),
                got: row.len(),
            });
        }
        Ok(BoundRecord { schema: self, row })
    }
}

/// A positional row viewed through a [`Schema`].
#[derive(Debug, Clone, Copy)]
pub struct BoundRecord<'a> {
    schema: &'a Schema,
    row: &'a [f64],
}

impl Record for BoundRecord<'_> {
    fn field(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.row[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashmap_lookup() {
        let mut rec = HashMap::new();
        rec.insert("a".to_string(), 1.0);
        assert_eq!(rec.field("a"), Some(1.0));
        assert_eq!(rec.field("b"), None);
    }

    #[test]
    fn btreemap_lookup() {
        let rec: BTreeMap<String, f64> = [("a".to_string(), 2.5)].into_iter().collect();
        assert_eq!(Record::field(&rec, "a"), Some(2.5));
    }

    #[test]
    fn bind_resolves_by_position() {
        let schema = Schema::new(["x", "y", "z"]);
        let row = [1.0, 2.0, 3.0];
        let rec = schema.bind(&row).unwrap();
        assert_eq!(rec.field("y"), Some(2.0));
        assert_eq!(rec.field("w"), None);
    }

    #[test]
    fn bind_rejects_wrong_width() {
        let schema = Schema::new(["x", "y"]);
        let err = schema.bind(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::RowLengthMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn repeated_name_keeps_first_position() {
        let schema = Schema::new(["x", "x"]);
        assert_eq!(schema.position("x"), Some(0));
        assert_eq!(schema.len(), 2);
    }
}
