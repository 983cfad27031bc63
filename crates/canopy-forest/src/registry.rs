//! Deduplicated, id-assigning pool of predicates shared by every tree.

use std::collections::{BTreeSet, HashMap};

use crate::error::ForestError;
use crate::node::PredicateId;
use crate::predicate::PredicateExpr;
use crate::record::Record;

/// Insertion-ordered set of [`PredicateExpr`] values keyed by [`PredicateId`].
///
/// Ids are handed out in first-seen order starting at 0 and are never
/// reused. There is no removal; once the forest is built the registry is only
/// reachable through a shared reference.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<PredicateExpr>", into = "Vec<PredicateExpr>")]
pub struct PredicateRegistry {
    exprs: Vec<PredicateExpr>,
    index: HashMap<PredicateExpr, PredicateId>,
}

impl PredicateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `expr`, registering it first if it is new.
    pub fn intern(&mut self, expr: PredicateExpr) -> PredicateId {
        if let Some(&id) = self.index.get(&expr) {
            return id;
        }
        let id = PredicateId::new(self.exprs.len());
        self.exprs.push(expr.clone());
        self.index.insert(expr, id);
        id
    }

    /// Return the number of registered predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Return `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Look up a predicate by id.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::UnknownPredicateId`] if `id` is out of range.
    pub fn get(&self, id: PredicateId) -> Result<&PredicateExpr, ForestError> {
        self.exprs
            .get(id.index())
            .ok_or(ForestError::UnknownPredicateId {
                id: id.index(),
                len: self.exprs.len(),
            })
    }

    /// Return `true` if `id` resolves in this registry.
    #[must_use]
    pub fn contains(&self, id: PredicateId) -> bool {
        id.index() < self.exprs.len()
    }

    /// Iterate over `(id, expr)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PredicateId, &PredicateExpr)> {
        self.exprs
            .iter()
            .enumerate()
            .map(|(i, e)| (PredicateId::new(i), e))
    }

    /// Return the distinct field names referenced by any predicate.
    #[must_use]
    pub fn fields(&self) -> BTreeSet<&str> {
        self.exprs.iter().map(PredicateExpr::field).collect()
    }

    /// Evaluate every predicate against `record`, indexed by id.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::MissingField`] for the first predicate whose
    /// field the record lacks.
    pub fn evaluate_all<R: Record + ?Sized>(&self, record: &R) -> Result<Vec<bool>, ForestError> {
        self.exprs.iter().map(|e| e.evaluate(record)).collect()
    }
}

impl TryFrom<Vec<PredicateExpr>> for PredicateRegistry {
    type Error = ForestError;

    /// Rebuild a registry from its id-ordered list, keeping every id.
    fn try_from(exprs: Vec<PredicateExpr>) -> Result<Self, Self::Error> {
        let mut registry = Self::new();
        for (i, expr) in exprs.into_iter().enumerate() {
            let id = registry.intern(expr);
            if id.index() != i {
                return Err(ForestError::DuplicatePredicate {
                    first: id.index(),
                    duplicate: i,
                });
            }
        }
        Ok(registry)
    }
}

impl From<PredicateRegistry> for Vec<PredicateExpr> {
    fn from(registry: PredicateRegistry) -> Self {
        registry.exprs
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::predicate::Operator;

    fn gt(field: &str, c: f64) -> PredicateExpr {
        PredicateExpr::new(field, Operator::GreaterThan, c)
    }

    #[test]
    fn intern_is_idempotent() {
        let mut reg = PredicateRegistry::new();
        let a = reg.intern(gt("field1", 5.0));
        let b = reg.intern(gt("field1", 5.0));
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn distinct_exprs_get_sequential_ids() {
        let mut reg = PredicateRegistry::new();
        let ids: Vec<usize> = (0..5)
            .map(|i| reg.intern(gt("x", i as f64)).index())
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        // Re-interning an early expression does not disturb later ids.
        assert_eq!(reg.intern(gt("x", 1.0)).index(), 1);
        assert_eq!(reg.len(), 5);
    }

    #[test]
    fn get_out_of_range() {
        let reg = PredicateRegistry::new();
        let err = reg.get(PredicateId::new(3)).unwrap_err();
        assert!(matches!(
            err,
            ForestError::UnknownPredicateId { id: 3, len: 0 }
        ));
    }

    #[test]
    fn fields_are_deduplicated() {
        let mut reg = PredicateRegistry::new();
        reg.intern(gt("b", 1.0));
        reg.intern(gt("a", 1.0));
        reg.intern(PredicateExpr::new("b", Operator::LessOrEqual, 1.0));
        let fields: Vec<&str> = reg.fields().into_iter().collect();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn evaluate_all_follows_id_order() {
        let mut reg = PredicateRegistry::new();
        reg.intern(gt("x", 5.0));
        reg.intern(PredicateExpr::new("x", Operator::LessOrEqual, 5.0));
        let rec: HashMap<String, f64> = [("x".to_string(), 7.0)].into_iter().collect();
        assert_eq!(reg.evaluate_all(&rec).unwrap(), vec![true, false]);
    }

    #[test]
    fn serde_rebuilds_index() {
        let mut reg = PredicateRegistry::new();
        reg.intern(gt("x", 1.0));
        reg.intern(gt("y", 2.0));
        let json = serde_json::to_string(&reg).unwrap();
        let mut restored: PredicateRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.intern(gt("y", 2.0)).index(), 1);
    }

    #[test]
    fn decoding_rejects_repeated_predicate() {
        let exprs = vec![gt("x", 1.0), gt("y", 2.0), gt("x", 1.0)];
        let json = serde_json::to_string(&exprs).unwrap();
        let err = serde_json::from_str::<PredicateRegistry>(&json).unwrap_err();
        assert!(err.to_string().contains("predicate 2 repeats predicate 0"));

        match PredicateRegistry::try_from(exprs) {
            Err(ForestError::DuplicatePredicate { first, duplicate }) => {
                assert_eq!((first, duplicate), (0, 2));
            }
            other => panic!("expected DuplicatePredicate, got {other:?}"),
        }
    }
}
