//! Value interning for effective statements
//!
//! Large model sets repeat small statements (`type string;`, `config
//! false;`) thousands of times. The interner hands out one shared `Arc` per
//! distinct value. It is safe to share between concurrent builds.

use crate::statement::EffectiveStatement;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Concurrent set of interned effective statements
#[derive(Debug, Default)]
pub struct StatementInterner {
    values: DashMap<Arc<EffectiveStatement>, ()>,
    hits: AtomicUsize,
}

impl StatementInterner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance equal to `statement`, inserting it first
    /// if this is the first occurrence
    pub fn intern(&self, statement: EffectiveStatement) -> Arc<EffectiveStatement> {
        match self.values.entry(Arc::new(statement)) {
            Entry::Occupied(existing) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Arc::clone(existing.key())
            }
            Entry::Vacant(slot) => {
                let shared = Arc::clone(slot.key());
                slot.insert(());
                shared
            }
        }
    }

    /// Number of distinct values held
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of `intern` calls answered with an existing value
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Argument;
    use crate::statement::EffectiveProperties;
    use std::thread;
    use yang_ir::Keyword;

    fn type_string() -> EffectiveStatement {
        EffectiveStatement {
            keyword: Keyword::new("type"),
            argument: Argument::Text("string".to_string()),
            declared: None,
            substatements: Vec::new(),
            properties: EffectiveProperties::default(),
        }
    }

    #[test]
    fn test_equal_values_share_instance() {
        let interner = StatementInterner::new();
        let a = interner.intern(type_string());
        let b = interner.intern(type_string());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);
        assert_eq!(interner.hits(), 1);
    }

    #[test]
    fn test_distinct_values_kept_apart() {
        let interner = StatementInterner::new();
        let mut other = type_string();
        other.argument = Argument::Text("uint8".to_string());

        let a = interner.intern(type_string());
        let b = interner.intern(other);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_shared_across_threads() {
        let interner = Arc::new(StatementInterner::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = Arc::clone(&interner);
                thread::spawn(move || interner.intern(type_string()))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(interner.len(), 1);
    }
}
