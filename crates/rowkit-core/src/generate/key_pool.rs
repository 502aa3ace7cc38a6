//! # Inserted Key Pool
//!
//! Tracks the database-assigned primary keys of every row inserted during a
//! run, per table, in insertion order. The pool serves two purposes: child
//! tables sample parent keys from it when filling relation columns, and at
//! the end of a run it becomes the `inserted_rows` section of the ledger
//! entry.

use indexmap::IndexMap;
use rand::Rng;

/// Per-table lists of generated primary keys, in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct KeyPool {
    pools: IndexMap<String, Vec<u64>>,
}

impl KeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table so it appears in the pool even before its first key.
    pub fn start_table(&mut self, table_name: &str) {
        self.pools.entry(table_name.to_string()).or_default();
    }

    /// Record a generated key for a table.
    pub fn record_key(&mut self, table_name: &str, key: u64) {
        self.pools
            .entry(table_name.to_string())
            .or_default()
            .push(key);
    }

    /// Pick a uniformly random key previously recorded for `table_name`.
    pub fn pick_reference(&self, table_name: &str, rng: &mut impl Rng) -> Option<u64> {
        self.pools.get(table_name).and_then(|pool| {
            if pool.is_empty() {
                None
            } else {
                Some(pool[rng.random_range(0..pool.len())])
            }
        })
    }

    pub fn pool_size(&self, table_name: &str) -> usize {
        self.pools.get(table_name).map(|p| p.len()).unwrap_or(0)
    }

    pub fn keys(&self, table_name: &str) -> Option<&[u64]> {
        self.pools.get(table_name).map(|v| v.as_slice())
    }

    pub fn total_keys(&self) -> usize {
        self.pools.values().map(|p| p.len()).sum()
    }

    /// Table names in the order they were first registered.
    pub fn table_names(&self) -> Vec<String> {
        self.pools.keys().cloned().collect()
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<u64>> {
        self.pools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_record_and_pick() {
        let mut pool = KeyPool::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        pool.record_key("users", 1);
        pool.record_key("users", 2);
        pool.record_key("users", 3);

        for _ in 0..20 {
            let picked = pool.pick_reference("users", &mut rng).unwrap();
            assert!((1..=3).contains(&picked));
        }
        assert_eq!(pool.pool_size("users"), 3);
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = KeyPool::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        assert!(pool.pick_reference("users", &mut rng).is_none());
        pool.start_table("users");
        assert!(pool.pick_reference("users", &mut rng).is_none());
        assert_eq!(pool.keys("users"), Some(&[][..]));
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut pool = KeyPool::new();
        pool.start_table("users");
        pool.record_key("orders", 10);
        pool.record_key("users", 1);
        pool.record_key("orders", 11);

        assert_eq!(pool.table_names(), vec!["users", "orders"]);
        assert_eq!(pool.total_keys(), 3);

        let inner = pool.into_inner();
        assert_eq!(inner["orders"], vec![10, 11]);
    }
}
