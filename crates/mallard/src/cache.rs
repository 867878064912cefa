//! Proxy table cache: one materialized table per (contract, target type)
//! pair, for the life of the process that owns the engine.
//!
//! A plain lock-protected map is enough here: generation is pure,
//! allocation-only work that completes in microseconds, so a miss builds
//! outside the lock and inserts with first-insert-wins. Racing duplicate
//! builds are discarded — every caller observes the same stored table.
//! Failed builds are never cached. No eviction: the key space is bounded
//! by the distinct pairs the process ever exercises.

use crate::error::Result;
use crate::proxy::ProxyTable;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Cache key: (contract identity, concrete type identity).
pub type PairKey = (TypeId, TypeId);

#[derive(Default)]
pub struct ProxyCache {
    tables: Mutex<HashMap<PairKey, Arc<ProxyTable>>>,
}

impl ProxyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `key`, or run `build` and store its
    /// result. On a race, the first insert wins and later builds are
    /// dropped, so all callers hold the same `Arc`.
    pub fn get_or_build<F>(&self, key: PairKey, build: F) -> Result<Arc<ProxyTable>>
    where
        F: FnOnce() -> Result<ProxyTable>,
    {
        if let Some(table) = self.tables.lock().unwrap().get(&key) {
            return Ok(table.clone());
        }

        let built = Arc::new(build()?);
        debug!(
            contract = built.contract_name(),
            target_ty = built.target_type().name,
            "proxy table cached"
        );
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.entry(key).or_insert(built).clone())
    }

    pub fn len(&self) -> usize {
        self.tables.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
