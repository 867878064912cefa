//! The adaptation engine: shape registry + proxy cache + the one public
//! operation, [`Engine::adapt`].
//!
//! The engine is an explicit object with caller-defined lifetime — the
//! hosting application constructs one and passes it where needed. There is
//! no hidden process-global state.

use crate::cache::{PairKey, ProxyCache};
use crate::error::{AdaptError, Result};
use crate::matcher::match_members;
use crate::proxy::{Contract, Duck, ProxyTable};
use crate::shape::{ShapeKind, TypeShape};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Structural adaptation engine.
///
/// Concrete types are introspected once, at registration, into a
/// [`TypeShape`]. After that, [`Engine::adapt`] can hand out adapters for
/// any registered value against any [`Contract`], building and caching the
/// forwarding table on first use of each (contract, type) pair.
///
/// Safe for concurrent use from multiple threads, including concurrent
/// first-time requests for the same pair.
#[derive(Default)]
pub struct Engine {
    shapes: RwLock<HashMap<TypeId, Arc<TypeShape>>>,
    cache: ProxyCache,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a concrete type's shape. Later registrations for the same
    /// type replace the earlier shape; already-built proxy tables keep
    /// the bindings they were built with.
    pub fn register(&self, shape: TypeShape) -> Result<()> {
        let ShapeKind::Concrete(desc) = shape.kind() else {
            return Err(AdaptError::InvalidTarget(format!(
                "shape '{}' is interface-shaped and cannot describe a target value",
                shape.name()
            )));
        };
        debug!(target_ty = shape.name(), members = shape.members().len(), "shape registered");
        self.shapes.write().unwrap().insert(desc.id, Arc::new(shape));
        Ok(())
    }

    /// Adapt `target` to the contract `C`.
    ///
    /// A Rust reference is never null, so the absent-target failure mode
    /// here is a value whose runtime type was never registered: the engine
    /// cannot introspect it and reports [`AdaptError::InvalidTarget`].
    ///
    /// All failures are raised synchronously, before any proxy instance
    /// exists. On success, every operation performed through the returned
    /// [`Duck`] forwards to `target` with identical arguments and return
    /// values, including by-ref/out mutation at the caller's argument site.
    pub fn adapt<'t, C: Contract>(&self, target: &'t dyn Any) -> Result<Duck<'t, C>> {
        let contract = C::shape();
        if !contract.is_interface() {
            return Err(AdaptError::InvalidContract(format!(
                "'{}' carries bound members; a contract must be an abstract member set",
                contract.name()
            )));
        }

        let tid = target.type_id();
        let target_shape = self
            .shapes
            .read()
            .unwrap()
            .get(&tid)
            .cloned()
            .ok_or_else(|| {
                AdaptError::InvalidTarget(format!(
                    "no shape registered for the target's runtime type ({tid:?})"
                ))
            })?;

        let key: PairKey = (TypeId::of::<C>(), tid);
        let table = self.cache.get_or_build(key, || {
            debug!(
                contract = contract.name(),
                target_ty = target_shape.name(),
                "first use of pair; matching and building"
            );
            let report = match_members(contract, &target_shape);
            ProxyTable::build(contract, &target_shape, &report)
        })?;

        Ok(Duck::new(table, target))
    }

    /// Number of (contract, type) pairs with a materialized proxy table.
    pub fn cached_pairs(&self) -> usize {
        self.cache.len()
    }
}
