//! Proxy tables and proxy instances.
//!
//! A [`ProxyTable`] is the materialized adapter for one (contract, concrete
//! type) pair: one bound invoker per contract member, in contract order.
//! Built once, immutable afterwards, shared via `Arc`. A [`Duck`] pairs a
//! shared table with a borrowed target value; the borrow is the whole
//! ownership story — the proxy never controls the target's lifetime.

use crate::error::{AdaptError, CallError, Result};
use crate::matcher::MatchReport;
use crate::shape::{Arg, Invoker, MemberBody, MemberDesc, MemberKind, ShapeKind, TypeDesc, TypeShape};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// An interface-shaped member set a consumer depends on. Contract identity
/// (used as half the cache key) is the implementing type's `TypeId`, so two
/// requests for the same contract trivially resolve to the same identity.
pub trait Contract: 'static {
    /// The contract's shape. Must be interface-shaped and stable for the
    /// process lifetime (typically a lazily initialized static).
    fn shape() -> &'static TypeShape;
}

/// One forwarding slot of a proxy table.
#[derive(Clone)]
pub(crate) enum Binding {
    Method(Invoker),
    Property {
        get: Option<Invoker>,
        set: Option<Invoker>,
    },
}

/// The generated adapter for one (contract, concrete type) pair: the
/// contract's member descriptors alongside the target's bound invokers.
pub struct ProxyTable {
    contract_name: String,
    target: TypeDesc,
    members: Vec<MemberDesc>,
    bindings: Vec<Binding>,
}

impl ProxyTable {
    /// Materialize the table from a completed match report.
    ///
    /// Building is a single terminal step: either a fully usable table
    /// comes back, or an error does — there is no partial state.
    pub fn build(
        contract: &TypeShape,
        target: &TypeShape,
        report: &MatchReport,
    ) -> Result<ProxyTable> {
        // Event members fail the build outright, before and regardless of
        // the match outcome.
        if let Some(ev) = contract
            .members()
            .iter()
            .find(|m| m.desc.kind() == MemberKind::Event)
        {
            return Err(AdaptError::UnsupportedMember(format!(
                "event members cannot be forwarded: {}",
                ev.desc
            )));
        }

        let missing: Vec<String> = report
            .unmatched()
            .map(|i| contract.members()[i].desc.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AdaptError::UnsatisfiedContract {
                contract: contract.name().to_string(),
                target: target.name().to_string(),
                missing,
            });
        }

        let target_desc = match target.kind() {
            ShapeKind::Concrete(desc) => desc,
            ShapeKind::Interface => {
                return Err(AdaptError::InternalBuild(format!(
                    "'{}' is not a concrete shape; nothing to bind",
                    target.name()
                )))
            }
        };

        let mut members = Vec::with_capacity(report.matches.len());
        let mut bindings = Vec::with_capacity(report.matches.len());
        for m in &report.matches {
            let cdesc = &contract.members()[m.contract].desc;
            let bound = m
                .target
                .and_then(|j| target.members().get(j))
                .and_then(|tm| tm.body.as_ref());
            let binding = match (cdesc, bound) {
                (MemberDesc::Method { .. }, Some(MemberBody::Method(inv))) => {
                    Binding::Method(inv.clone())
                }
                (
                    MemberDesc::Property {
                        has_get, has_set, ..
                    },
                    Some(MemberBody::Property { get, set }),
                ) => Binding::Property {
                    // Expose only the accessors the contract asks for, even
                    // if the target offers more.
                    get: if *has_get { get.clone() } else { None },
                    set: if *has_set { set.clone() } else { None },
                },
                _ => {
                    return Err(AdaptError::InternalBuild(format!(
                        "member '{cdesc}' matched but has no usable binding on '{}'",
                        target.name()
                    )))
                }
            };
            members.push(cdesc.clone());
            bindings.push(binding);
        }

        debug!(
            contract = contract.name(),
            target_ty = target.name(),
            members = members.len(),
            "proxy table built"
        );
        Ok(ProxyTable {
            contract_name: contract.name().to_string(),
            target: target_desc,
            members,
            bindings,
        })
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Identity of the concrete type this table forwards to.
    pub fn target_type(&self) -> TypeDesc {
        self.target
    }

    /// Overload resolution: the contract member whose name, arity, argument
    /// runtime types, and direction classes match the given argument slots.
    fn resolve_method(&self, name: &str, args: &[Arg<'_>]) -> Option<usize> {
        self.members.iter().position(|m| match m {
            MemberDesc::Method {
                name: n, params, ..
            } => {
                n == name
                    && params.len() == args.len()
                    && params
                        .iter()
                        .zip(args)
                        .all(|(p, a)| p.ty.id == a.value_type() && p.direction.class() == a.class())
            }
            _ => false,
        })
    }

    fn find_property(&self, name: &str) -> Option<usize> {
        self.members.iter().position(
            |m| matches!(m, MemberDesc::Property { name: n, .. } if n == name),
        )
    }
}

// Bindings are closures, so derive is out; report identities and size.
impl fmt::Debug for ProxyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyTable")
            .field("contract", &self.contract_name)
            .field("target", &self.target.name)
            .field("members", &self.members.len())
            .finish()
    }
}

/// A proxy instance: one shared table plus a borrowed target value.
/// Immutable after construction; forwarding behavior is completely
/// determined by the table and never varies per call.
pub struct Duck<'t, C: Contract> {
    table: Arc<ProxyTable>,
    target: &'t dyn Any,
    _contract: PhantomData<fn() -> C>,
}

impl<'t, C: Contract> Duck<'t, C> {
    pub(crate) fn new(table: Arc<ProxyTable>, target: &'t dyn Any) -> Self {
        Self {
            table,
            target,
            _contract: PhantomData,
        }
    }

    /// The underlying table, for identity checks (`Arc::ptr_eq`).
    pub fn table(&self) -> &Arc<ProxyTable> {
        &self.table
    }

    /// Invoke a contract method. Arguments are forwarded untouched, in
    /// order; by-ref and out slots are mutated in place by the target
    /// member; the return value comes back boxed, untransformed.
    pub fn call(&self, name: &str, args: Vec<Arg<'_>>) -> std::result::Result<Box<dyn Any>, CallError> {
        let idx = self
            .table
            .resolve_method(name, &args)
            .ok_or_else(|| CallError::NoMatchingMember(name.to_string()))?;
        match &self.table.bindings[idx] {
            Binding::Method(inv) => inv(self.target, args),
            Binding::Property { .. } => Err(CallError::NoMatchingMember(name.to_string())),
        }
    }

    /// Invoke a contract method and downcast its return value.
    pub fn call_as<R: Any>(&self, name: &str, args: Vec<Arg<'_>>) -> std::result::Result<R, CallError> {
        self.call(name, args)?
            .downcast::<R>()
            .map(|b| *b)
            .map_err(|_| CallError::ReturnType(type_name::<R>()))
    }

    /// Read a contract property through its forwarded getter.
    pub fn get<V: Any>(&self, name: &str) -> std::result::Result<V, CallError> {
        let idx = self
            .table
            .find_property(name)
            .ok_or_else(|| CallError::NoMatchingMember(name.to_string()))?;
        let Binding::Property { get: Some(inv), .. } = &self.table.bindings[idx] else {
            return Err(CallError::NotReadable(name.to_string()));
        };
        inv(self.target, vec![])?
            .downcast::<V>()
            .map(|b| *b)
            .map_err(|_| CallError::ReturnType(type_name::<V>()))
    }

    /// Write a contract property through its forwarded setter.
    pub fn set<V: Any>(&self, name: &str, value: V) -> std::result::Result<(), CallError> {
        let idx = self
            .table
            .find_property(name)
            .ok_or_else(|| CallError::NoMatchingMember(name.to_string()))?;
        let Binding::Property { set: Some(inv), .. } = &self.table.bindings[idx] else {
            return Err(CallError::NotWritable(name.to_string()));
        };
        inv(self.target, vec![Arg::value(value)])?;
        Ok(())
    }

    /// `TypeId` of the wrapped target value.
    pub fn target_type_id(&self) -> TypeId {
        self.target.type_id()
    }
}

impl<'t, C: Contract> fmt::Debug for Duck<'t, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Duck")
            .field("contract", &self.table.contract_name)
            .field("target", &self.table.target.name)
            .finish()
    }
}
