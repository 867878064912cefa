//! mallard — structural contract adapters
//!
//! Lets a value that never declared conformance to a contract be used
//! wherever that contract is required, by materializing — at first use —
//! a forwarding adapter for the (contract, concrete type) pair.
//!
//! Design:
//! - Shapes, not reflection: a concrete type describes its public members
//!   once as a `TypeShape` with typed binding closures; contracts are
//!   interface-shaped member sets behind the `Contract` trait.
//! - Matching is structural and exhaustive: every contract member is
//!   compared by name, kind, and full signature, and every miss is
//!   reported, not just the first.
//! - Adapters are dispatch tables built once per pair, cached for the
//!   engine's lifetime, and shared across threads via `Arc`.
//! - Forwarding is a pure pass-through: no argument validation, no
//!   interception, no translation of whatever the target does.
//!
//! Known gap: event-style members are matched but never built — a contract
//! containing one always fails with `UnsupportedMember`.

pub mod cache;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod proxy;
pub mod shape;

pub use engine::Engine;
pub use error::{AdaptError, CallError, Result};
pub use matcher::{match_members, MatchReport, MemberMatch};
pub use proxy::{Contract, Duck, ProxyTable};
pub use shape::{
    Arg, ConcreteBuilder, DirClass, Direction, InterfaceBuilder, Member, MemberBody, MemberDesc,
    MemberKind, ParamDesc, ShapeKind, TypeDesc, TypeShape,
};
