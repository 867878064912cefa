//! Member descriptors and type shapes.
//!
//! Rust has no runtime member introspection, so a type's public surface is
//! described once, explicitly, as a [`TypeShape`]: an ordered list of member
//! descriptors, each optionally carrying a bound invocation closure. Contract
//! shapes are interface-shaped (descriptors only); concrete shapes bind every
//! member to a typed closure that forwards to the real implementation.

use crate::error::CallError;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Nominal type identity plus a human-readable name for diagnostics.
/// Equality is by `TypeId` only.
#[derive(Debug, Clone, Copy)]
pub struct TypeDesc {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeDesc {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDesc {}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ByValue,
    /// Caller sees mutations after the call returns.
    ByRef,
    /// Initial value is ignored; the member writes the slot.
    Out,
}

/// Matching treats `ByRef` and `Out` as a single class: both are mutable
/// slots from the member's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirClass {
    Value,
    Reference,
}

impl Direction {
    pub fn class(self) -> DirClass {
        match self {
            Direction::ByValue => DirClass::Value,
            Direction::ByRef | Direction::Out => DirClass::Reference,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDesc {
    pub ty: TypeDesc,
    pub direction: Direction,
}

impl ParamDesc {
    pub fn by_value<A: Any>() -> Self {
        Self {
            ty: TypeDesc::of::<A>(),
            direction: Direction::ByValue,
        }
    }

    pub fn by_ref<A: Any>() -> Self {
        Self {
            ty: TypeDesc::of::<A>(),
            direction: Direction::ByRef,
        }
    }

    pub fn out<A: Any>() -> Self {
        Self {
            ty: TypeDesc::of::<A>(),
            direction: Direction::Out,
        }
    }
}

impl fmt::Display for ParamDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::ByValue => write!(f, "{}", self.ty),
            Direction::ByRef => write!(f, "ref {}", self.ty),
            Direction::Out => write!(f, "out {}", self.ty),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Property,
    Event,
}

/// The normalized shape of one member: name, kind, signature.
#[derive(Debug, Clone)]
pub enum MemberDesc {
    Method {
        name: String,
        params: Vec<ParamDesc>,
        ret: TypeDesc,
    },
    Property {
        name: String,
        value: TypeDesc,
        has_get: bool,
        has_set: bool,
    },
    Event {
        name: String,
        handler: TypeDesc,
    },
}

impl MemberDesc {
    pub fn name(&self) -> &str {
        match self {
            MemberDesc::Method { name, .. }
            | MemberDesc::Property { name, .. }
            | MemberDesc::Event { name, .. } => name,
        }
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            MemberDesc::Method { .. } => MemberKind::Method,
            MemberDesc::Property { .. } => MemberKind::Property,
            MemberDesc::Event { .. } => MemberKind::Event,
        }
    }
}

impl fmt::Display for MemberDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberDesc::Method { name, params, ret } => {
                write!(f, "method {name}(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")?;
                if !ret.is::<()>() {
                    write!(f, " -> {ret}")?;
                }
                Ok(())
            }
            MemberDesc::Property {
                name,
                value,
                has_get,
                has_set,
            } => {
                write!(f, "property {name}: {value} {{")?;
                if *has_get {
                    write!(f, " get;")?;
                }
                if *has_set {
                    write!(f, " set;")?;
                }
                write!(f, " }}")
            }
            MemberDesc::Event { name, handler } => write!(f, "event {name}: {handler}"),
        }
    }
}

/// A dynamic argument slot for a forwarded call.
///
/// `ByRef`/`Out` hold a mutable borrow of the caller's variable, so
/// mutations performed by the target member are visible at the caller's
/// argument site after the call returns.
pub enum Arg<'a> {
    Value(Box<dyn Any>),
    ByRef(&'a mut dyn Any),
    Out(&'a mut dyn Any),
}

impl<'a> Arg<'a> {
    pub fn value<A: Any>(v: A) -> Self {
        Arg::Value(Box::new(v))
    }

    pub fn by_ref<A: Any>(slot: &'a mut A) -> Self {
        Arg::ByRef(slot)
    }

    pub fn out<A: Any>(slot: &'a mut A) -> Self {
        Arg::Out(slot)
    }

    /// Runtime type of the value in this slot.
    pub fn value_type(&self) -> TypeId {
        match self {
            Arg::Value(v) => (**v).type_id(),
            Arg::ByRef(r) | Arg::Out(r) => (**r).type_id(),
        }
    }

    pub fn class(&self) -> DirClass {
        match self {
            Arg::Value(_) => DirClass::Value,
            Arg::ByRef(_) | Arg::Out(_) => DirClass::Reference,
        }
    }
}

/// A bound invocation closure: forwards one member call to a concrete
/// target. The target is passed erased; the closure downcasts and calls
/// the real implementation.
pub type Invoker = Arc<
    dyn for<'t, 'a> Fn(&'t dyn Any, Vec<Arg<'a>>) -> Result<Box<dyn Any>, CallError>
        + Send
        + Sync,
>;

/// The bound implementation of one member on a concrete shape.
/// Events carry no body: forwarding them is not implemented.
#[derive(Clone)]
pub enum MemberBody {
    Method(Invoker),
    Property {
        get: Option<Invoker>,
        set: Option<Invoker>,
    },
}

/// One member of a shape: descriptor plus, on concrete shapes, its body.
#[derive(Clone)]
pub struct Member {
    pub desc: MemberDesc,
    pub body: Option<MemberBody>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Abstract member set: descriptors only.
    Interface,
    /// Members bound to the given target type.
    Concrete(TypeDesc),
}

/// An ordered member list describing either a contract (interface-shaped)
/// or a concrete type's public surface. Immutable once finished.
#[derive(Clone)]
pub struct TypeShape {
    name: String,
    kind: ShapeKind,
    members: Vec<Member>,
}

impl TypeShape {
    /// Start describing a contract: an abstract, interface-shaped member set.
    pub fn interface(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder {
            shape: TypeShape {
                name: name.into(),
                kind: ShapeKind::Interface,
                members: Vec::new(),
            },
        }
    }

    /// Start describing the public surface of a concrete type `T`.
    pub fn concrete<T: Any>() -> ConcreteBuilder<T> {
        let desc = TypeDesc::of::<T>();
        ConcreteBuilder {
            shape: TypeShape {
                name: desc.name.to_string(),
                kind: ShapeKind::Concrete(desc),
                members: Vec::new(),
            },
            _target: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ShapeKind::Interface
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }
}

impl fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeShape")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("members", &self.members.len())
            .finish()
    }
}

fn method_desc(name: &str, params: Vec<ParamDesc>, ret: TypeDesc) -> MemberDesc {
    MemberDesc::Method {
        name: name.to_string(),
        params,
        ret,
    }
}

/// Builder for interface-shaped contracts (descriptors only).
pub struct InterfaceBuilder {
    shape: TypeShape,
}

impl InterfaceBuilder {
    /// Declare a method with an explicit parameter list.
    pub fn method(mut self, name: &str, params: Vec<ParamDesc>, ret: TypeDesc) -> Self {
        self.shape.members.push(Member {
            desc: method_desc(name, params, ret),
            body: None,
        });
        self
    }

    pub fn method0<R: Any>(self, name: &str) -> Self {
        self.method(name, vec![], TypeDesc::of::<R>())
    }

    pub fn method1<A: Any, R: Any>(self, name: &str) -> Self {
        self.method(name, vec![ParamDesc::by_value::<A>()], TypeDesc::of::<R>())
    }

    pub fn method2<A: Any, B: Any, R: Any>(self, name: &str) -> Self {
        self.method(
            name,
            vec![ParamDesc::by_value::<A>(), ParamDesc::by_value::<B>()],
            TypeDesc::of::<R>(),
        )
    }

    pub fn method3<A: Any, B: Any, C: Any, R: Any>(self, name: &str) -> Self {
        self.method(
            name,
            vec![
                ParamDesc::by_value::<A>(),
                ParamDesc::by_value::<B>(),
                ParamDesc::by_value::<C>(),
            ],
            TypeDesc::of::<R>(),
        )
    }

    /// Declare a void method taking one by-reference parameter.
    pub fn method1_ref<A: Any>(self, name: &str) -> Self {
        self.method(name, vec![ParamDesc::by_ref::<A>()], TypeDesc::of::<()>())
    }

    /// Declare a void method taking one output-only parameter.
    pub fn method1_out<A: Any>(self, name: &str) -> Self {
        self.method(name, vec![ParamDesc::out::<A>()], TypeDesc::of::<()>())
    }

    fn push_property<V: Any>(mut self, name: &str, has_get: bool, has_set: bool) -> Self {
        self.shape.members.push(Member {
            desc: MemberDesc::Property {
                name: name.to_string(),
                value: TypeDesc::of::<V>(),
                has_get,
                has_set,
            },
            body: None,
        });
        self
    }

    pub fn property<V: Any>(self, name: &str) -> Self {
        self.push_property::<V>(name, true, true)
    }

    pub fn property_get<V: Any>(self, name: &str) -> Self {
        self.push_property::<V>(name, true, false)
    }

    pub fn property_set<V: Any>(self, name: &str) -> Self {
        self.push_property::<V>(name, false, true)
    }

    pub fn event<H: Any>(mut self, name: &str) -> Self {
        self.shape.members.push(Member {
            desc: MemberDesc::Event {
                name: name.to_string(),
                handler: TypeDesc::of::<H>(),
            },
            body: None,
        });
        self
    }

    pub fn finish(self) -> TypeShape {
        self.shape
    }
}

/// Builder for concrete shapes: every member carries a typed closure that
/// forwards to the real implementation on `T`.
pub struct ConcreteBuilder<T> {
    shape: TypeShape,
    _target: PhantomData<fn(&T)>,
}

fn erase<F>(f: F) -> Invoker
where
    F: for<'t, 'a> Fn(&'t dyn Any, Vec<Arg<'a>>) -> Result<Box<dyn Any>, CallError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

fn target_as<T: Any>(target: &dyn Any) -> Result<&T, CallError> {
    target
        .downcast_ref::<T>()
        .ok_or(CallError::TargetType(type_name::<T>()))
}

fn to_array<'a, const N: usize>(
    member: &str,
    args: Vec<Arg<'a>>,
) -> Result<[Arg<'a>; N], CallError> {
    let got = args.len();
    args.try_into().map_err(|_| CallError::ArgCount {
        member: member.to_string(),
        expected: N,
        got,
    })
}

fn take_value<A: Any>(member: &str, index: usize, arg: Arg<'_>) -> Result<A, CallError> {
    match arg {
        Arg::Value(v) => v.downcast::<A>().map(|b| *b).map_err(|_| CallError::ArgType {
            member: member.to_string(),
            index,
            expected: type_name::<A>(),
        }),
        Arg::ByRef(_) | Arg::Out(_) => Err(CallError::ArgMode {
            member: member.to_string(),
            index,
            mode: "by value",
        }),
    }
}

fn take_slot<'a, A: Any>(member: &str, index: usize, arg: Arg<'a>) -> Result<&'a mut A, CallError> {
    match arg {
        Arg::ByRef(r) | Arg::Out(r) => r.downcast_mut::<A>().ok_or_else(|| CallError::ArgType {
            member: member.to_string(),
            index,
            expected: type_name::<A>(),
        }),
        Arg::Value(_) => Err(CallError::ArgMode {
            member: member.to_string(),
            index,
            mode: "by reference",
        }),
    }
}

impl<T: Any> ConcreteBuilder<T> {
    /// Bind a member from an explicit descriptor and a pre-erased invoker.
    /// Escape hatch for signatures the arity helpers don't cover.
    pub fn member_raw(mut self, desc: MemberDesc, body: MemberBody) -> Self {
        self.shape.members.push(Member {
            desc,
            body: Some(body),
        });
        self
    }

    fn push_method(mut self, name: &str, params: Vec<ParamDesc>, ret: TypeDesc, inv: Invoker) -> Self {
        self.shape.members.push(Member {
            desc: method_desc(name, params, ret),
            body: Some(MemberBody::Method(inv)),
        });
        self
    }

    pub fn method0<R, F>(self, name: &'static str, f: F) -> Self
    where
        R: Any,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let inv = erase(move |target, args| {
            to_array::<0>(name, args)?;
            let t = target_as::<T>(target)?;
            Ok(Box::new(f(t)) as Box<dyn Any>)
        });
        self.push_method(name, vec![], TypeDesc::of::<R>(), inv)
    }

    pub fn method1<A, R, F>(self, name: &'static str, f: F) -> Self
    where
        A: Any,
        R: Any,
        F: Fn(&T, A) -> R + Send + Sync + 'static,
    {
        let inv = erase(move |target, args| {
            let [a] = to_array::<1>(name, args)?;
            let t = target_as::<T>(target)?;
            let a = take_value::<A>(name, 0, a)?;
            Ok(Box::new(f(t, a)) as Box<dyn Any>)
        });
        self.push_method(name, vec![ParamDesc::by_value::<A>()], TypeDesc::of::<R>(), inv)
    }

    pub fn method2<A, B, R, F>(self, name: &'static str, f: F) -> Self
    where
        A: Any,
        B: Any,
        R: Any,
        F: Fn(&T, A, B) -> R + Send + Sync + 'static,
    {
        let inv = erase(move |target, args| {
            let [a, b] = to_array::<2>(name, args)?;
            let t = target_as::<T>(target)?;
            let a = take_value::<A>(name, 0, a)?;
            let b = take_value::<B>(name, 1, b)?;
            Ok(Box::new(f(t, a, b)) as Box<dyn Any>)
        });
        self.push_method(
            name,
            vec![ParamDesc::by_value::<A>(), ParamDesc::by_value::<B>()],
            TypeDesc::of::<R>(),
            inv,
        )
    }

    pub fn method3<A, B, C, R, F>(self, name: &'static str, f: F) -> Self
    where
        A: Any,
        B: Any,
        C: Any,
        R: Any,
        F: Fn(&T, A, B, C) -> R + Send + Sync + 'static,
    {
        let inv = erase(move |target, args| {
            let [a, b, c] = to_array::<3>(name, args)?;
            let t = target_as::<T>(target)?;
            let a = take_value::<A>(name, 0, a)?;
            let b = take_value::<B>(name, 1, b)?;
            let c = take_value::<C>(name, 2, c)?;
            Ok(Box::new(f(t, a, b, c)) as Box<dyn Any>)
        });
        self.push_method(
            name,
            vec![
                ParamDesc::by_value::<A>(),
                ParamDesc::by_value::<B>(),
                ParamDesc::by_value::<C>(),
            ],
            TypeDesc::of::<R>(),
            inv,
        )
    }

    /// Bind a void method with one by-reference parameter. The closure
    /// receives the caller's slot and may mutate it in place.
    pub fn method1_ref<A, F>(self, name: &'static str, f: F) -> Self
    where
        A: Any,
        F: Fn(&T, &mut A) + Send + Sync + 'static,
    {
        let inv = erase(move |target, args| {
            let [a] = to_array::<1>(name, args)?;
            let t = target_as::<T>(target)?;
            let a = take_slot::<A>(name, 0, a)?;
            f(t, a);
            Ok(Box::new(()) as Box<dyn Any>)
        });
        self.push_method(name, vec![ParamDesc::by_ref::<A>()], TypeDesc::of::<()>(), inv)
    }

    /// Bind a void method with one output-only parameter. Same forwarding
    /// mechanics as `method1_ref`; only the declared direction differs.
    pub fn method1_out<A, F>(self, name: &'static str, f: F) -> Self
    where
        A: Any,
        F: Fn(&T, &mut A) + Send + Sync + 'static,
    {
        let inv = erase(move |target, args| {
            let [a] = to_array::<1>(name, args)?;
            let t = target_as::<T>(target)?;
            let a = take_slot::<A>(name, 0, a)?;
            f(t, a);
            Ok(Box::new(()) as Box<dyn Any>)
        });
        self.push_method(name, vec![ParamDesc::out::<A>()], TypeDesc::of::<()>(), inv)
    }

    /// Bind a void method taking one by-value and one by-reference parameter.
    pub fn method2_ref<A, B, F>(self, name: &'static str, f: F) -> Self
    where
        A: Any,
        B: Any,
        F: Fn(&T, A, &mut B) + Send + Sync + 'static,
    {
        let inv = erase(move |target, args| {
            let [a, b] = to_array::<2>(name, args)?;
            let t = target_as::<T>(target)?;
            let a = take_value::<A>(name, 0, a)?;
            let b = take_slot::<B>(name, 1, b)?;
            f(t, a, b);
            Ok(Box::new(()) as Box<dyn Any>)
        });
        self.push_method(
            name,
            vec![ParamDesc::by_value::<A>(), ParamDesc::by_ref::<B>()],
            TypeDesc::of::<()>(),
            inv,
        )
    }

    fn push_property<V: Any>(
        mut self,
        name: &str,
        get: Option<Invoker>,
        set: Option<Invoker>,
    ) -> Self {
        self.shape.members.push(Member {
            desc: MemberDesc::Property {
                name: name.to_string(),
                value: TypeDesc::of::<V>(),
                has_get: get.is_some(),
                has_set: set.is_some(),
            },
            body: Some(MemberBody::Property { get, set }),
        });
        self
    }

    fn getter<V, G>(name: &'static str, get: G) -> Invoker
    where
        V: Any,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        erase(move |target, args| {
            to_array::<0>(name, args)?;
            let t = target_as::<T>(target)?;
            Ok(Box::new(get(t)) as Box<dyn Any>)
        })
    }

    fn setter<V, S>(name: &'static str, set: S) -> Invoker
    where
        V: Any,
        S: Fn(&T, V) + Send + Sync + 'static,
    {
        erase(move |target, args| {
            let [v] = to_array::<1>(name, args)?;
            let t = target_as::<T>(target)?;
            let v = take_value::<V>(name, 0, v)?;
            set(t, v);
            Ok(Box::new(()) as Box<dyn Any>)
        })
    }

    pub fn property<V, G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        V: Any,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&T, V) + Send + Sync + 'static,
    {
        let g = Self::getter::<V, G>(name, get);
        let s = Self::setter::<V, S>(name, set);
        self.push_property::<V>(name, Some(g), Some(s))
    }

    pub fn property_get<V, G>(self, name: &'static str, get: G) -> Self
    where
        V: Any,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let g = Self::getter::<V, G>(name, get);
        self.push_property::<V>(name, Some(g), None)
    }

    pub fn property_set<V, S>(self, name: &'static str, set: S) -> Self
    where
        V: Any,
        S: Fn(&T, V) + Send + Sync + 'static,
    {
        let s = Self::setter::<V, S>(name, set);
        self.push_property::<V>(name, None, Some(s))
    }

    pub fn finish(self) -> TypeShape {
        self.shape
    }
}
