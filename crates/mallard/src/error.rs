use thiserror::Error;

/// Terminal adaptation failures. All are synchronous and non-retryable:
/// either a proxy table comes out whole, or nothing is produced.
#[derive(Error, Debug)]
pub enum AdaptError {
    /// The target value's runtime type has no registered shape, so the
    /// engine cannot introspect it.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The shape offered as a contract describes a concrete type (it
    /// carries bound members) instead of an abstract member set.
    #[error("invalid contract: {0}")]
    InvalidContract(String),

    /// One or more contract members have no structural counterpart on the
    /// target type. Lists every missing member, one full signature per
    /// line, so a caller can fix all mismatches in one pass.
    #[error("target type '{target}' does not satisfy contract '{contract}'; missing members:\n{}", missing.join("\n"))]
    UnsatisfiedContract {
        contract: String,
        target: String,
        missing: Vec<String>,
    },

    /// The contract declares an event member. Event forwarding is not
    /// implemented; building fails regardless of whether a structural
    /// match exists.
    #[error("unsupported member: {0}")]
    UnsupportedMember(String),

    /// A matched member could not be bound (missing or kind-mismatched
    /// body on the target shape).
    #[error("build: {0}")]
    InternalBuild(String),
}

pub type Result<T> = std::result::Result<T, AdaptError>;

/// Failures at the dynamic call seam of an already-built proxy.
///
/// These are not forwarding behavior: they surface only when a caller's
/// dynamic arguments cannot be reconciled with the contract descriptor.
/// Whatever the target itself does during a forwarded call (including
/// panicking) reaches the caller unchanged.
#[derive(Error, Debug)]
pub enum CallError {
    #[error("no member '{0}' matches the given arguments")]
    NoMatchingMember(String),

    #[error("{member}: expected {expected} argument(s), got {got}")]
    ArgCount {
        member: String,
        expected: usize,
        got: usize,
    },

    #[error("{member}: argument {index} is not a '{expected}'")]
    ArgType {
        member: String,
        index: usize,
        expected: &'static str,
    },

    #[error("{member}: argument {index} must be passed {mode}")]
    ArgMode {
        member: String,
        index: usize,
        mode: &'static str,
    },

    #[error("target value is not a '{0}'")]
    TargetType(&'static str),

    #[error("return value is not a '{0}'")]
    ReturnType(&'static str),

    #[error("property '{0}' has no getter on this contract")]
    NotReadable(String),

    #[error("property '{0}' has no setter on this contract")]
    NotWritable(String),
}
