//! Failure unwrapping and reclassification.
//!
//! A failure coming back from a reflective call arrives inside one or more
//! wrapper layers added by the dispatch machinery. [`Unwrapper`] strips
//! them; [`RethrowPolicy`] then decides what the caller of the local method
//! actually sees:
//!
//! 1. A transport server-side wrapper is peeled once (its cause, or itself
//!    when it has none).
//! 2. Unchecked failures pass through unchanged.
//! 3. Fatal failures pass through unchanged.
//! 4. Checked failures the local method declares pass through unchanged.
//! 5. Anything else is wrapped in a `RuntimeException`.

use std::sync::LazyLock;

use kaijutsu_reflect::{Failure, FailureCategory, MethodDescriptor, TypeRef, builtin};
use tracing::debug;

/// Strips pure wrapper layers from a failure's cause chain.
#[derive(Debug, Clone)]
pub struct Unwrapper {
    wrapper_kinds: Vec<TypeRef>,
}

impl Default for Unwrapper {
    fn default() -> Self {
        let t = builtin::types();
        Self::new(vec![t.invocation_target.clone(), t.undeclared_throwable.clone()])
    }
}

impl Unwrapper {
    pub fn new(wrapper_kinds: Vec<TypeRef>) -> Self {
        Self { wrapper_kinds }
    }

    pub fn wrapper_kinds(&self) -> &[TypeRef] {
        &self.wrapper_kinds
    }

    /// Only an exact kind match counts; subkinds of a wrapper carry meaning.
    pub fn is_wrapper(&self, failure: &Failure) -> bool {
        self.wrapper_kinds.iter().any(|k| failure.is_exactly(k))
    }

    /// The first link of the chain that is not a wrapper, or `failure`
    /// itself when every link is one.
    pub fn unwrap<'a>(&self, failure: &'a Failure) -> &'a Failure {
        failure.chain().find(|f| !self.is_wrapper(f)).unwrap_or(failure)
    }

    /// Owned form of [`unwrap`](Self::unwrap).
    pub fn unwrap_owned(&self, failure: Failure) -> Failure {
        let Some(depth) = failure.chain().position(|f| !self.is_wrapper(f)) else {
            return failure;
        };

        let mut current = failure;
        for _ in 0..depth {
            if let Some(cause) = current.take_cause() {
                current = cause;
            }
        }
        current
    }
}

static DEFAULT_UNWRAPPER: LazyLock<Unwrapper> = LazyLock::new(Unwrapper::default);

/// Unwrap with the builtin wrapper kinds.
pub fn unwrap(failure: &Failure) -> &Failure {
    DEFAULT_UNWRAPPER.unwrap(failure)
}

/// A message suitable for showing a user.
///
/// Unwraps first. A real failure with an empty message is rendered with its
/// whole cause chain instead.
pub fn error_message(failure: &Failure) -> String {
    let real = unwrap(failure);
    if !real.message().is_empty() {
        return real.message().to_string();
    }
    real.chain()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", caused by ")
}

/// Decides how an unwrapped failure is presented to the local caller.
#[derive(Debug, Clone)]
pub struct RethrowPolicy {
    server_error: Option<TypeRef>,
}

impl Default for RethrowPolicy {
    fn default() -> Self {
        Self::new(Some(builtin::types().server_error.clone()))
    }
}

impl RethrowPolicy {
    pub fn new(server_error: Option<TypeRef>) -> Self {
        Self { server_error }
    }

    pub fn server_error_kind(&self) -> Option<&TypeRef> {
        self.server_error.as_ref()
    }

    /// Reclassify `cause` against the contract of `method`.
    pub fn rethrow(&self, cause: Failure, method: &MethodDescriptor) -> Failure {
        let cause = match &self.server_error {
            Some(kind) if cause.is_a(kind) => peel(cause),
            _ => cause,
        };

        match cause.category() {
            FailureCategory::Unchecked | FailureCategory::Fatal => cause,
            FailureCategory::Checked if method.declares(cause.kind()) => cause,
            FailureCategory::Checked => {
                debug!(
                    method = %method.name(),
                    kind = %cause.kind().name(),
                    "Wrapping undeclared checked failure"
                );
                Failure::wrap(&builtin::types().runtime, cause)
            }
        }
    }
}

/// One level only: a server error nested in a server error stays nested.
fn peel(mut failure: Failure) -> Failure {
    failure.take_cause().unwrap_or(failure)
}
