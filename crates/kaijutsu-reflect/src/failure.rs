//! Failures raised by objects and by the dispatch machinery around them.
//!
//! A [`Failure`] is a kind (a type descending from `Throwable`), a message,
//! and an optional cause. Its [`FailureCategory`] comes from where the kind
//! sits in the hierarchy, not from a flag on the failure.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::builtin;
use crate::types::{TypeDescriptor, TypeRef};

/// How a failure kind is classified when it crosses a proxy boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureCategory {
    /// Must be declared by a method to pass through unchanged.
    Checked,
    /// Descends from `RuntimeException`.
    Unchecked,
    /// Descends from `Error`.
    Fatal,
}

impl FailureCategory {
    pub fn of(kind: &TypeDescriptor) -> Self {
        let t = builtin::types();
        if t.runtime.is_assignable_from(kind) {
            Self::Unchecked
        } else if t.error.is_assignable_from(kind) {
            Self::Fatal
        } else {
            Self::Checked
        }
    }
}

#[derive(Clone)]
pub struct Failure {
    kind: TypeRef,
    message: String,
    cause: Option<Box<Failure>>,
}

impl Failure {
    pub fn new(kind: &TypeRef, message: impl Into<String>) -> Self {
        Self {
            kind: Arc::clone(kind),
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap `cause` in a failure of `kind`, carrying the cause's text as message.
    pub fn wrap(kind: &TypeRef, cause: Failure) -> Self {
        Self::new(kind, cause.to_string()).with_cause(cause)
    }

    pub fn with_cause(mut self, cause: Failure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> &TypeRef {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    /// Take the cause, dropping this link.
    pub fn into_cause(self) -> Option<Failure> {
        self.cause.map(|c| *c)
    }

    /// Detach the cause, leaving this failure without one.
    pub fn take_cause(&mut self) -> Option<Failure> {
        self.cause.take().map(|c| *c)
    }

    /// This failure followed by each cause in turn.
    pub fn chain(&self) -> impl Iterator<Item = &Failure> {
        std::iter::successors(Some(self), |f| Failure::cause(f))
    }

    /// Whether this failure's kind is `kind` or descends from it.
    pub fn is_a(&self, kind: &TypeDescriptor) -> bool {
        kind.is_assignable_from(&self.kind)
    }

    /// Exact kind match, ignoring the hierarchy.
    pub fn is_exactly(&self, kind: &TypeDescriptor) -> bool {
        self.kind.key() == kind.key()
    }

    pub fn category(&self) -> FailureCategory {
        FailureCategory::of(&self.kind)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(self.kind.name())
        } else {
            write!(f, "{}: {}", self.kind.name(), self.message)
        }
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind.name())
            .field("message", &self.message)
            .field("cause", &self.cause)
            .finish()
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn Error + 'static))
    }
}
