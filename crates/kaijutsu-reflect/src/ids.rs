//! Typed identifiers for types, scopes, and methods.
//!
//! `TypeKey` and `ScopeId` wrap UUIDv7 (time-ordered, globally unique). Type
//! identity is always the key, never the name: the same name defined in two
//! scopes is two distinct types. The `short()` form (first 8 hex chars) is for
//! logs only — never used as a lookup key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a type descriptor (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(uuid::Uuid);

/// Identity of a resolution scope (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(uuid::Uuid);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_typed_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Create a new time-ordered ID (UUIDv7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// First 8 hex characters — for human display only, not lookup.
            pub fn short(&self) -> String {
                self.0.as_simple().to_string()[..8].to_string()
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $T {
            fn from(u: uuid::Uuid) -> Self {
                Self(u)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.short())
            }
        }
    };
}

impl_typed_id!(TypeKey, "TypeKey");
impl_typed_id!(ScopeId, "ScopeId");

// ── MethodId ────────────────────────────────────────────────────────────────

/// Identity of a declared method: the declaring type plus its declaration index.
///
/// Inherited methods keep the id of the type that declared them, so the same
/// interface method seen through two sub-interfaces is one `MethodId`.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MethodId {
    pub owner: TypeKey,
    pub index: usize,
}

impl MethodId {
    pub fn new(owner: TypeKey, index: usize) -> Self {
        Self { owner, index }
    }
}

impl fmt::Debug for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodId({}#{})", self.owner.short(), self.index)
    }
}
