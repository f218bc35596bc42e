//! Runtime type model for kaijutsu remote objects.
//!
//! The bridge in `kaijutsu-bridge` needs to reason about objects whose
//! implementations live in another process: which methods a type declares,
//! whether one type can stand in for another, which scope a type name
//! resolves in, and how a failure is classified. This crate is that model.
//! It has **no internal kaijutsu dependencies**.
//!
//! # Key Types
//!
//! |-----------------------|-----------------------------------------------|
//! | Type                  | Purpose                                       |
//! |-----------------------|-----------------------------------------------|
//! | [`TypeDescriptor`]    | Runtime shape of a type (methods, supertypes) |
//! | [`MethodDescriptor`]  | One declared method and its failure set       |
//! | [`ResolutionScope`]   | Name → type table with parent delegation      |
//! | [`Object`]            | Anything a method can be invoked on           |
//! | [`Value`]             | Arguments and results                         |
//! | [`Failure`]           | A raised failure and its cause chain          |
//! | [`TypeKey`]           | Type identity                                 |
//! |-----------------------|-----------------------------------------------|

pub mod builtin;
pub mod error;
pub mod failure;
pub mod ids;
pub mod invoke;
pub mod object;
pub mod scope;
pub mod types;
pub mod value;

pub use builtin::BuiltinTypes;
pub use error::ReflectError;
pub use failure::{Failure, FailureCategory};
pub use ids::{MethodId, ScopeId, TypeKey};
pub use invoke::invoke;
pub use object::{invoke_identity, Object, ObjectExt, ObjectRef};
pub use scope::{ResolutionScope, ScopeRef};
pub use types::{MethodDescriptor, MethodRef, TypeBuilder, TypeDescriptor, TypeKind, TypeRef};
pub use value::Value;
