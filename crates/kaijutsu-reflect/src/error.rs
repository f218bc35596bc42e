//! Error types for the type model.

use thiserror::Error;

use crate::builtin;
use crate::failure::Failure;

/// Errors from defining, resolving, or looking up types and methods.
#[derive(Error, Debug)]
pub enum ReflectError {
    /// A scope already holds a type with this name.
    #[error("type '{name}' is already defined in scope '{scope}'")]
    DuplicateType { scope: String, name: String },

    /// Name lookup failed in the scope and all of its parents.
    #[error("no type named '{name}' in scope '{scope}'")]
    UnknownType { scope: String, name: String },

    #[error("{type_name} has no method {name}/{arity}")]
    NoSuchMethod {
        type_name: String,
        name: String,
        arity: usize,
    },
}

impl From<ReflectError> for Failure {
    fn from(err: ReflectError) -> Self {
        Failure::new(&builtin::types().illegal_argument, err.to_string())
    }
}
