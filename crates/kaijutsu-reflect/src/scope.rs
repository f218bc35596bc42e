//! Resolution scopes: the set of types resolvable by name in a context.
//!
//! A scope plays the part a class loader plays on other runtimes. Lookup
//! delegates to the parent first, so a child scope can add types but never
//! shadow one its parent already resolves. The system scope sits at the root
//! and holds the builtins.
//!
//! A scope lives as long as any type handle it gave out. Dropping every
//! `ScopeRef` and every handle frees the scope together with its types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::builtin;
use crate::error::ReflectError;
use crate::ids::{ScopeId, TypeKey};
use crate::types::{TypeBuilder, TypeRef};

/// Shared handle to a resolution scope.
pub type ScopeRef = Arc<ResolutionScope>;

pub struct ResolutionScope {
    id: ScopeId,
    name: String,
    parent: Option<ScopeRef>,
    types: RwLock<HashMap<String, TypeRef>>,
    derived: RwLock<HashMap<(TypeKey, &'static str), TypeRef>>,
}

impl ResolutionScope {
    pub(crate) fn root(name: impl Into<String>) -> ScopeRef {
        Arc::new(Self {
            id: ScopeId::new(),
            name: name.into(),
            parent: None,
            types: RwLock::new(HashMap::new()),
            derived: RwLock::new(HashMap::new()),
        })
    }

    /// Create a scope whose parent is the system scope.
    pub fn new(name: impl Into<String>) -> ScopeRef {
        Self::child(name, Self::system())
    }

    /// Create a scope delegating to `parent`.
    pub fn child(name: impl Into<String>, parent: &ScopeRef) -> ScopeRef {
        Arc::new(Self {
            id: ScopeId::new(),
            name: name.into(),
            parent: Some(Arc::clone(parent)),
            types: RwLock::new(HashMap::new()),
            derived: RwLock::new(HashMap::new()),
        })
    }

    /// The process-wide root scope holding the builtin types.
    pub fn system() -> &'static ScopeRef {
        builtin::system_scope()
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&ScopeRef> {
        self.parent.as_ref()
    }

    /// Define a named type in this scope. The scope becomes its defining scope.
    pub fn define(self: &Arc<Self>, builder: TypeBuilder) -> Result<TypeRef, ReflectError> {
        let mut types = self.types.write();
        if types.contains_key(builder.name()) {
            return Err(ReflectError::DuplicateType {
                scope: self.name.clone(),
                name: builder.name().to_string(),
            });
        }

        let ty = builder.build(self);
        types.insert(ty.name().to_string(), ty.detached());
        debug!(scope = %self.name, ty = %ty.name(), key = %ty.key().short(), "defined type");
        Ok(ty)
    }

    /// Register an already-built type under its name, replacing any previous entry.
    pub(crate) fn register(&self, ty: &TypeRef) {
        self.types.write().insert(ty.name().to_string(), ty.detached());
    }

    /// Define a type owned by this scope that cannot be resolved by name.
    pub fn define_anonymous(self: &Arc<Self>, builder: TypeBuilder) -> TypeRef {
        builder.build(self)
    }

    /// The anonymous type derived from `origin` for `purpose`, built on first
    /// request and shared afterwards. Entries live and die with the scope.
    pub fn derived(
        self: &Arc<Self>,
        origin: TypeKey,
        purpose: &'static str,
        build: impl FnOnce() -> TypeBuilder,
    ) -> TypeRef {
        let mut derived = self.derived.write();
        let ty = derived.entry((origin, purpose)).or_insert_with(|| {
            debug!(scope = %self.name, purpose, "Derived type");
            build().build(self).detached()
        });
        ty.held_by(self)
    }

    /// Resolve a type name, asking the parent chain first.
    pub fn resolve(self: &Arc<Self>, name: &str) -> Option<TypeRef> {
        if let Some(parent) = &self.parent
            && let Some(ty) = parent.resolve(name)
        {
            return Some(ty);
        }
        self.types.read().get(name).map(|ty| ty.held_by(self))
    }

    /// Like [`resolve`](Self::resolve), but a miss is an error.
    pub fn require(self: &Arc<Self>, name: &str) -> Result<TypeRef, ReflectError> {
        self.resolve(name).ok_or_else(|| ReflectError::UnknownType {
            scope: self.name.clone(),
            name: name.to_string(),
        })
    }

    /// Names defined directly in this scope, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl PartialEq for ResolutionScope {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResolutionScope {}

impl fmt::Display for ResolutionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for ResolutionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionScope")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .finish()
    }
}
