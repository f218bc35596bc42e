//! Type and method descriptors.
//!
//! A [`TypeDescriptor`] is the runtime shape of a type: its identity, its
//! direct supertypes, and the methods it declares. Descriptors are immutable
//! once built and are shared as [`TypeRef`]. They are only ever created
//! through a [`ResolutionScope`](crate::ResolutionScope), which becomes the
//! type's defining scope.
//!
//! A handle returned by a scope keeps that scope alive, so a type can always
//! reach the scope that defined it. Copies stored inside a scope (its name
//! table, and same-scope references in supertypes and signatures) point back
//! weakly, which keeps a scope and its own types from forming a cycle.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use tracing::warn;

use crate::builtin;
use crate::ids::{MethodId, TypeKey};
use crate::scope::{ResolutionScope, ScopeRef};

/// Shared handle to a type descriptor.
pub type TypeRef = Arc<TypeDescriptor>;

/// Shared handle to a method descriptor.
pub type MethodRef = Arc<MethodDescriptor>;

/// Whether a type is an interface or a concrete class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TypeKind {
    Interface,
    Class,
}

// ============================================================================
// TypeDescriptor
// ============================================================================

struct TypeShape {
    key: TypeKey,
    name: String,
    kind: TypeKind,
    supertypes: Vec<TypeRef>,
    methods: Vec<MethodRef>,
}

enum Anchor {
    Held(ScopeRef),
    Weak(Weak<ResolutionScope>),
}

pub struct TypeDescriptor {
    shape: Arc<TypeShape>,
    anchor: Anchor,
}

impl TypeDescriptor {
    pub fn key(&self) -> TypeKey {
        self.shape.key
    }

    pub fn name(&self) -> &str {
        &self.shape.name
    }

    pub fn kind(&self) -> TypeKind {
        self.shape.kind
    }

    pub fn is_interface(&self) -> bool {
        self.shape.kind == TypeKind::Interface
    }

    /// Direct supertypes, in declaration order.
    pub fn supertypes(&self) -> &[TypeRef] {
        &self.shape.supertypes
    }

    /// Methods declared directly on this type, in declaration order.
    pub fn methods(&self) -> &[MethodRef] {
        &self.shape.methods
    }

    /// Declared methods followed by inherited ones.
    ///
    /// Supertypes are walked depth first in declaration order. A method
    /// reachable through two paths (diamond inheritance) appears once.
    pub fn all_methods(&self) -> Vec<MethodRef> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_methods(&mut seen, &mut out);
        out
    }

    fn collect_methods(&self, seen: &mut HashSet<MethodId>, out: &mut Vec<MethodRef>) {
        for method in self.methods() {
            if seen.insert(method.id()) {
                out.push(Arc::clone(method));
            }
        }
        for sup in self.supertypes() {
            sup.collect_methods(seen, out);
        }
    }

    /// First method (declared or inherited) with this name and arity.
    pub fn find_method(&self, name: &str, arity: usize) -> Option<MethodRef> {
        self.all_methods()
            .into_iter()
            .find(|m| m.name() == name && m.arity() == arity)
    }

    /// The interface set a proxy for this type has to present.
    ///
    /// An interface presents itself; a class presents its direct interface
    /// supertypes.
    pub fn interfaces(self: &Arc<Self>) -> Vec<TypeRef> {
        if self.is_interface() {
            return vec![Arc::clone(self)];
        }
        self.supertypes()
            .iter()
            .filter(|s| s.is_interface())
            .cloned()
            .collect()
    }

    /// Whether a value of type `other` can be used where `self` is expected.
    ///
    /// Reflexive and transitive through supertypes. The root `Object` type is
    /// assignable from everything.
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        if self.key() == other.key() || self.key() == builtin::types().object.key() {
            return true;
        }
        other.supertypes().iter().any(|sup| self.is_assignable_from(sup))
    }

    /// The scope that defined this type.
    ///
    /// Always available through a handle a scope returned. A copy reached
    /// only through another type's signature can outlive its scope; it then
    /// reports the system scope.
    pub fn defining_scope(&self) -> ScopeRef {
        match &self.anchor {
            Anchor::Held(scope) => Arc::clone(scope),
            Anchor::Weak(scope) => scope.upgrade().unwrap_or_else(|| {
                warn!(ty = %self.name(), "Defining scope dropped; falling back to system scope");
                Arc::clone(ResolutionScope::system())
            }),
        }
    }

    /// Whether this handle keeps its defining scope alive.
    pub fn holds_scope(&self) -> bool {
        matches!(self.anchor, Anchor::Held(_))
    }

    pub(crate) fn defined_in(&self, scope: &ScopeRef) -> bool {
        match &self.anchor {
            Anchor::Held(held) => Arc::ptr_eq(held, scope),
            Anchor::Weak(weak) => std::ptr::eq(weak.as_ptr(), Arc::as_ptr(scope)),
        }
    }

    /// A copy that holds its defining scope.
    pub(crate) fn held_by(&self, scope: &ScopeRef) -> TypeRef {
        Arc::new(Self {
            shape: Arc::clone(&self.shape),
            anchor: Anchor::Held(Arc::clone(scope)),
        })
    }

    /// A copy that only points back at its defining scope.
    pub(crate) fn detached(&self) -> TypeRef {
        let weak = match &self.anchor {
            Anchor::Held(scope) => Arc::downgrade(scope),
            Anchor::Weak(weak) => Weak::clone(weak),
        };
        Arc::new(Self {
            shape: Arc::clone(&self.shape),
            anchor: Anchor::Weak(weak),
        })
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name())
            .field("key", &self.key())
            .field("kind", &self.kind())
            .field("methods", &self.methods().len())
            .finish()
    }
}

// ============================================================================
// MethodDescriptor
// ============================================================================

pub struct MethodDescriptor {
    id: MethodId,
    name: String,
    params: Vec<TypeRef>,
    returns: TypeRef,
    throws: Vec<TypeRef>,
}

impl MethodDescriptor {
    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self) -> &TypeRef {
        &self.returns
    }

    /// Declared failure kinds.
    pub fn throws(&self) -> &[TypeRef] {
        &self.throws
    }

    /// Whether `kind` is covered by one of the declared failure kinds.
    pub fn declares(&self, kind: &TypeDescriptor) -> bool {
        self.throws.iter().any(|t| t.is_assignable_from(kind))
    }

    /// Equality, hashing, and string representation: the methods declared by
    /// the root `Object` type.
    pub fn is_identity_contract(&self) -> bool {
        self.id.owner == builtin::types().object.key()
    }

    /// Human-readable signature, e.g. `greet(Text) -> Text`.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.name()).collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.returns.name())
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodDescriptor({:?} {})", self.id, self.signature())
    }
}

// ============================================================================
// TypeBuilder
// ============================================================================

struct MethodSpec {
    name: String,
    params: Vec<TypeRef>,
    returns: TypeRef,
    throws: Vec<TypeRef>,
}

/// Builder for a type definition; consumed by
/// [`ResolutionScope::define`](crate::ResolutionScope::define).
pub struct TypeBuilder {
    key: TypeKey,
    name: String,
    kind: TypeKind,
    supertypes: Vec<TypeRef>,
    methods: Vec<MethodSpec>,
}

impl TypeBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            key: TypeKey::new(),
            name: name.into(),
            kind,
            supertypes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Reuse an existing key. Only the bootstrap needs this, to let the root
    /// type mention itself in its own method signatures.
    pub(crate) fn with_key(mut self, key: TypeKey) -> Self {
        self.key = key;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a direct supertype (superclass or implemented interface).
    pub fn extends(mut self, supertype: &TypeRef) -> Self {
        self.supertypes.push(Arc::clone(supertype));
        self
    }

    pub fn method(self, name: impl Into<String>, params: &[&TypeRef], returns: &TypeRef) -> Self {
        self.method_throws(name, params, returns, &[])
    }

    /// Declare a method with a checked-failure set.
    pub fn method_throws(
        mut self,
        name: impl Into<String>,
        params: &[&TypeRef],
        returns: &TypeRef,
        throws: &[&TypeRef],
    ) -> Self {
        self.methods.push(MethodSpec {
            name: name.into(),
            params: params.iter().map(|p| Arc::clone(*p)).collect(),
            returns: Arc::clone(returns),
            throws: throws.iter().map(|t| Arc::clone(*t)).collect(),
        });
        self
    }

    /// Build a handle holding `scope`.
    ///
    /// References to types of the same scope are stored detached.
    pub(crate) fn build(self, scope: &ScopeRef) -> TypeRef {
        let key = self.key;
        let local = |ty: TypeRef| if ty.defined_in(scope) { ty.detached() } else { ty };
        let methods = self
            .methods
            .into_iter()
            .enumerate()
            .map(|(index, spec)| {
                Arc::new(MethodDescriptor {
                    id: MethodId::new(key, index),
                    name: spec.name,
                    params: spec.params.into_iter().map(local).collect(),
                    returns: local(spec.returns),
                    throws: spec.throws.into_iter().map(local).collect(),
                })
            })
            .collect();

        let shape = TypeShape {
            key,
            name: self.name,
            kind: self.kind,
            supertypes: self.supertypes.into_iter().map(local).collect(),
            methods,
        };
        Arc::new(TypeDescriptor {
            shape: Arc::new(shape),
            anchor: Anchor::Held(Arc::clone(scope)),
        })
    }
}
