//! The per-thread current resolution scope.
//!
//! [`with_scope`] substitutes a scope for the dynamic extent of one call and
//! restores whatever was active before, on normal return, on `Err`, and
//! while unwinding from a panic. Nested calls on one thread compose like a
//! stack because each guard remembers only its own predecessor.
//!
//! [`ProxyFactory::rebind`] builds on it: the rebound object runs every call
//! on the wrapped reference inside `with_scope`.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use kaijutsu_reflect::{
    Failure, MethodDescriptor, Object, ObjectRef, ResolutionScope, ScopeRef, TypeBuilder, TypeRef,
    Value, invoke_identity,
};
use tracing::{debug, trace};

use crate::proxy::ProxyFactory;

thread_local! {
    static CURRENT: RefCell<Option<ScopeRef>> = const { RefCell::new(None) };
}

/// The scope installed by the innermost active [`with_scope`] on this thread.
pub fn active() -> Option<ScopeRef> {
    CURRENT.with(|current| current.borrow().clone())
}

/// The active scope, or the system scope when none is installed.
pub fn current() -> ScopeRef {
    active().unwrap_or_else(|| Arc::clone(ResolutionScope::system()))
}

/// Run `action` with `scope` as this thread's current scope.
pub fn with_scope<R>(scope: &ScopeRef, action: impl FnOnce() -> R) -> R {
    let _guard = ScopeGuard::enter(scope);
    action()
}

struct ScopeGuard {
    previous: Option<ScopeRef>,
}

impl ScopeGuard {
    fn enter(scope: &ScopeRef) -> Self {
        trace!(scope = %scope.name(), "Entering scope");
        let previous = CURRENT.with(|current| current.replace(Some(Arc::clone(scope))));
        Self { previous }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        trace!(restored = previous.as_ref().map(|s| s.name()), "Leaving scope");
        // The slot is gone only during thread teardown; nothing to restore then.
        let _ = CURRENT.try_with(|current| *current.borrow_mut() = previous);
    }
}

// ============================================================================
// Rebinding
// ============================================================================

/// The synthesized type of a reference rebound into `scope`, shared by every
/// rebind of the same remote type into that scope.
fn rebound_type(remote_type: &TypeRef, scope: &ScopeRef) -> TypeRef {
    scope.derived(remote_type.key(), "rebound", || {
        debug!(remote = %remote_type.name(), scope = %scope.name(), "Synthesizing rebound type");
        remote_type
            .interfaces()
            .iter()
            .fold(TypeBuilder::class(format!("$Rebound({})", remote_type.name())), |b, i| b.extends(i))
    })
}

/// A remote reference whose calls run under a fixed resolution scope.
///
/// Presents the interface set of the wrapped reference's runtime type.
/// Results are transformed with substitution, so remote references they
/// contain come back rebound to the same scope.
pub struct Rebound {
    remote: ObjectRef,
    scope: ScopeRef,
    proxy_type: TypeRef,
    factory: ProxyFactory,
}

impl Rebound {
    pub fn remote(&self) -> &ObjectRef {
        &self.remote
    }

    pub fn scope(&self) -> &ScopeRef {
        &self.scope
    }
}

impl Object for Rebound {
    fn runtime_type(&self) -> TypeRef {
        Arc::clone(&self.proxy_type)
    }

    fn invoke(&self, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Failure> {
        with_scope(&self.scope, || {
            if method.is_identity_contract() {
                return invoke_identity(self, method, args);
            }
            self.factory
                .invoke_remote(&self.remote, method, method, args, &self.scope, true)
        })
    }

    fn equals(&self, other: &Value) -> bool {
        match other.as_object().and_then(|o| o.as_any().downcast_ref::<Rebound>()) {
            Some(rebound) => self.remote.equals(&Value::Object(Arc::clone(&rebound.remote))),
            None => self.remote.equals(other),
        }
    }

    fn hash_code(&self) -> i64 {
        self.remote.hash_code()
    }

    fn describe(&self) -> String {
        self.remote.describe()
    }

    fn is_remote(&self) -> bool {
        self.remote.is_remote()
    }

    fn cast_to_class_name(&self) -> Option<String> {
        self.remote.cast_to_class_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Rebound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rebound")
            .field("remote", &self.remote)
            .field("scope", &self.scope.name())
            .finish()
    }
}

impl ProxyFactory {
    /// Wrap `remote` so every call on it runs with `scope` current.
    ///
    /// Rebinding an already-rebound reference to the scope it is bound to
    /// returns it unchanged.
    pub fn rebind(&self, remote: ObjectRef, scope: &ScopeRef) -> ObjectRef {
        if let Some(existing) = remote.as_any().downcast_ref::<Rebound>()
            && existing.scope.id() == scope.id()
        {
            return remote;
        }

        let proxy_type = rebound_type(&remote.runtime_type(), scope);
        Arc::new(Rebound {
            remote,
            scope: Arc::clone(scope),
            proxy_type,
            factory: self.clone(),
        })
    }
}
