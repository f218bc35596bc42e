//! Local proxies over remote references.
//!
//! [`ProxyFactory::cast_to_local`] wraps a remote reference in a
//! [`LocalProxy`] presenting a chosen interface. Each call on the proxy:
//!
//! 1. serves `equals`/`hashCode`/`toString` from the backing reference,
//! 2. looks the method up in the cached method map for
//!    (backing type, interface), failing with `ResolutionFailure` on a miss,
//! 3. invokes the remote method reflectively with the original arguments,
//! 4. on success, rewrites the result against the declared return type,
//! 5. on failure, unwraps and reclassifies it against the local method.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;
use kaijutsu_reflect::{
    Failure, MethodDescriptor, Object, ObjectRef, ScopeRef, TypeDescriptor, TypeRef, Value, invoke_identity,
};
use tracing::warn;

use crate::config::{BridgeConfig, ConfigError};
use crate::constants::DEFAULT_WARN_ON_UNMATCHED;
use crate::error::BridgeError;
use crate::resolver::{self, MethodKey, MethodMap};
use crate::unwrap::{RethrowPolicy, Unwrapper};

/// Builds local proxies and carries the failure-handling configuration
/// they share. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct ProxyFactory {
    inner: Arc<FactoryInner>,
}

#[derive(Debug)]
struct FactoryInner {
    unwrapper: Unwrapper,
    policy: RethrowPolicy,
    warn_on_unmatched: bool,
    /// Pairs this factory has already warned about.
    warned: DashSet<MethodKey>,
}

impl Default for FactoryInner {
    fn default() -> Self {
        Self {
            unwrapper: Unwrapper::default(),
            policy: RethrowPolicy::default(),
            warn_on_unmatched: DEFAULT_WARN_ON_UNMATCHED,
            warned: DashSet::new(),
        }
    }
}

impl ProxyFactory {
    /// Build a factory, resolving the configured kind names in the system scope.
    pub fn new(config: &BridgeConfig) -> Result<Self, ConfigError> {
        let inner = FactoryInner {
            unwrapper: Unwrapper::new(config.resolve_wrapper_kinds()?),
            policy: RethrowPolicy::new(config.resolve_server_error_kind()?),
            warn_on_unmatched: config.warn_on_unmatched,
            warned: DashSet::new(),
        };
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn unwrapper(&self) -> &Unwrapper {
        &self.inner.unwrapper
    }

    pub fn policy(&self) -> &RethrowPolicy {
        &self.inner.policy
    }

    /// Present `remote` as `interface`.
    ///
    /// The proxy resolves classes in the scope that defined `interface`.
    pub fn cast_to_local(&self, remote: ObjectRef, interface: &TypeRef) -> Arc<LocalProxy> {
        Arc::new(LocalProxy {
            scope: interface.defining_scope(),
            interface: Arc::clone(interface),
            backing: remote,
            factory: self.clone(),
        })
    }

    /// The backing reference of `candidate`, when it is a local proxy whose
    /// backing reference is an instance of `expected`.
    pub fn cast_to_remote(&self, candidate: &ObjectRef, expected: &TypeRef) -> Option<ObjectRef> {
        let proxy = candidate.as_any().downcast_ref::<LocalProxy>()?;
        expected
            .is_assignable_from(&proxy.backing.runtime_type())
            .then(|| Arc::clone(&proxy.backing))
    }

    /// Strip wrapper layers with this factory's wrapper kinds.
    pub fn unwrap<'a>(&self, failure: &'a Failure) -> &'a Failure {
        self.inner.unwrapper.unwrap(failure)
    }

    /// Warn, once per factory and type pair, about interface methods the
    /// remote type cannot serve. Returns whether a warning was logged.
    pub(crate) fn warn_unmatched(&self, remote: &TypeDescriptor, local: &TypeDescriptor, map: &MethodMap) -> bool {
        if !self.inner.warn_on_unmatched || map.unmatched().is_empty() {
            return false;
        }
        if !self.inner.warned.insert(MethodKey::new(remote, local)) {
            return false;
        }
        let missing: Vec<String> = map.unmatched().iter().map(|m| m.signature()).collect();
        warn!(remote = %remote.name(), local = %local.name(), ?missing, "Interface methods without a remote counterpart");
        true
    }

    /// Invoke `remote_method` on `target` and present the outcome as a call
    /// to `local_method`.
    pub(crate) fn invoke_remote(
        &self,
        target: &ObjectRef,
        local_method: &MethodDescriptor,
        remote_method: &MethodDescriptor,
        args: &[Value],
        scope: &ScopeRef,
        substitute: bool,
    ) -> Result<Value, Failure> {
        match kaijutsu_reflect::invoke(&**target, remote_method, args) {
            Ok(result) => self.transform(result, local_method.returns(), scope, substitute),
            Err(raw) => {
                let cause = self.inner.unwrapper.unwrap_owned(raw);
                Err(self.inner.policy.rethrow(cause, local_method))
            }
        }
    }
}

/// A local object presenting one interface over a remote reference.
pub struct LocalProxy {
    backing: ObjectRef,
    interface: TypeRef,
    scope: ScopeRef,
    factory: ProxyFactory,
}

impl LocalProxy {
    pub fn backing(&self) -> &ObjectRef {
        &self.backing
    }

    pub fn interface(&self) -> &TypeRef {
        &self.interface
    }

    /// Scope used for class lookups while servicing calls.
    pub fn scope(&self) -> &ScopeRef {
        &self.scope
    }
}

impl Object for LocalProxy {
    fn runtime_type(&self) -> TypeRef {
        Arc::clone(&self.interface)
    }

    #[tracing::instrument(skip(self, args), fields(bridge.interface = %self.interface.name(), bridge.method = %method.name()))]
    fn invoke(&self, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Failure> {
        if method.is_identity_contract() {
            return invoke_identity(self, method, args);
        }

        let backing_type = self.backing.runtime_type();
        let map = resolver::resolve(&backing_type, &self.interface);
        self.factory.warn_unmatched(&backing_type, &self.interface, &map);
        let Some(remote_method) = map.get(method) else {
            return Err(BridgeError::Resolution {
                method: method.signature(),
                backing_type: backing_type.name().to_string(),
            }
            .into());
        };

        self.factory
            .invoke_remote(&self.backing, method, remote_method, args, &self.scope, false)
    }

    /// Proxies compare by their backing references.
    fn equals(&self, other: &Value) -> bool {
        match other.as_object().and_then(|o| o.as_any().downcast_ref::<LocalProxy>()) {
            Some(proxy) => self.backing.equals(&Value::Object(Arc::clone(&proxy.backing))),
            None => self.backing.equals(other),
        }
    }

    fn hash_code(&self) -> i64 {
        self.backing.hash_code()
    }

    fn describe(&self) -> String {
        self.backing.describe()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for LocalProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalProxy")
            .field("interface", &self.interface.name())
            .field("backing", &self.backing)
            .field("scope", &self.scope.name())
            .finish()
    }
}
