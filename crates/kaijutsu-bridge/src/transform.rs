//! Result rewriting.
//!
//! Transport marshals reference identity, not behavior, so a remote
//! reference nested in a call result must be turned into something the
//! receiving side can call. Rules, first match wins:
//!
//! | value                        | outcome                                      |
//! |------------------------------|----------------------------------------------|
//! | remote, advertises a class   | local proxy for the declared interface, or   |
//! |                              | for the advertised class resolved in scope   |
//! | remote, no advertisement     | rebound to the scope when substituting       |
//! | sequence, declared interface | new sequence, each element rewritten         |
//! | array                        | each element rewritten in place              |
//! | anything else                | unchanged                                    |
//!
//! Elements are rewritten against the root `Object` type.

use std::sync::Arc;

use kaijutsu_reflect::{Failure, Object, ScopeRef, TypeRef, Value, builtin};
use tracing::trace;

use crate::error::BridgeError;
use crate::proxy::ProxyFactory;

impl ProxyFactory {
    /// Rewrite `value` so every remote reference it holds is locally callable.
    ///
    /// Fails only when a remote value advertises a class `scope` cannot
    /// resolve.
    pub fn transform(
        &self,
        value: Value,
        declared: &TypeRef,
        scope: &ScopeRef,
        substitute: bool,
    ) -> Result<Value, Failure> {
        match value {
            Value::Object(obj) if obj.is_remote() => {
                if let Some(class_name) = obj.cast_to_class_name() {
                    let class = if declared.is_interface() {
                        Arc::clone(declared)
                    } else {
                        scope.resolve(&class_name).ok_or_else(|| BridgeError::ClassResolution {
                            class_name: class_name.clone(),
                            scope: scope.name().to_string(),
                        })?
                    };
                    trace!(advertised = %class_name, presented = %class.name(), "Materializing remote value");
                    Ok(Value::Object(self.cast_to_local(obj, &class)))
                } else if substitute {
                    Ok(Value::Object(self.rebind(obj, scope)))
                } else {
                    Ok(Value::Object(obj))
                }
            }
            Value::Sequence(items) if declared.is_interface() => {
                let object = &builtin::types().object;
                let items = items
                    .into_iter()
                    .map(|item| self.transform(item, object, scope, substitute))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Sequence(items))
            }
            Value::Array(mut items) => {
                let object = &builtin::types().object;
                for slot in items.iter_mut() {
                    let item = std::mem::take(slot);
                    *slot = self.transform(item, object, scope, substitute)?;
                }
                Ok(Value::Array(items))
            }
            other => Ok(other),
        }
    }

    /// [`transform`](Self::transform) with the scope that defined
    /// `requestor`'s type, without substitution.
    pub fn transform_for(&self, value: Value, declared: &TypeRef, requestor: &dyn Object) -> Result<Value, Failure> {
        let scope = requestor.runtime_type().defining_scope();
        self.transform(value, declared, &scope, false)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::scope::Rebound;
    use crate::LocalProxy;
    use kaijutsu_reflect::{MethodDescriptor, ResolutionScope, TypeBuilder};

    #[derive(Debug)]
    struct Stub {
        ty: TypeRef,
        advertises: Option<String>,
    }

    impl Object for Stub {
        fn runtime_type(&self) -> TypeRef {
            Arc::clone(&self.ty)
        }

        fn invoke(&self, _method: &MethodDescriptor, _args: &[Value]) -> Result<Value, Failure> {
            Ok(Value::Null)
        }

        fn is_remote(&self) -> bool {
            true
        }

        fn cast_to_class_name(&self) -> Option<String> {
            self.advertises.clone()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn stub(scope: &ScopeRef, advertises: Option<&str>) -> Value {
        let ty = scope.define_anonymous(TypeBuilder::class("StubRef"));
        Value::object(Stub {
            ty,
            advertises: advertises.map(str::to_string),
        })
    }

    fn presented(value: &Value) -> TypeRef {
        let obj = value.as_object().unwrap();
        obj.as_any().downcast_ref::<LocalProxy>().unwrap().interface().clone()
    }

    #[test]
    fn test_plain_values_unchanged() {
        let t = builtin::types();
        let factory = ProxyFactory::default();
        let scope = ResolutionScope::new("plain");

        for value in [Value::Int(3), Value::from("text"), Value::Null, Value::Bool(true)] {
            let out = factory.transform(value.clone(), &t.object, &scope, true).unwrap();
            assert_eq!(out, value);
        }
    }

    #[test]
    fn test_castable_resolved_in_scope() {
        let t = builtin::types();
        let factory = ProxyFactory::default();
        let scope = ResolutionScope::new("caller");
        let fancy = scope.define(TypeBuilder::class("FancyText")).unwrap();

        let out = factory
            .transform(stub(&scope, Some("FancyText")), &t.text, &scope, false)
            .unwrap();
        assert_eq!(presented(&out), fancy);
    }

    #[test]
    fn test_castable_keeps_declared_interface() {
        let factory = ProxyFactory::default();
        let scope = ResolutionScope::new("caller");
        let shown = scope.define(TypeBuilder::interface("Shown")).unwrap();

        let out = factory
            .transform(stub(&scope, Some("NotEvenDefined")), &shown, &scope, false)
            .unwrap();
        assert_eq!(presented(&out), shown);
    }

    #[test]
    fn test_unresolvable_class_fails() {
        let t = builtin::types();
        let factory = ProxyFactory::default();
        let scope = ResolutionScope::new("caller");

        let err = factory
            .transform(stub(&scope, Some("Missing")), &t.object, &scope, false)
            .unwrap_err();
        assert!(err.is_exactly(&t.class_resolution_failure));
        assert!(err.message().contains("Missing"));
    }

    #[test]
    fn test_plain_remote_rebound_only_when_substituting() {
        let t = builtin::types();
        let factory = ProxyFactory::default();
        let scope = ResolutionScope::new("target");
        let remote = stub(&scope, None);

        let kept = factory.transform(remote.clone(), &t.object, &scope, false).unwrap();
        assert_eq!(kept, remote);

        let rebound = factory.transform(remote, &t.object, &scope, true).unwrap();
        let rebound = rebound.as_object().unwrap();
        let rebound = rebound.as_any().downcast_ref::<Rebound>().unwrap();
        assert_eq!(*rebound.scope(), scope);
    }

    #[test]
    fn test_sequence_rewritten_only_for_interfaces() {
        let t = builtin::types();
        let factory = ProxyFactory::default();
        let scope = ResolutionScope::new("caller");
        scope.define(TypeBuilder::class("FancyText")).unwrap();
        let items = vec![stub(&scope, Some("FancyText")), Value::Int(1)];

        let out = factory
            .transform(Value::Sequence(items.clone()), &t.sequence, &scope, false)
            .unwrap();
        let out = out.as_items().unwrap();
        assert!(out[0].as_object().unwrap().as_any().is::<LocalProxy>());
        assert_eq!(out[1], Value::Int(1));

        let untouched = factory
            .transform(Value::Sequence(items), &t.array, &scope, false)
            .unwrap();
        assert!(untouched.as_items().unwrap()[0].is_remote());
    }

    #[test]
    fn test_array_rewritten_in_place() {
        let t = builtin::types();
        let factory = ProxyFactory::default();
        let scope = ResolutionScope::new("caller");
        scope.define(TypeBuilder::class("FancyText")).unwrap();

        let out = factory
            .transform(
                Value::Array(vec![Value::Null, stub(&scope, Some("FancyText"))]),
                &t.array,
                &scope,
                false,
            )
            .unwrap();
        let out = out.as_items().unwrap();
        assert!(out[0].is_null());
        assert!(!out[1].is_remote());
    }

    #[test]
    fn test_transform_for_uses_requestor_scope() {
        let t = builtin::types();
        let factory = ProxyFactory::default();
        let caller = ResolutionScope::new("caller");
        let fancy = caller.define(TypeBuilder::class("FancyText")).unwrap();
        let requestor = Stub {
            ty: caller.define(TypeBuilder::class("Requestor")).unwrap(),
            advertises: None,
        };

        let elsewhere = ResolutionScope::new("elsewhere");
        let out = factory
            .transform_for(stub(&elsewhere, Some("FancyText")), &t.object, &requestor)
            .unwrap();
        assert_eq!(presented(&out), fancy);
    }
}
