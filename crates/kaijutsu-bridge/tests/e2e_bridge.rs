//! End-to-end tests for proxied calls across scopes.
//!
//! # Tiers
//!
//! - **Tier 1:** Materialization: remote results become proxies of classes
//!   resolved in the caller's scope, including inside sequences
//! - **Tier 2:** Failures: declared, undeclared, transport-wrapped, and
//!   missing-method failures as the caller sees them
//! - **Tier 3:** Identity and round trips through `cast_to_remote`
//! - **Tier 4:** Rebinding: calls run with the target scope current
//! - **Tier 5:** Method resolution properties under repetition and threads

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use kaijutsu_bridge::{LocalProxy, ProxyFactory, Rebound, resolver};
use kaijutsu_reflect::{
    Failure, MethodDescriptor, Object, ObjectExt, ObjectRef, ResolutionScope, ScopeRef, TypeBuilder, TypeRef, Value,
    builtin,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Shared test setup
// ============================================================================

type Handler = dyn Fn(&MethodDescriptor, &[Value]) -> Result<Value, Failure> + Send + Sync;

/// A stand-in for a transport stub: remote, optionally castable, with calls
/// answered by a closure.
struct FakeRemote {
    ty: TypeRef,
    advertises: Option<String>,
    handler: Box<Handler>,
}

impl FakeRemote {
    fn new(
        ty: &TypeRef,
        handler: impl Fn(&MethodDescriptor, &[Value]) -> Result<Value, Failure> + Send + Sync + 'static,
    ) -> ObjectRef {
        Arc::new(Self {
            ty: ty.clone(),
            advertises: None,
            handler: Box::new(handler),
        })
    }

    fn castable(ty: &TypeRef, class_name: &str) -> ObjectRef {
        let label = class_name.to_string();
        Arc::new(Self {
            ty: ty.clone(),
            advertises: Some(class_name.to_string()),
            handler: Box::new(move |_, _| Ok(Value::Text(format!("*{label}*")))),
        })
    }
}

impl Object for FakeRemote {
    fn runtime_type(&self) -> TypeRef {
        self.ty.clone()
    }

    fn invoke(&self, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Failure> {
        (self.handler)(method, args)
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

impl fmt::Debug for FakeRemote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeRemote({})", self.ty.name())
    }
}

/// Types as the server process sees them.
struct Server {
    scope: ScopeRef,
    greeter_impl: TypeRef,
    fancy_impl: TypeRef,
    refused: TypeRef,
}

/// Types as the calling process sees them. Same names, distinct types.
struct Caller {
    scope: ScopeRef,
    greeter: TypeRef,
    fancy: TypeRef,
    refused: TypeRef,
}

fn server() -> Server {
    let t = builtin::types();
    let scope = ResolutionScope::new("server");
    let fancy = scope
        .define(TypeBuilder::class("FancyText").method("render", &[], &t.text))
        .unwrap();
    let refused = scope
        .define(TypeBuilder::class("GreetingRefused").extends(&t.exception))
        .unwrap();
    let greeter_impl = scope
        .define(
            TypeBuilder::class("GreeterImpl")
                .method("greet", &[&t.object], &t.object)
                .method("greetAll", &[&t.object], &t.object)
                .method("audit", &[], &t.object),
        )
        .unwrap();
    let fancy_impl = scope
        .define(TypeBuilder::class("FancyTextImpl").method("render", &[], &t.text))
        .unwrap();
    Server {
        scope,
        greeter_impl,
        fancy_impl,
        refused,
    }
}

fn caller() -> Caller {
    let t = builtin::types();
    let scope = ResolutionScope::new("caller");
    let fancy = scope
        .define(TypeBuilder::class("FancyText").method("render", &[], &t.text))
        .unwrap();
    let refused = scope
        .define(TypeBuilder::class("GreetingRefused").extends(&t.exception))
        .unwrap();
    let greeter = scope
        .define(
            TypeBuilder::interface("Greeter")
                .method_throws("greet", &[&t.text], &t.text, &[&refused])
                .method("greetAll", &[&t.sequence], &t.sequence)
                .method("audit", &[], &t.object)
                .method("wave", &[], &t.text),
        )
        .unwrap();
    Caller {
        scope,
        greeter,
        fancy,
        refused,
    }
}

fn presented(value: &Value) -> TypeRef {
    let obj = value.as_object().expect("expected an object");
    obj.as_any()
        .downcast_ref::<LocalProxy>()
        .expect("expected a local proxy")
        .interface()
        .clone()
}

// ============================================================================
// Tier 1: Materialization
// ============================================================================

#[test]
fn test_greet_returns_fancy_text_from_callers_scope() {
    let server = server();
    let caller = caller();
    let fancy_impl = server.fancy_impl.clone();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, _| {
        Ok(Value::Object(FakeRemote::castable(&fancy_impl, "FancyText")))
    });

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let result = greeter.call("greet", &[Value::from("ada")]).unwrap();

    let class = presented(&result);
    assert_eq!(class, caller.fancy);
    assert!(class != server.scope.resolve("FancyText").unwrap());
    assert_eq!(class.defining_scope(), caller.scope);

    let fancy = result.as_object().unwrap();
    assert_eq!(fancy.call("render", &[]).unwrap(), Value::from("*FancyText*"));
}

#[test]
fn test_interface_handle_outlives_dropped_scope_handle() {
    let t = builtin::types();
    let server = server();
    let (greeter_ty, fancy) = {
        let scope = ResolutionScope::new("short-lived");
        let fancy = scope.define(TypeBuilder::class("FancyText")).unwrap();
        let greeter = scope
            .define(TypeBuilder::interface("Greeter").method("greet", &[&t.text], &t.text))
            .unwrap();
        (greeter, fancy)
    };
    let fancy_impl = server.fancy_impl.clone();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, _| {
        Ok(Value::Object(FakeRemote::castable(&fancy_impl, "FancyText")))
    });

    let greeter = ProxyFactory::default().cast_to_local(remote, &greeter_ty);
    assert_eq!(greeter.scope().name(), "short-lived");

    let result = greeter.call("greet", &[Value::from("ada")]).unwrap();
    let class = presented(&result);
    assert_eq!(class, fancy);
    assert_eq!(class.defining_scope().name(), "short-lived");
}

#[test]
fn test_sequence_of_castables_becomes_proxies() {
    let server = server();
    let caller = caller();
    let fancy_impl = server.fancy_impl.clone();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, args| {
        let names = args[0].as_items().unwrap_or_default();
        Ok(Value::Sequence(
            names
                .iter()
                .map(|_| Value::Object(FakeRemote::castable(&fancy_impl, "FancyText")))
                .collect(),
        ))
    });

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let names = Value::Sequence(vec![Value::from("ada"), Value::from("grace"), Value::from("edsger")]);
    let result = greeter.call("greetAll", &[names]).unwrap();

    let items = result.as_items().unwrap();
    assert_eq!(items.len(), 3);
    for item in items {
        assert!(!item.is_remote());
        assert_eq!(presented(item), caller.fancy);
    }
}

#[test]
fn test_unresolvable_advertised_class() {
    let t = builtin::types();
    let server = server();
    let caller = caller();
    let fancy_impl = server.fancy_impl.clone();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, _| {
        Ok(Value::Object(FakeRemote::castable(&fancy_impl, "PlainText")))
    });

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let err = greeter.call("greet", &[Value::from("ada")]).unwrap_err();
    assert!(err.is_exactly(&t.class_resolution_failure));
    assert!(err.message().contains("PlainText"));
    assert!(err.message().contains("caller"));
}

// ============================================================================
// Tier 2: Failures
// ============================================================================

#[test]
fn test_declared_checked_failure_keeps_its_kind() {
    let server = server();
    let caller = caller();
    let refused = caller.refused.clone();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, _| Err(Failure::new(&refused, "not today")));

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let err = greeter.call("greet", &[Value::from("ada")]).unwrap_err();

    assert!(err.is_exactly(&caller.refused));
    assert_eq!(err.message(), "not today");
}

#[test]
fn test_server_error_wrapper_is_peeled() {
    let t = builtin::types();
    let server = server();
    let caller = caller();
    let refused = caller.refused.clone();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, _| {
        Err(Failure::new(&t.server_error, "remote side").with_cause(Failure::new(&refused, "not today")))
    });

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let err = greeter.call("greet", &[Value::from("ada")]).unwrap_err();
    assert!(err.is_exactly(&caller.refused));
}

#[test]
fn test_undeclared_checked_failure_is_wrapped() {
    let t = builtin::types();
    let server = server();
    let caller = caller();
    let foreign = server.refused.clone();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, _| Err(Failure::new(&foreign, "server kind")));

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let err = greeter.call("greet", &[Value::from("ada")]).unwrap_err();

    // The server's GreetingRefused is not the caller's, so it is undeclared.
    assert!(err.is_exactly(&t.runtime));
    assert!(err.cause().unwrap().is_exactly(&server.refused));
}

#[test]
fn test_unchecked_failure_passes_through() {
    let t = builtin::types();
    let server = server();
    let caller = caller();
    let remote = FakeRemote::new(&server.greeter_impl, move |_, _| {
        Err(Failure::new(&t.illegal_argument, "empty name"))
    });

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let err = greeter.call("audit", &[]).unwrap_err();
    assert!(err.is_exactly(&t.illegal_argument));
    assert_eq!(kaijutsu_bridge::error_message(&err), "empty name");
}

#[test]
fn test_missing_remote_method_names_it() {
    let t = builtin::types();
    let server = server();
    let caller = caller();
    let remote = FakeRemote::new(&server.greeter_impl, |_, _| Ok(Value::Null));

    let greeter = ProxyFactory::default().cast_to_local(remote, &caller.greeter);
    let err = greeter.call("wave", &[]).unwrap_err();

    assert!(err.is_exactly(&t.resolution_failure));
    assert!(err.message().contains("wave"));
    assert!(err.message().contains("GreeterImpl"));
}

// ============================================================================
// Tier 3: Identity and round trips
// ============================================================================

#[test]
fn test_cast_round_trip() {
    let t = builtin::types();
    let server = server();
    let caller = caller();
    let factory = ProxyFactory::default();
    let remote = FakeRemote::new(&server.greeter_impl, |_, _| Ok(Value::Null));

    let proxy: ObjectRef = factory.cast_to_local(Arc::clone(&remote), &caller.greeter);
    let back = factory.cast_to_remote(&proxy, &server.greeter_impl).unwrap();
    assert!(Arc::ptr_eq(&back, &remote));

    // Backed by an incompatible type.
    assert!(factory.cast_to_remote(&proxy, &server.fancy_impl).is_none());
    // Not a proxy at all.
    assert!(factory.cast_to_remote(&remote, &t.object).is_none());
}

#[test]
fn test_proxies_of_one_reference_are_equal() {
    let server = server();
    let caller = caller();
    let factory = ProxyFactory::default();
    let remote = FakeRemote::new(&server.greeter_impl, |_, _| Ok(Value::Null));

    let a = Value::Object(factory.cast_to_local(Arc::clone(&remote), &caller.greeter));
    let b = Value::Object(factory.cast_to_local(Arc::clone(&remote), &caller.greeter));
    assert_eq!(a, b);

    let hash_a = a.as_object().unwrap().call("hashCode", &[]).unwrap();
    assert_eq!(hash_a, Value::Int(remote.hash_code()));
}

// ============================================================================
// Tier 4: Rebinding
// ============================================================================

#[test]
fn test_rebound_calls_run_in_target_scope() {
    let t = builtin::types();
    let scope = ResolutionScope::new("sandbox");
    let named = scope
        .define(TypeBuilder::interface("Named").method("scopeName", &[], &t.text))
        .unwrap();
    let impl_ty = scope
        .define(TypeBuilder::class("NamedImpl").extends(&named))
        .unwrap();
    let remote = FakeRemote::new(&impl_ty, |_, _| Ok(Value::Text(kaijutsu_bridge::current().name().to_string())));

    let target = ResolutionScope::new("target");
    let rebound = ProxyFactory::default().rebind(remote, &target);

    assert_eq!(rebound.call("scopeName", &[]).unwrap(), Value::from("target"));
    assert!(kaijutsu_bridge::active().is_none());
    assert!(named.is_assignable_from(&rebound.runtime_type()));
    assert!(rebound.is_remote());
}

#[test]
fn test_rebound_results_stay_rebound() {
    let t = builtin::types();
    let scope = ResolutionScope::new("sandbox");
    let node = scope
        .define(TypeBuilder::interface("Node").method("next", &[], &t.object))
        .unwrap();
    let node_impl = scope.define(TypeBuilder::class("NodeImpl").extends(&node)).unwrap();
    let tail = FakeRemote::new(&node_impl, |_, _| Ok(Value::Null));
    let head = FakeRemote::new(&node_impl, move |_, _| Ok(Value::Object(Arc::clone(&tail))));

    let target = ResolutionScope::new("target");
    let factory = ProxyFactory::default();
    let rebound = factory.rebind(head, &target);

    let next = rebound.call("next", &[]).unwrap();
    let next = next.as_object().unwrap();
    let next = next.as_any().downcast_ref::<Rebound>().expect("nested reference is rebound");
    assert_eq!(*next.scope(), target);

    // Rebound types are shared per (remote type, scope).
    assert_eq!(next.runtime_type(), rebound.runtime_type());
}

#[test]
fn test_rebound_failures_are_reclassified() {
    let t = builtin::types();
    let scope = ResolutionScope::new("sandbox");
    let job = scope
        .define(TypeBuilder::interface("Job").method("run", &[], &t.object))
        .unwrap();
    let job_impl = scope.define(TypeBuilder::class("JobImpl").extends(&job)).unwrap();
    let remote = FakeRemote::new(&job_impl, move |_, _| Err(Failure::new(&t.exception, "checked")));

    let rebound = ProxyFactory::default().rebind(remote, &ResolutionScope::new("target"));
    let err = rebound.call("run", &[]).unwrap_err();
    assert!(err.is_exactly(&t.runtime));
    assert!(kaijutsu_bridge::active().is_none());
}

// ============================================================================
// Tier 5: Method resolution
// ============================================================================

#[test]
fn test_resolve_is_deterministic() {
    let server = server();
    let caller = caller();

    let shape = |map: &kaijutsu_bridge::MethodMap| -> Vec<(String, String)> {
        map.pairs()
            .map(|(l, r)| (l.signature(), r.signature()))
            .collect()
    };

    let first = shape(&resolver::resolve(&server.greeter_impl, &caller.greeter));
    for _ in 0..10 {
        assert_eq!(shape(&resolver::resolve(&server.greeter_impl, &caller.greeter)), first);
    }
    assert_eq!(first.len(), 3);
}

#[test]
fn test_parameter_matching_is_contravariant() {
    let t = builtin::types();
    let scope = ResolutionScope::new("matching");
    let local = scope
        .define(TypeBuilder::interface("Store").method("put", &[&t.object], &t.bool))
        .unwrap();
    let narrower = scope
        .define(TypeBuilder::class("TextStore").method("put", &[&t.text], &t.bool))
        .unwrap();
    let equal = scope
        .define(TypeBuilder::class("AnyStore").method("put", &[&t.object], &t.bool))
        .unwrap();

    assert!(resolver::resolve(&narrower, &local).is_empty());
    assert_eq!(resolver::resolve(&equal, &local).len(), 1);

    let local_text = scope
        .define(TypeBuilder::interface("TextSink").method("put", &[&t.text], &t.bool))
        .unwrap();
    assert_eq!(resolver::resolve(&equal, &local_text).len(), 1);
}

#[test]
fn test_concurrent_resolution_agrees() {
    let server = server();
    let caller = caller();
    let remote_ty = server.greeter_impl.clone();
    let local = caller.greeter.clone();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let remote_ty = remote_ty.clone();
            let local = local.clone();
            std::thread::spawn(move || {
                let map = resolver::resolve(&remote_ty, &local);
                map.pairs().map(|(l, r)| (l.id(), r.id())).collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
