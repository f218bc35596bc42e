//! Builtin types and failure kinds, defined once in the system scope.
//!
//! ```text
//! Object ── equals(Object) -> Bool, hashCode() -> Int, toString() -> Text
//! Text  Int  Float  Bool  Array  «Sequence»
//!
//! Throwable
//!  ├── Exception                         checked
//!  │    ├── RuntimeException             unchecked
//!  │    │    ├── UndeclaredThrowableException   (wrapper)
//!  │    │    ├── IllegalArgumentException
//!  │    │    └── ClassResolutionFailure
//!  │    ├── InvocationTargetException    (wrapper)
//!  │    └── RemoteException
//!  │         └── ServerError             (transport wrapper)
//!  └── Error                             fatal
//!       └── ResolutionFailure
//! ```

use std::sync::LazyLock;

use crate::ids::TypeKey;
use crate::scope::{ResolutionScope, ScopeRef};
use crate::types::{TypeBuilder, TypeRef};

/// Handles to every builtin type.
#[derive(Debug)]
pub struct BuiltinTypes {
    pub object: TypeRef,
    pub text: TypeRef,
    pub int: TypeRef,
    pub float: TypeRef,
    pub bool: TypeRef,
    pub sequence: TypeRef,
    pub array: TypeRef,

    pub throwable: TypeRef,
    pub exception: TypeRef,
    pub runtime: TypeRef,
    pub error: TypeRef,
    pub invocation_target: TypeRef,
    pub undeclared_throwable: TypeRef,
    pub remote: TypeRef,
    pub server_error: TypeRef,
    pub illegal_argument: TypeRef,
    pub resolution_failure: TypeRef,
    pub class_resolution_failure: TypeRef,
}

struct System {
    scope: ScopeRef,
    types: BuiltinTypes,
}

static SYSTEM: LazyLock<System> = LazyLock::new(System::bootstrap);

impl System {
    fn bootstrap() -> Self {
        let scope = ResolutionScope::root("system");
        let define = |builder: TypeBuilder| {
            let ty = scope.define_anonymous(builder);
            scope.register(&ty);
            ty
        };

        // `equals` takes the root type itself. The parameter is a method-less
        // twin sharing the root's key, so it compares equal to `Object`.
        let object_key = TypeKey::new();
        let object_param = scope.define_anonymous(TypeBuilder::class("Object").with_key(object_key));

        let text = define(TypeBuilder::class("Text"));
        let int = define(TypeBuilder::class("Int"));
        let float = define(TypeBuilder::class("Float"));
        let bool = define(TypeBuilder::class("Bool"));
        let object = define(
            TypeBuilder::class("Object")
                .with_key(object_key)
                .method("equals", &[&object_param], &bool)
                .method("hashCode", &[], &int)
                .method("toString", &[], &text),
        );
        let sequence = define(TypeBuilder::interface("Sequence"));
        let array = define(TypeBuilder::class("Array"));

        let throwable = define(TypeBuilder::class("Throwable"));
        let exception = define(TypeBuilder::class("Exception").extends(&throwable));
        let runtime = define(TypeBuilder::class("RuntimeException").extends(&exception));
        let error = define(TypeBuilder::class("Error").extends(&throwable));
        let invocation_target =
            define(TypeBuilder::class("InvocationTargetException").extends(&exception));
        let undeclared_throwable =
            define(TypeBuilder::class("UndeclaredThrowableException").extends(&runtime));
        let remote = define(TypeBuilder::class("RemoteException").extends(&exception));
        let server_error = define(TypeBuilder::class("ServerError").extends(&remote));
        let illegal_argument =
            define(TypeBuilder::class("IllegalArgumentException").extends(&runtime));
        let resolution_failure = define(TypeBuilder::class("ResolutionFailure").extends(&error));
        let class_resolution_failure =
            define(TypeBuilder::class("ClassResolutionFailure").extends(&runtime));

        let types = BuiltinTypes {
            object,
            text,
            int,
            float,
            bool,
            sequence,
            array,
            throwable,
            exception,
            runtime,
            error,
            invocation_target,
            undeclared_throwable,
            remote,
            server_error,
            illegal_argument,
            resolution_failure,
            class_resolution_failure,
        };
        Self { scope, types }
    }
}

/// The builtin types.
pub fn types() -> &'static BuiltinTypes {
    &SYSTEM.types
}

pub(crate) fn system_scope() -> &'static ScopeRef {
    &SYSTEM.scope
}
