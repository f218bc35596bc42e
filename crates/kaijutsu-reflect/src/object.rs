//! The object model: anything a method can be invoked on.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::builtin;
use crate::error::ReflectError;
use crate::failure::Failure;
use crate::types::{MethodDescriptor, TypeRef};
use crate::value::Value;

/// Shared handle to an object.
pub type ObjectRef = Arc<dyn Object>;

/// An invocable object: a local value, a remote reference, or a proxy.
///
/// The identity contract (`equals`, `hash_code`, `describe`) defaults to
/// pointer identity. Remote references override `is_remote`, and those that
/// want to be materialized as a specific local type also advertise its name
/// through `cast_to_class_name`.
pub trait Object: Any + Send + Sync + fmt::Debug {
    /// The concrete type of this object.
    fn runtime_type(&self) -> TypeRef;

    /// Invoke one of the runtime type's methods.
    fn invoke(&self, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Failure>;

    fn equals(&self, other: &Value) -> bool {
        match other {
            Value::Object(o) => address(self) == address(&**o),
            _ => false,
        }
    }

    fn hash_code(&self) -> i64 {
        address(self) as i64
    }

    fn describe(&self) -> String {
        format!("{}@{:x}", self.runtime_type().name(), address(self))
    }

    /// Whether method calls on this object execute in another process.
    fn is_remote(&self) -> bool {
        false
    }

    /// Fully-qualified name of the local type this remote value wants to be
    /// presented as. Only meaningful when `is_remote` is true.
    fn cast_to_class_name(&self) -> Option<String> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

fn address<T: ?Sized>(obj: &T) -> usize {
    (obj as *const T).cast::<()>() as usize
}

/// Serve one of the identity-contract methods from the trait methods of `obj`.
pub fn invoke_identity<T: Object + ?Sized>(
    obj: &T,
    method: &MethodDescriptor,
    args: &[Value],
) -> Result<Value, Failure> {
    match (method.name(), args) {
        ("equals", [other]) => Ok(Value::Bool(obj.equals(other))),
        ("hashCode", []) => Ok(Value::Int(obj.hash_code())),
        ("toString", []) => Ok(Value::Text(obj.describe())),
        _ => Err(ReflectError::NoSuchMethod {
            type_name: builtin::types().object.name().to_string(),
            name: method.name().to_string(),
            arity: args.len(),
        }
        .into()),
    }
}

/// Call a method by name, resolved against the object's runtime type.
pub trait ObjectExt {
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, Failure>;
}

impl<T: Object + ?Sized> ObjectExt for T {
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, Failure> {
        let ty = self.runtime_type();
        let method = ty
            .find_method(name, args.len())
            .or_else(|| builtin::types().object.find_method(name, args.len()))
            .ok_or_else(|| ReflectError::NoSuchMethod {
                type_name: ty.name().to_string(),
                name: name.to_string(),
                arity: args.len(),
            })?;

        if method.is_identity_contract() {
            invoke_identity(self, &method, args)
        } else {
            self.invoke(&method, args)
        }
    }
}
