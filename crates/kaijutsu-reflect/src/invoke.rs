//! Raw reflective invocation.
//!
//! This is the dispatch primitive the bridge sits on top of. Like a
//! reflective `Method.invoke`, it validates the argument count itself and
//! reports every failure raised by the target wrapped in an
//! `InvocationTargetException`, so callers always see one extra layer.

use tracing::trace;

use crate::builtin;
use crate::failure::Failure;
use crate::object::Object;
use crate::types::MethodDescriptor;
use crate::value::Value;

/// Invoke `method` on `target`.
///
/// An arity mismatch is an `IllegalArgumentException` raised here, not
/// wrapped. Anything the target raises comes back inside an
/// `InvocationTargetException`.
pub fn invoke(target: &dyn Object, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Failure> {
    if args.len() != method.arity() {
        return Err(Failure::new(
            &builtin::types().illegal_argument,
            format!(
                "{} expects {} argument(s), got {}",
                method.name(),
                method.arity(),
                args.len()
            ),
        ));
    }

    trace!(method = %method.name(), target = %target.runtime_type().name(), "reflective invoke");
    target
        .invoke(method, args)
        .map_err(|cause| Failure::wrap(&builtin::types().invocation_target, cause))
}
