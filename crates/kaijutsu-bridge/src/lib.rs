//! Remote-object bridging for kaijutsu.
//!
//! Turns an opaque remote reference into a local object that can be called
//! exactly like an in-process one. Three things make that more than a thin
//! forwarding layer:
//!
//! - **Nested references.** Results may carry further remote references,
//!   directly or inside sequences and arrays. Each is re-proxied.
//! - **Advertised classes.** A remote value can ask to be presented as a
//!   concrete local class, which is resolved in a caller-chosen scope.
//! - **Wrapped failures.** Failures come back inside dispatch wrappers.
//!   They are stripped and reclassified against the local method's contract.
//!
//! Transport, wire format, and endpoint discovery are not handled here.
//!
//! # Components
//!
//! |-------------------------------|----------------------------------------|
//! | Item                          | Role                                   |
//! |-------------------------------|----------------------------------------|
//! | [`resolver::resolve`]         | Cached local → remote method maps      |
//! | [`Unwrapper`]                 | Strips wrapper failure layers          |
//! | [`RethrowPolicy`]             | Reclassifies the unwrapped failure     |
//! | [`ProxyFactory::transform`]   | Re-proxies references inside results   |
//! | [`with_scope`]                | Per-thread current scope               |
//! | [`ProxyFactory::rebind`]      | Pins a reference's calls to a scope    |
//! | [`ProxyFactory`]              | `cast_to_local` / `cast_to_remote`     |
//! |-------------------------------|----------------------------------------|
//!
//! # Example
//!
//! ```
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! use kaijutsu_bridge::ProxyFactory;
//! use kaijutsu_reflect::{
//!     builtin, Failure, MethodDescriptor, Object, ObjectExt, ResolutionScope, TypeBuilder, TypeRef, Value,
//! };
//!
//! #[derive(Debug)]
//! struct RemoteClock(TypeRef);
//!
//! impl Object for RemoteClock {
//!     fn runtime_type(&self) -> TypeRef {
//!         self.0.clone()
//!     }
//!     fn invoke(&self, _method: &MethodDescriptor, _args: &[Value]) -> Result<Value, Failure> {
//!         Ok(Value::Int(1200))
//!     }
//!     fn is_remote(&self) -> bool {
//!         true
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! let t = builtin::types();
//! let scope = ResolutionScope::new("app");
//! let clock = scope.define(TypeBuilder::interface("Clock").method("now", &[], &t.int)).unwrap();
//! let remote_ty = scope.define(TypeBuilder::class("ClockImpl").method("now", &[], &t.int)).unwrap();
//!
//! let proxy = ProxyFactory::default().cast_to_local(Arc::new(RemoteClock(remote_ty)), &clock);
//! assert_eq!(proxy.call("now", &[]).unwrap(), Value::Int(1200));
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod proxy;
pub mod resolver;
pub mod scope;
pub mod transform;
pub mod unwrap;

pub use config::{BridgeConfig, ConfigError};
pub use error::BridgeError;
pub use proxy::{LocalProxy, ProxyFactory};
pub use resolver::{MethodKey, MethodMap};
pub use scope::{Rebound, active, current, with_scope};
pub use unwrap::{RethrowPolicy, Unwrapper, error_message, unwrap};
