//! Bridge defaults.
//!
//! Centralizes the kind names the bridge treats specially so configuration
//! and tests agree on them.

/// Failure kinds that exist only to carry another failure.
///
/// `InvocationTargetException` is added by reflective dispatch itself;
/// `UndeclaredThrowableException` by proxies that raised a checked failure
/// their interface never declared.
pub const DEFAULT_WRAPPER_KINDS: &[&str] = &["InvocationTargetException", "UndeclaredThrowableException"];

/// Transport wrapper for failures raised on the server side. Unwrapped one
/// extra level before a failure is reclassified.
pub const DEFAULT_SERVER_ERROR_KIND: &str = "ServerError";

/// Log a warning when a local interface method has no remote counterpart.
pub const DEFAULT_WARN_ON_UNMATCHED: bool = true;
