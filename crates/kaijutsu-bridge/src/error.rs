//! Bridge error types.

use kaijutsu_reflect::{Failure, builtin};
use thiserror::Error;

/// Failures the bridge itself raises while servicing a proxied call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// No remote method matches a local interface method.
    #[error("no remote method matches {method} on {backing_type}")]
    Resolution { method: String, backing_type: String },

    /// A remote value advertised a class the scope cannot resolve.
    #[error("cannot resolve class '{class_name}' in scope '{scope}'")]
    ClassResolution { class_name: String, scope: String },
}

impl From<BridgeError> for Failure {
    fn from(err: BridgeError) -> Self {
        let t = builtin::types();
        let kind = match err {
            BridgeError::Resolution { .. } => &t.resolution_failure,
            BridgeError::ClassResolution { .. } => &t.class_resolution_failure,
        };
        Failure::new(kind, err.to_string())
    }
}
