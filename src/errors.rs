//! Error types with diagnostic codes.
//!
//! The parse path never fails a caller: malformed markup degrades to fewer
//! primitives. The only genuine error in the crate is a serialized scene
//! that cannot be decoded, which implies corruption rather than an expected
//! parsing gap.

use miette::Diagnostic;
use thiserror::Error;

/// Failure to reconstruct a [`crate::Scene`] from its serialized form.
#[derive(Error, Diagnostic, Debug)]
pub enum DecodeError {
    #[error("serialized scene payload is not valid JSON: {source}")]
    #[diagnostic(
        code(tacton::decode::malformed_payload),
        help("the payload was likely truncated or corrupted in the cache; re-parse the markup")
    )]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },

    #[error("serialized scene is structurally invalid: {reason}")]
    #[diagnostic(code(tacton::decode::invalid_scene))]
    InvalidScene { reason: String },
}
