//! Error taxonomy for the completion engine.

use compact_str::CompactString;

/// Typed failures surfaced by the registry, provider calls, and the
/// task store.
///
/// Malformed stream lines, cancellation, and missing usage stats are
/// deliberately not in this taxonomy: the first is recovered locally
/// (logged and skipped), the other two are normal outcomes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The registry could not resolve a model to any configured provider.
    #[error("NoProviderAvailable: no provider registered for model '{0}'")]
    NoProviderAvailable(CompactString),

    /// The backend rejected the initial request with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    BackendHttp {
        /// The HTTP status code.
        status: u16,
        /// The backend's error body.
        body: String,
    },

    /// No task with the given id exists in the store.
    #[error("task '{0}' not found")]
    TaskNotFound(CompactString),
}
