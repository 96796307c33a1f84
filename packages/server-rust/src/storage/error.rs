/// Failures raised by vehicle store backends.
///
/// Query methods on [`VehicleStore`](crate::VehicleStore) return
/// `anyhow::Result`; these variants are the typed roots of those chains.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The liveness check at startup failed. Fatal for the process.
    #[error("cannot reach the document store at {address}: {reason}")]
    Unreachable { address: String, reason: String },
    /// A result document lacked a field or carried an unexpected type.
    #[error("malformed `{field}` in {query} result")]
    Decode {
        query: &'static str,
        field: &'static str,
    },
    /// The collection holds no vehicle with a brand entry.
    #[error("the vehicle collection is empty")]
    Empty,
    /// Seed data for the in-memory store could not be loaded.
    #[error("cannot load seed data from {path}: {reason}")]
    Seed { path: String, reason: String },
    /// The configured backend was left out of this build.
    #[error("store backend `{0}` is not compiled in")]
    Disabled(&'static str),
}
