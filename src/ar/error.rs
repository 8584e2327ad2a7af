use std::path::PathBuf;

/// Failures raised while loading resolver configuration.
///
/// Missing configuration is never an error: an absent metadata key or sidecar
/// file simply yields no replace pairs.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("Malformed replace file {}: {source}", .path.display())]
    MalformedReplaceFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unable to read replace file {}: {source}", .path.display())]
    ReadReplaceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
