use std::path::PathBuf;

/// Errors that can escape the crate's public API.
///
/// Per-record parse failures and backend-transient failures never
/// surface as `Error` values — they are logged in place and the caller
/// continues. Only configuration, schema-drift and backend-
/// initialization failures are modeled here, since those are the only
/// categories treated as fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(
        "schema drift: record declared {declared} header columns but produced {actual} values"
    )]
    SchemaDrift { declared: usize, actual: usize },

    #[error("failed to initialize index backend at {url}: {source}")]
    BackendInit {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to read vocabulary file {path}: {source}")]
    VocabIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
