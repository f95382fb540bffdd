use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cache I/O error for {path}: {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry {path} is corrupt: {source}")]
    CacheFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
