use thiserror::Error;

/// Ways a single geocoding source can be unavailable.
///
/// None of these are fatal to a resolution: the cascade logs the failure
/// and moves on to the next source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload from {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing field `{field}` in {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    #[error("field `{field}` in {context} has an unusable value")]
    InvalidField {
        field: &'static str,
        context: String,
    },

    #[error("postal code not known at {url}")]
    NotFound { url: String },

    #[error("unparseable page at {url}")]
    Unparseable { url: String },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
