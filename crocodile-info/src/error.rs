use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("upstream returned malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("upstream payload is not a JSON object, cannot read field '{0}'")]
    NotAnObject(String),

    #[error("upstream payload has no field '{0}'")]
    MissingField(String),

    #[error("failed to encode response body: {0}")]
    Encode(#[source] serde_json::Error),
}
