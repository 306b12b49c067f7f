#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("response envelope carries no data")]
    MissingData,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view mode `{0}`, expected day, week or month")]
pub struct ViewModeError(pub String);
