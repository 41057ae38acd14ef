use thiserror::Error;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("provider responded with {status}: {body}")]
    ProviderError { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("payment for session {session_id} is not completed")]
    NotPaid { session_id: String },
    #[error("session {session_id} was not issued for this purchase")]
    SessionMismatch { session_id: String },
    #[error("malformed session id: {session_id:?}")]
    InvalidSessionId { session_id: String },
    #[error("invalid provider endpoint: {0}")]
    InvalidEndpoint(String),
}

impl GatewayError {
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::ProviderError { status, body }
    }
}
