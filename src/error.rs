use reqwest::StatusCode;

/// A non-success response from an outbound service.
///
/// Handlers look for this in an `anyhow` chain to forward the upstream status
/// instead of answering with a generic 500.
#[derive(Debug, thiserror::Error)]
#[error("upstream returned {status}: {message}")]
pub struct UpstreamError {
    pub status: StatusCode,
    pub message: String,
}

impl UpstreamError {
    /// Consumes a failed response, keeping its body text verbatim.
    pub async fn from_response(response: reqwest::Response, prefix: Option<&str>) -> Self {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(?err, %status, "read upstream error body");
                String::new()
            }
        };
        let message = match prefix {
            Some(prefix) => format!("{prefix}: {body}"),
            None => body,
        };
        Self { status, message }
    }
}

/// Returns the upstream failure carried by `err`, if any.
pub fn find_upstream(err: &anyhow::Error) -> Option<&UpstreamError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<UpstreamError>())
}
