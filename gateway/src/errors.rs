use http::StatusCode;
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Errors that can occur while serving a gateway route.
///
/// Every variant is converted into a client envelope at the route boundary;
/// none of them reach the browser as a raw failure.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No credential was found for the route's auth mode
    #[error("Unauthorized")]
    Unauthorized,

    /// A required identifying parameter is missing or the body is malformed
    #[error("{0}")]
    BadRequest(String),

    /// The downstream base URL is unset, empty or unusable
    #[error("Server URL not configured")]
    ServerMisconfigured,

    /// The downstream answered with a non-2xx status
    #[error("Downstream responded with status {status}")]
    DownstreamError {
        status: StatusCode,
        body: serde_json::Value,
    },

    /// The downstream could not be reached (connect, DNS, timeout, body read)
    #[error("Downstream unreachable: {0}")]
    DownstreamUnreachable(String),

    /// Listener or connection failure. Raised by the server loop only, never
    /// by a route.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn missing_parameters(names: &[&str]) -> Self {
        GatewayError::BadRequest(format!("Missing required parameter(s): {}", names.join(", ")))
    }

    /// Status code used when the gateway itself rejects the call.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::DownstreamError { status, .. } => *status,
            GatewayError::ServerMisconfigured
            | GatewayError::DownstreamUnreachable(_)
            | GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::ServerMisconfigured => "server_misconfigured",
            GatewayError::DownstreamError { .. } => "downstream_error",
            GatewayError::DownstreamUnreachable(_) => "downstream_unreachable",
            GatewayError::Io(_) => "io",
        }
    }
}
