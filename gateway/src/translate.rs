use crate::errors::GatewayError;
use crate::invoker::DownstreamResponse;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// Client-facing JSON wrapper.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// `{data}`
    pub fn data(data: Value) -> Self {
        Envelope {
            data: Some(data),
            ..Default::default()
        }
    }

    /// `{success: true, data}`
    pub fn ok(data: Value) -> Self {
        Envelope {
            success: Some(true),
            data: Some(data),
            ..Default::default()
        }
    }

    /// `{success: true, message, data}`
    pub fn ok_with_message(message: impl Into<String>, data: Value) -> Self {
        Envelope {
            success: Some(true),
            message: Some(message.into()),
            data: Some(data),
            ..Default::default()
        }
    }

    /// `{success: false, error}`
    pub fn failure(error: impl Into<String>) -> Self {
        Envelope {
            success: Some(false),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// `{error}`
    pub fn error(error: impl Into<String>) -> Self {
        Envelope {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Envelope(Envelope),
    /// Downstream body forwarded unchanged
    Raw(Value),
}

/// What the browser receives.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl GatewayResponse {
    pub fn new(status: StatusCode, envelope: Envelope) -> Self {
        GatewayResponse {
            status,
            body: ResponseBody::Envelope(envelope),
        }
    }

    pub fn raw(status: StatusCode, body: Value) -> Self {
        GatewayResponse {
            status,
            body: ResponseBody::Raw(body),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.body).unwrap_or(Value::Null)
    }
}

/// How a route turns the downstream outcome into a client response.
#[derive(Clone, Debug, PartialEq)]
pub enum TranslationPolicy {
    /// Forward status and body unchanged, success or not.
    Passthrough { failure_message: &'static str },
    /// Re-shape into a fixed envelope; every failure collapses to a 500.
    Wrapped {
        success_status: StatusCode,
        /// `{success: true, data}` when set, `{data}` otherwise
        success_flag: bool,
        failure_message: &'static str,
    },
    /// `{success, message, data}`; downstream statuses surface in the error.
    Reset {
        success_message: &'static str,
        failure_message: &'static str,
    },
}

impl TranslationPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            TranslationPolicy::Passthrough { .. } => "passthrough",
            TranslationPolicy::Wrapped { .. } => "wrapped",
            TranslationPolicy::Reset { .. } => "reset",
        }
    }

    pub fn translate(&self, outcome: Result<DownstreamResponse, GatewayError>) -> GatewayResponse {
        match outcome {
            Ok(response) => self.success(response),
            Err(error) => self.failure(error),
        }
    }

    fn success(&self, response: DownstreamResponse) -> GatewayResponse {
        match self {
            TranslationPolicy::Passthrough { .. } => {
                GatewayResponse::raw(response.status, response.body)
            }
            TranslationPolicy::Wrapped {
                success_status,
                success_flag: true,
                ..
            } => GatewayResponse::new(*success_status, Envelope::ok(response.body)),
            TranslationPolicy::Wrapped {
                success_status,
                success_flag: false,
                ..
            } => GatewayResponse::new(*success_status, Envelope::data(response.body)),
            TranslationPolicy::Reset {
                success_message, ..
            } => GatewayResponse::new(
                StatusCode::OK,
                Envelope::ok_with_message(*success_message, response.body),
            ),
        }
    }

    fn failure(&self, error: GatewayError) -> GatewayResponse {
        let internal = StatusCode::INTERNAL_SERVER_ERROR;

        match (self, error) {
            // Configuration problems look the same on every route
            (_, GatewayError::ServerMisconfigured) => GatewayResponse::new(
                internal,
                Envelope::failure(GatewayError::ServerMisconfigured.to_string()),
            ),

            (TranslationPolicy::Passthrough { .. }, GatewayError::DownstreamError { status, body }) => {
                GatewayResponse::raw(status, body)
            }
            (TranslationPolicy::Passthrough { failure_message }, GatewayError::DownstreamUnreachable(_)) => {
                GatewayResponse::new(internal, Envelope::error(*failure_message))
            }
            (TranslationPolicy::Passthrough { .. }, error) => {
                GatewayResponse::new(error.status(), Envelope::error(error.to_string()))
            }

            (TranslationPolicy::Reset { .. }, GatewayError::DownstreamError { status, .. }) => {
                GatewayResponse::new(
                    status,
                    Envelope::failure(format!("Reset failed with status {}", status.as_u16())),
                )
            }

            (TranslationPolicy::Wrapped { failure_message, .. }, GatewayError::DownstreamError { .. })
            | (TranslationPolicy::Wrapped { failure_message, .. }, GatewayError::DownstreamUnreachable(_))
            | (TranslationPolicy::Reset { failure_message, .. }, GatewayError::DownstreamUnreachable(_)) => {
                GatewayResponse::new(internal, Envelope::failure(*failure_message))
            }

            // Gateway-originated rejections (401, 400) and server-level errors
            (_, error) => GatewayResponse::new(error.status(), Envelope::failure(error.to_string())),
        }
    }
}
