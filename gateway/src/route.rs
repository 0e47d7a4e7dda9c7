use crate::auth::{AuthMode, AuthResolver};
use crate::errors::GatewayError;
use crate::invoker::{BackendInvoker, DownstreamResponse, ProxyRequest};
use crate::metrics_defs::{REQUEST_DURATION, REQUEST_FAILURES, REQUESTS};
use crate::normalize::{FieldSpec, RawInput, normalize};
use crate::translate::{GatewayResponse, TranslationPolicy};
use http::{HeaderMap, Method};
use shared::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Which precondition a route verifies first. Both run before any network call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOrder {
    AuthFirst,
    ConfigFirst,
}

/// Static description of one browser-facing operation.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSpec {
    pub name: &'static str,
    /// Method and path pattern on the gateway
    pub method: Method,
    pub path: &'static str,
    pub auth: AuthMode,
    pub check_order: CheckOrder,
    pub fields: &'static [FieldSpec],
    /// Method and path template of the downstream call
    pub downstream_method: Method,
    pub downstream_path: &'static str,
    pub policy: TranslationPolicy,
}

/// Borrowed view of an incoming call.
#[derive(Clone, Copy, Debug)]
pub struct IncomingRequest<'a> {
    pub headers: &'a HeaderMap,
    pub path_params: &'a HashMap<String, String>,
    pub query: &'a HashMap<String, String>,
    pub body: &'a [u8],
}

/// A route bound to its auth strategy and the downstream invoker.
///
/// Each call runs `auth/config check -> normalize -> invoke -> translate` and
/// stops at the first failure.
pub struct GatewayRoute {
    spec: RouteSpec,
    auth: Arc<dyn AuthResolver>,
    invoker: BackendInvoker,
}

impl GatewayRoute {
    pub fn new(spec: RouteSpec, auth: Arc<dyn AuthResolver>, invoker: BackendInvoker) -> Self {
        debug_assert_eq!(
            spec.auth,
            auth.mode(),
            "route {} registered with the wrong auth resolver",
            spec.name
        );
        GatewayRoute {
            spec,
            auth,
            invoker,
        }
    }

    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    pub async fn handle(&self, request: IncomingRequest<'_>) -> GatewayResponse {
        let start = Instant::now();
        let name = self.spec.name;

        let outcome = self.run(request).await;
        if let Err(e) = &outcome {
            match e {
                GatewayError::Unauthorized => tracing::debug!(route = name, "rejected: unauthorized"),
                GatewayError::BadRequest(reason) => {
                    tracing::info!(route = name, %reason, "rejected: bad request")
                }
                GatewayError::ServerMisconfigured => {
                    tracing::error!(route = name, "downstream base URL is not configured")
                }
                other => tracing::warn!(route = name, error = %other, "downstream call failed"),
            }
            counter!(REQUEST_FAILURES, "route" => name, "kind" => e.kind()).increment(1);
        }

        let response = self.spec.policy.translate(outcome);

        let status = response.status.as_u16().to_string();
        counter!(REQUESTS, "route" => name, "status" => status.clone()).increment(1);
        histogram!(REQUEST_DURATION, "route" => name, "status" => status)
            .record(start.elapsed().as_secs_f64());

        response
    }

    async fn run(&self, request: IncomingRequest<'_>) -> Result<DownstreamResponse, GatewayError> {
        let auth = match self.spec.check_order {
            CheckOrder::AuthFirst => {
                let auth = self.auth.resolve(request.headers).await?;
                self.invoker.check_configured()?;
                auth
            }
            CheckOrder::ConfigFirst => {
                self.invoker.check_configured()?;
                self.auth.resolve(request.headers).await?
            }
        };

        let payload = normalize(
            self.spec.fields,
            RawInput {
                path_params: request.path_params,
                query: request.query,
                body: request.body,
            },
        )?;

        let proxy_request = ProxyRequest::build(
            self.spec.downstream_method.clone(),
            self.spec.downstream_path,
            auth,
            payload,
        )?;

        self.invoker.invoke(&proxy_request).await
    }
}
