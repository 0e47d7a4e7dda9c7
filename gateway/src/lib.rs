pub mod auth;
pub mod config;
pub mod errors;
pub mod invoker;
pub mod metrics_defs;
pub mod normalize;
pub mod route;
pub mod router;
pub mod routes;
pub mod translate;

#[cfg(test)]
mod testutils;

use crate::auth::{AuthMode, AuthResolver, SessionResolver, TokenHeaderResolver};
use crate::config::{GatewayConfig, SessionStoreConfig, ValidationError};
use crate::errors::GatewayError;
use crate::invoker::BackendInvoker;
use crate::route::GatewayRoute;
use crate::router::Router;
use crate::translate::{Envelope, GatewayResponse};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use shared::admin_service::AdminService;
use shared::http::{json_response, run_http_service};
use shared::metrics_defs::describe_all;
use std::pin::Pin;
use std::sync::Arc;

/// Upper bound on an incoming request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum GatewayStartError {
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Server(#[from] GatewayError),
}

/// Builds the route table: one token resolver, one session resolver and one
/// shared invoker for every route.
pub fn build_router(
    session_store: &SessionStoreConfig,
    invoker: BackendInvoker,
) -> Result<Router, GatewayStartError> {
    let token: Arc<dyn AuthResolver> = Arc::new(TokenHeaderResolver);
    let session: Arc<dyn AuthResolver> = Arc::new(SessionResolver::new(
        auth::session_store_from_config(session_store)?,
    ));

    let routes = routes::all()
        .into_iter()
        .map(|spec| {
            let resolver = match spec.auth {
                AuthMode::Token => token.clone(),
                AuthMode::Session => session.clone(),
            };
            tracing::debug!(
                route = spec.name,
                method = %spec.method,
                path = spec.path,
                auth = spec.auth.as_str(),
                policy = spec.policy.name(),
                "registering route"
            );
            GatewayRoute::new(spec, resolver, invoker.clone())
        })
        .collect();

    Ok(Router::new(routes))
}

pub async fn run(config: GatewayConfig) -> Result<(), GatewayStartError> {
    config.validate()?;
    describe_all(metrics_defs::ALL_METRICS);

    let invoker = BackendInvoker::new(&config.downstream)?;
    let ready = invoker.is_configured();
    if !ready {
        tracing::warn!("downstream base URL is not configured, every route will answer 500");
    }

    let router = build_router(&config.session_store, invoker)?;
    tracing::info!(routes = router.routes().count(), "gateway routes registered");
    let gateway_service = GatewayService { router };
    let admin_service: AdminService<_, GatewayError> = AdminService::new(move || ready);

    let gateway_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        gateway_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(gateway_task, admin_task)?;
    Ok(())
}

struct GatewayService {
    router: Router,
}

impl Service<Request<Incoming>> for GatewayService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let router = self.router.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let response = match Limited::new(body, MAX_BODY_BYTES).collect().await {
                Ok(collected) => {
                    router
                        .dispatch(Request::from_parts(parts, collected.to_bytes()))
                        .await
                }
                Err(e) => {
                    tracing::info!(path = %parts.uri.path(), error = %e, "failed to read request body");
                    GatewayResponse::new(
                        StatusCode::BAD_REQUEST,
                        Envelope::failure("Failed to read request body"),
                    )
                }
            };

            Ok(json_response(response.status, &response.body))
        })
    }
}
