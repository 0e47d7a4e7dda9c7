use crate::normalize::parse_query;
use crate::route::{GatewayRoute, IncomingRequest};
use crate::translate::{Envelope, GatewayResponse};
use http::StatusCode;
use hyper::Request;
use hyper::body::Bytes;
use routing::{Resolution, Route, RouteTable};
use std::sync::Arc;

/// Dispatches incoming requests to the gateway route matching method and path.
#[derive(Clone)]
pub struct Router {
    table: Arc<RouteTable<GatewayRoute>>,
}

impl Router {
    pub fn new(routes: Vec<GatewayRoute>) -> Self {
        let routes = routes
            .into_iter()
            .map(|route| {
                let (method, path) = (route.spec().method.clone(), route.spec().path);
                Route::new(method, path, route)
            })
            .collect();

        Self {
            table: Arc::new(RouteTable::new(routes)),
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &GatewayRoute> {
        self.table.actions()
    }

    pub async fn dispatch(&self, req: Request<Bytes>) -> GatewayResponse {
        let (parts, body) = req.into_parts();

        match self.table.resolve(&parts.method, parts.uri.path()) {
            Resolution::Matched(matched) => {
                let query = parse_query(parts.uri.query());
                let incoming = IncomingRequest {
                    headers: &parts.headers,
                    path_params: &matched.params,
                    query: &query,
                    body: &body,
                };
                matched.action.handle(incoming).await
            }
            Resolution::MethodNotAllowed => {
                tracing::debug!(method = %parts.method, path = %parts.uri.path(), "method not allowed");
                GatewayResponse::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    Envelope::failure("Method not allowed"),
                )
            }
            Resolution::NotFound => {
                tracing::debug!(method = %parts.method, path = %parts.uri.path(), "no route matched");
                GatewayResponse::new(StatusCode::NOT_FOUND, Envelope::failure("Not found"))
            }
        }
    }
}
