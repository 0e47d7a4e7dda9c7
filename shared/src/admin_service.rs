use crate::http::json_response;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    ready: bool,
}

/// Serves `/health` and `/ready` on the admin listener.
///
/// `/health` always answers 200 while the process is up; `/ready` answers 503
/// until the readiness probe reports that the service can handle traffic.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }

    fn respond(&self, method: &Method, path: &str) -> Response<BoxBody<Bytes, E>> {
        if method != Method::GET {
            return json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &HealthBody {
                    status: "method_not_allowed",
                    ready: false,
                },
            );
        }

        let ready = (self.is_ready)();
        match path {
            "/health" => json_response(
                StatusCode::OK,
                &HealthBody {
                    status: "healthy",
                    ready,
                },
            ),
            "/ready" if ready => json_response(
                StatusCode::OK,
                &HealthBody {
                    status: "ready",
                    ready,
                },
            ),
            "/ready" => json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &HealthBody {
                    status: "not_ready",
                    ready,
                },
            ),
            _ => json_response(
                StatusCode::NOT_FOUND,
                &HealthBody {
                    status: "not_found",
                    ready,
                },
            ),
        }
    }
}

impl<F, E> Service<Request<Incoming>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + Sync + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let response = self.respond(req.method(), req.uri().path());
        Box::pin(async move { Ok(response) })
    }
}
