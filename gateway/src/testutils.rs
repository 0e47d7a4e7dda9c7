use crate::auth::{
    ACCESS_TOKEN_HEADER, AuthMode, AuthResolver, Session, SessionResolver, StaticSessionStore,
    TokenHeaderResolver,
};
use crate::config::{DEFAULT_SESSION_COOKIE, DownstreamConfig};
use crate::invoker::BackendInvoker;
use crate::normalize::parse_query;
use crate::route::{GatewayRoute, IncomingRequest, RouteSpec};
use http::header::{COOKIE, HeaderMap, HeaderValue};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TEST_SESSION_ID: &str = "test-session";
pub const TEST_SESSION_TOKEN: &str = "session-token";

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("recorded body is not JSON")
    }
}

/// Downstream stand-in answering every request with a fixed status and JSON body.
#[derive(Clone)]
pub struct MockDownstream {
    port: u16,
    hits: Arc<AtomicUsize>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockDownstream {
    pub async fn start(status: StatusCode, body: serde_json::Value) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        let hits = Arc::new(AtomicUsize::new(0));
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let reply = Bytes::from(serde_json::to_vec(&body).unwrap());

        let mock = MockDownstream {
            port,
            hits: hits.clone(),
            recorded: recorded.clone(),
        };

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let io = TokioIo::new(stream);
                let hits = hits.clone();
                let recorded = recorded.clone();
                let reply = reply.clone();

                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let hits = hits.clone();
                        let recorded = recorded.clone();
                        let reply = reply.clone();
                        async move {
                            let (parts, body) = req.into_parts();
                            let body = body
                                .collect()
                                .await
                                .map(|collected| collected.to_bytes())
                                .unwrap_or_else(|_| Bytes::new());

                            hits.fetch_add(1, Ordering::SeqCst);
                            recorded.lock().unwrap().push(RecordedRequest {
                                method: parts.method,
                                path: parts.uri.path().to_string(),
                                query: parts.uri.query().map(str::to_string),
                                headers: parts.headers,
                                body,
                            });

                            let mut response = Response::new(Full::new(reply));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = Builder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await;
                });
            }
        });

        mock
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }
}

pub fn test_invoker(base_url: &str) -> BackendInvoker {
    BackendInvoker::new(&DownstreamConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

pub fn test_resolver(mode: AuthMode) -> Arc<dyn AuthResolver> {
    match mode {
        AuthMode::Token => Arc::new(TokenHeaderResolver),
        AuthMode::Session => Arc::new(SessionResolver::new(Arc::new(StaticSessionStore::new(
            DEFAULT_SESSION_COOKIE,
            HashMap::from([(
                TEST_SESSION_ID.to_string(),
                Session {
                    access_token: TEST_SESSION_TOKEN.to_string(),
                    user_id: "auth0|test".to_string(),
                },
            )]),
        )))),
    }
}

pub fn route_with(spec: RouteSpec, base_url: &str) -> GatewayRoute {
    let resolver = test_resolver(spec.auth);
    GatewayRoute::new(spec, resolver, test_invoker(base_url))
}

/// Owned request parts for driving a route in tests.
#[derive(Default)]
pub struct TestRequest {
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Vec<u8>,
}

impl TestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: &'static str) -> Self {
        self.headers
            .insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static(token));
        self
    }

    pub fn session(mut self) -> Self {
        let cookie = format!("{DEFAULT_SESSION_COOKIE}={TEST_SESSION_ID}");
        self.headers
            .insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        self
    }

    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = parse_query(Some(query));
        self
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = serde_json::to_vec(&body).unwrap();
        self
    }

    pub fn raw_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    pub fn as_incoming(&self) -> IncomingRequest<'_> {
        IncomingRequest {
            headers: &self.headers,
            path_params: &self.path_params,
            query: &self.query,
            body: &self.body,
        }
    }
}
