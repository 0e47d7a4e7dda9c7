use crate::assignment::ClusterAssignment;
use crate::errors::UploadError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use shared::http::ACCESS_TOKEN_HEADER;
use std::time::Duration;
use url::Url;

/// Body accepted by the gateway's create-cluster route.
#[derive(Debug, Serialize)]
pub struct ClusterBatch<'a> {
    #[serde(rename = "clusterData")]
    pub cluster_data: &'a [ClusterAssignment],
    pub proj_id: &'a str,
}

/// Gateway answer to a submitted batch.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitResult {
    pub status: u16,
    pub body: Value,
}

impl SubmitResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `error` of a failure envelope, or the whole body.
    pub fn error_message(&self) -> String {
        match self.body.get("error").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => self.body.to_string(),
        }
    }
}

#[async_trait]
pub trait ClusterSubmitter: Send + Sync {
    async fn submit(&self, batch: &ClusterBatch<'_>) -> Result<SubmitResult, UploadError>;
}

/// Submits batches to a running gateway over HTTP.
pub struct GatewayClient {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str, token: String, timeout: Duration) -> Result<Self, UploadError> {
        let mut endpoint = Url::parse(gateway_url)
            .map_err(|e| UploadError::InvalidGatewayUrl(format!("{gateway_url}: {e}")))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| UploadError::InvalidGatewayUrl(gateway_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "create-cluster"]);

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(GatewayClient {
            client,
            endpoint,
            token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ClusterSubmitter for GatewayClient {
    async fn submit(&self, batch: &ClusterBatch<'_>) -> Result<SubmitResult, UploadError> {
        tracing::debug!(endpoint = %self.endpoint, records = batch.cluster_data.len(), "submitting batch");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .json(batch)
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        Ok(SubmitResult { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};
    use hyper::body::{Bytes, Incoming};
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::{TokioExecutor, TokioIo};
    use hyper_util::server::conn::auto::Builder;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    /// Serves one fixed answer and records path, token header and JSON body.
    async fn start_gateway(status: StatusCode, reply: Value) -> (String, Captured) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let reply = Bytes::from(serde_json::to_vec(&reply).unwrap());

        let seen = captured.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = seen.clone();
                let reply = reply.clone();
                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let seen = seen.clone();
                        let reply = reply.clone();
                        async move {
                            let path = req.uri().path().to_string();
                            let token = req
                                .headers()
                                .get("x-access-token")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            let body = req.into_body().collect().await.unwrap().to_bytes();
                            let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
                            seen.lock().unwrap().push((path, token, body));

                            let mut response = Response::new(Full::new(reply));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = Builder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        (format!("http://127.0.0.1:{port}"), captured)
    }

    #[test]
    fn test_endpoint() {
        let client =
            GatewayClient::new("http://localhost:3000/", "t".into(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:3000/api/create-cluster"
        );

        let client =
            GatewayClient::new("http://example.org/bff", "t".into(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://example.org/bff/api/create-cluster"
        );

        assert!(matches!(
            GatewayClient::new("not a url", "t".into(), Duration::from_secs(1)),
            Err(UploadError::InvalidGatewayUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_submit() {
        let (url, captured) =
            start_gateway(StatusCode::CREATED, json!({"data": {"created": 1}})).await;
        let client = GatewayClient::new(&url, "tok".into(), Duration::from_secs(5)).unwrap();

        let assignments = vec![ClusterAssignment {
            name: Some("a".into()),
            cluster: Some("1".into()),
        }];
        let result = client
            .submit(&ClusterBatch {
                cluster_data: &assignments,
                proj_id: "12",
            })
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.body, json!({"data": {"created": 1}}));

        let captured = captured.lock().unwrap();
        assert_eq!(captured[0].0, "/api/create-cluster");
        assert_eq!(captured[0].1.as_deref(), Some("tok"));
        assert_eq!(
            captured[0].2,
            json!({"clusterData": [{"name": "a", "cluster": "1"}], "proj_id": "12"})
        );
    }

    #[tokio::test]
    async fn test_submit_failure_body() {
        let (url, _) = start_gateway(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"success": false, "error": "Failed to create clusters"}),
        )
        .await;
        let client = GatewayClient::new(&url, "tok".into(), Duration::from_secs(5)).unwrap();

        let result = client
            .submit(&ClusterBatch {
                cluster_data: &[],
                proj_id: "12",
            })
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.status, 500);
        assert_eq!(result.error_message(), "Failed to create clusters");
    }
}
