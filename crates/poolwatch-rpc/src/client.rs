//! HTTP JSON-RPC client backed by `reqwest`.
//!
//! Every request is bounded by `request_timeout`; transient failures
//! (connection errors, timeouts, 429s, 5xx) are retried with exponential
//! backoff. Other 4xx statuses and JSON-RPC error objects are returned as-is
//! and never retried.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::transport::RpcTransport;

/// Configuration for `HttpRpcClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub retry: RetryConfig,
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP JSON-RPC client for a single endpoint.
pub struct HttpRpcClient {
    url: String,
    label: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl HttpRpcClient {
    /// Create a new client for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        let url = url.into();
        Ok(Self {
            label: redact_url(&url),
            url,
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
        })
    }

    async fn send_once(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(req)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited {
                provider: self.label.clone(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&body, 256).to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_reqwest(e))?;
        Ok(serde_json::from_slice::<JsonRpcResponse>(&bytes)?)
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            // reqwest errors embed the full URL, which carries the API key.
            TransportError::Http(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(&req).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    match self.retry.next_delay(attempt) {
                        Some(delay) => {
                            tracing::warn!(
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                endpoint = %self.label,
                                method = %req.method,
                                "retrying request"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Strip the path (where providers put API keys) from an endpoint URL.
pub fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return "<endpoint>".to_string();
    };
    let rest = &url[scheme_end + 3..];
    let host_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    // Drop userinfo credentials, if any.
    let host = host.rsplit('@').next().unwrap_or(host);
    format!("{}://{}", &url[..scheme_end], host)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn fast_retries(max_retries: u32) -> HttpClientConfig {
        HttpClientConfig {
            retry: RetryConfig {
                max_retries,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
                multiplier: 2.0,
            },
            request_timeout: Duration::from_secs(2),
        }
    }

    /// Read one HTTP request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return;
                }
            }
        }
    }

    /// Serve `status` to every request and count the requests.
    async fn fixed_status_server(status: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let body = "denied";
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (url, hits)
    }

    #[test]
    fn redact_drops_api_key() {
        assert_eq!(
            redact_url("https://eth-mainnet.g.alchemy.com/v2/secret"),
            "https://eth-mainnet.g.alchemy.com"
        );
        assert_eq!(redact_url("http://user:pw@localhost:8545"), "http://localhost:8545");
        assert_eq!(redact_url("http://127.0.0.1:8545?key=x"), "http://127.0.0.1:8545");
        assert_eq!(redact_url("not a url"), "<endpoint>");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ok", 10), "ok");
    }

    #[test]
    fn client_label_is_redacted() {
        let client = HttpRpcClient::new(
            "https://base-mainnet.g.alchemy.com/v2/key",
            HttpClientConfig::default(),
        )
        .unwrap();
        assert_eq!(client.label(), "https://base-mainnet.g.alchemy.com");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let client = HttpRpcClient::new(
            "http://127.0.0.1:1",
            HttpClientConfig {
                retry: RetryConfig::none(),
                request_timeout: Duration::from_secs(2),
            },
        )
        .unwrap();
        let err = client
            .send(JsonRpcRequest::new(1, "eth_blockNumber", vec![]))
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_retried_then_surfaced() {
        let client = HttpRpcClient::new("http://127.0.0.1:1", fast_retries(2)).unwrap();
        let err = client
            .send(JsonRpcRequest::new(1, "eth_blockNumber", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Http(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let (url, hits) = fixed_status_server("401 Unauthorized").await;
        let client = HttpRpcClient::new(url, fast_retries(3)).unwrap();
        let err = client
            .send(JsonRpcRequest::new(1, "eth_blockNumber", vec![]))
            .await
            .unwrap_err();

        assert!(
            matches!(&err, TransportError::Status { status: 401, body } if body == "denied"),
            "unexpected error: {err}"
        );
        assert!(!err.is_retryable());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_is_retried_up_to_the_limit() {
        let (url, hits) = fixed_status_server("503 Service Unavailable").await;
        let client = HttpRpcClient::new(url, fast_retries(2)).unwrap();
        let err = client
            .send(JsonRpcRequest::new(1, "eth_blockNumber", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 503, .. }), "unexpected error: {err}");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
