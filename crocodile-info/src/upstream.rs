use async_trait::async_trait;

use crate::error::UpstreamError;

pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Source of the data the function reports back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError>;
}

/// `Upstream` backed by a pooled reqwest client, built once per cold start.
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|source| UpstreamError::Body {
                url: url.to_string(),
                source,
            })?;

        Ok(UpstreamResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one canned HTTP response and returns the URL to hit.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/public/crocodiles/")
    }

    #[tokio::test]
    async fn test_http_upstream_returns_status_and_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 17\r\nconnection: close\r\n\r\n[{\"name\":\"Bert\"}]",
        )
        .await;

        let response = HttpUpstream::new().get(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"[{"name":"Bert"}]"#);
    }

    #[tokio::test]
    async fn test_http_upstream_passes_through_non_success_status() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 9\r\nconnection: close\r\n\r\nnot found",
        )
        .await;

        let response = HttpUpstream::new().get(&url).await.unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"not found");
    }

    #[tokio::test]
    async fn test_http_upstream_connection_refused() {
        // Bind then drop to get a port nobody is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = HttpUpstream::new().get(&format!("http://{addr}/")).await;

        assert!(matches!(result, Err(UpstreamError::Request { .. })));
    }
}
