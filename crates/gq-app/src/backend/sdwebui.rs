use async_trait::async_trait;
use gq_core::GenerationParams;
use tracing::debug;

use crate::artifact::Artifact;
use crate::backend::Backend;
use crate::backend::schemas::{Txt2ImgRequest, Txt2ImgResponse};
use crate::config::AppConfig;
use crate::error::BackendError;

/// Client for the Stable Diffusion WebUI HTTP API
#[derive(Debug, Clone)]
pub struct SdWebUiBackend {
    client: reqwest::Client,
    base_url: String,
}

impl SdWebUiBackend {
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/sdapi/v1/{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for SdWebUiBackend {
    async fn generate(&self, params: &GenerationParams) -> Result<Artifact, BackendError> {
        debug!(
            seed = params.seed,
            width = params.width,
            height = params.height,
            steps = params.steps,
            "POST txt2img"
        );

        let response = self
            .client
            .post(self.url("txt2img"))
            .json(&Txt2ImgRequest::from(params))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Txt2ImgResponse::parse(&body)?.into_artifact()
    }

    async fn interrupt(&self) -> Result<(), BackendError> {
        let response = self.client.post(self.url("interrupt")).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP response on a local port and return its base URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    /// Drain headers and body so the client never sees a reset
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&request);
            let Some(head_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= head_end + 4 + content_length {
                return;
            }
        }
    }

    fn backend_at(api_url: String) -> SdWebUiBackend {
        let config = AppConfig {
            api_url,
            request_timeout: std::time::Duration::from_secs(5),
            ..AppConfig::default()
        };
        SdWebUiBackend::new(&config).unwrap()
    }

    fn params() -> GenerationParams {
        gq_core::resolve_parameters(&gq_core::Request::new("a"), 1)
    }

    #[tokio::test]
    async fn test_error_status_maps_to_status_error() {
        let backend = backend_at(serve_once("500 Internal Server Error", "CUDA out of memory").await);
        let err = backend.generate(&params()).await.unwrap_err();
        assert!(
            matches!(&err, BackendError::Status { status: 500, body } if body == "CUDA out of memory"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_success_without_images_is_malformed() {
        let backend = backend_at(serve_once("200 OK", r#"{"detail":"x"}"#).await);
        let err = backend.generate(&params()).await.unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_success_with_image_returns_artifact() {
        // "aGVsbG8=" is base64 for "hello"
        let backend = backend_at(serve_once("200 OK", r#"{"images":["aGVsbG8="]}"#).await);
        let artifact = backend.generate(&params()).await.unwrap();
        assert_eq!(artifact.bytes(), b"hello");
    }

    #[tokio::test]
    async fn test_interrupt_error_status() {
        let backend = backend_at(serve_once("503 Service Unavailable", "busy").await);
        let err = backend.interrupt().await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 503, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_interrupt_accepted() {
        let backend = backend_at(serve_once("200 OK", "{}").await);
        backend.interrupt().await.unwrap();
    }

    #[test]
    fn test_builds_api_urls() {
        let config = AppConfig {
            api_url: "http://gpu-box:7860".into(),
            ..AppConfig::default()
        };
        let backend = SdWebUiBackend::new(&config).unwrap();
        assert_eq!(backend.url("txt2img"), "http://gpu-box:7860/sdapi/v1/txt2img");
        assert_eq!(backend.url("interrupt"), "http://gpu-box:7860/sdapi/v1/interrupt");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let config = AppConfig {
            // Nothing listens on the discard port.
            api_url: "http://127.0.0.1:9".into(),
            request_timeout: std::time::Duration::from_secs(2),
            ..AppConfig::default()
        };
        let backend = SdWebUiBackend::new(&config).unwrap();
        let params = gq_core::resolve_parameters(&gq_core::Request::new("a"), 1);
        let err = backend.generate(&params).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
