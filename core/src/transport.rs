//! The I/O seam between `PetApi` and the network.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one `HttpRequest` and yields its response.
///
/// Implementations report connectivity failures as `ApiError::Transport` and
/// return every received response as data, whatever its status; status
/// interpretation belongs to `PetClient`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}

#[cfg(feature = "reqwest-transport")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
mod reqwest_transport {
    use async_trait::async_trait;
    use reqwest::{Client, Method};

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// `Transport` over a shared reqwest connection pool, with reqwest's
    /// default timeouts.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        /// # Errors
        ///
        /// Returns an error when the TLS backend cannot be initialised.
        pub fn new() -> Result<Self, ApiError> {
            let client = Client::builder().build().map_err(map_transport_error)?;
            Ok(Self { client })
        }

        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let method = match request.method {
                HttpMethod::Get => Method::GET,
                HttpMethod::Post => Method::POST,
                HttpMethod::Put => Method::PUT,
                HttpMethod::Delete => Method::DELETE,
            };
            let mut builder = self.client.request(method, request.url.as_str());
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(map_transport_error)?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (key.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response.text().await.map_err(map_transport_error)?;
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

    fn map_transport_error(error: reqwest::Error) -> ApiError {
        ApiError::Transport(error.to_string())
    }
}
