//! HTTP gateway transport for the message fabric

use crate::config::GatewaySettings;
use crate::error::TransportError;
use crate::transport::codec::{decode_response, encode_request};
use crate::transport::{RequestEnvelope, ResponseEnvelope, Transport};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Header carrying the id of each fabric message
pub const MESSAGE_ID_HEADER: &str = "X-Message-Id";

/// Transport that posts each request envelope to `<gateway>/<topic>` and
/// reads the response envelope from the reply body
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    headers: HashMap<String, String>,
}

impl HttpTransport {
    /// Create a transport with default settings for the given gateway
    pub fn new(gateway_url: &str) -> Result<Self, TransportError> {
        Self::with_settings(&GatewaySettings {
            url: gateway_url.to_string(),
            ..Default::default()
        })
    }

    /// Create a transport with custom settings
    pub fn with_settings(settings: &GatewaySettings) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let mut base_url = Url::parse(&settings.url)
            .map_err(|e| TransportError::Unavailable(format!("invalid gateway url: {}", e)))?;
        // Keep the last path segment when joining topics
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            headers: settings.extra_headers.clone(),
        })
    }

    /// URL a topic is delivered to
    pub fn topic_url(&self, topic: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(topic.trim_start_matches('/'))
            .map_err(|e| TransportError::Unavailable(format!("invalid topic '{}': {}", topic, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        topic: &str,
        request: RequestEnvelope,
    ) -> Result<ResponseEnvelope, TransportError> {
        let url = self.topic_url(topic)?;
        let message_id = Uuid::new_v4().to_string();
        let payload = encode_request(&request)?;

        debug!("Posting message {} to {}", message_id, url);

        let mut req_builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header(MESSAGE_ID_HEADER, &message_id);

        // Add custom headers
        for (key, value) in &self.headers {
            req_builder = req_builder.header(key, value);
        }

        let response = req_builder.body(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Gateway {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        decode_response(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new("http://localhost:8080/fabric").is_ok());
        assert!(HttpTransport::new("not a url").is_err());
    }

    #[test]
    fn test_topic_url() {
        let transport = HttpTransport::new("http://localhost:8080/fabric").unwrap();
        let url = transport.topic_url("/mcafee/mar/service/api/search").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/fabric/mcafee/mar/service/api/search"
        );
    }
}
