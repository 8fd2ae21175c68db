//! Push endpoint addressing.
//!
//! The wire address is `ws://<host>:<port>/websocket?authorization=<key>` with the
//! key percent-encoded, and the configured origin is sent as the `Origin` header.
//! Both are part of the compatibility surface with coma servers.

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Path of the push endpoint on the server.
pub const WEBSOCKET_PATH: &str = "/websocket";

/// Query parameter carrying the shared key.
pub const AUTHORIZATION_PARAM: &str = "authorization";

/// Resolved address and handshake metadata of a coma server.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: Url,
    origin: HeaderValue,
}

impl Endpoint {
    /// Build the endpoint from a client configuration.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let host = if config.host.contains(':') && !config.host.starts_with('[') {
            format!("[{}]", config.host)
        } else {
            config.host.clone()
        };

        let mut url = Url::parse(&format!("ws://{}:{}{}", host, config.port, WEBSOCKET_PATH))
            .map_err(|e| ClientError::InvalidEndpoint(format!("host '{}': {}", config.host, e)))?;
        url.query_pairs_mut()
            .append_pair(AUTHORIZATION_PARAM, &config.key);

        let origin = HeaderValue::from_str(&config.origin)
            .map_err(|e| ClientError::InvalidEndpoint(format!("origin '{}': {}", config.origin, e)))?;

        Ok(Self { url, origin })
    }

    /// Full connection URL, key included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Connection URL with the key masked, safe for logs.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(Some(&format!("{}=***", AUTHORIZATION_PARAM)));
        url.to_string()
    }

    /// Build a fresh handshake request for one connection attempt.
    pub fn request(&self) -> ClientResult<Request> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;
        request.headers_mut().insert(ORIGIN, self.origin.clone());
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, key: &str) -> ClientConfig {
        ClientConfig::new("http://localhost:3001/swagger/index.html", host, 3001, key)
    }

    #[test]
    fn test_url_layout() {
        let endpoint = Endpoint::from_config(&config("localhost", "EoCKgsUO2rMZ")).unwrap();
        assert_eq!(
            endpoint.url().as_str(),
            "ws://localhost:3001/websocket?authorization=EoCKgsUO2rMZ"
        );
    }

    #[test]
    fn test_key_is_encoded_and_redacted() {
        let endpoint = Endpoint::from_config(&config("127.0.0.1", "a b&c")).unwrap();
        assert_eq!(endpoint.url().query(), Some("authorization=a+b%26c"));
        assert_eq!(
            endpoint.redacted(),
            "ws://127.0.0.1:3001/websocket?authorization=***"
        );
    }

    #[test]
    fn test_ipv6_host() {
        let endpoint = Endpoint::from_config(&config("::1", "k")).unwrap();
        assert_eq!(endpoint.url().host_str(), Some("[::1]"));
    }

    #[test]
    fn test_request_carries_origin() {
        let endpoint = Endpoint::from_config(&config("localhost", "k")).unwrap();
        let request = endpoint.request().unwrap();
        assert_eq!(
            request.headers().get(ORIGIN).unwrap(),
            "http://localhost:3001/swagger/index.html"
        );
        assert_eq!(request.uri().path(), WEBSOCKET_PATH);
    }

    #[test]
    fn test_rejects_unprintable_origin() {
        let mut cfg = config("localhost", "k");
        cfg.origin = "http://bad\norigin".to_string();
        assert!(matches!(
            Endpoint::from_config(&cfg),
            Err(ClientError::InvalidEndpoint(_))
        ));
    }
}
