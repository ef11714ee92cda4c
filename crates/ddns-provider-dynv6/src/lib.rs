// # dynv6 Update Client
//
// Implements `UpdateClient` against the dynv6 HTTP update API.
//
// ## Behavior
//
// - One GET per `publish`, no retries (owned by `RetryingUpdater`)
// - HTTP timeout of 30 seconds
// - Absent address families are left out of the query
// - Success iff the response body contains `updated`; the status code is
//   not consulted
//
// ## Security
//
// The token travels in the query string, so request URLs are never logged and
// transport errors are stripped of their URL before they become a reason.
//
// ## API Reference
//
// `GET http://dynv6.com/api/update?hostname=<h>&token=<t>[&ipv6=<a>][&ipv4=<a>]`

use async_trait::async_trait;
use ddns_core::traits::{AddressPair, UpdateClient, UpdateOutcome};
use ddns_core::{Error, Result};
use std::time::Duration;

/// Default dynv6 update endpoint
pub const DEFAULT_UPDATE_URL: &str = "http://dynv6.com/api/update";

/// Default HTTP timeout for update requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Confirmation token the provider puts in successful responses
const SUCCESS_MARKER: &str = "updated";

/// dynv6 update client
pub struct Dynv6Client {
    /// Update endpoint
    update_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for Dynv6Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dynv6Client")
            .field("update_url", &self.update_url)
            .finish()
    }
}

impl Dynv6Client {
    /// Create a client for the public dynv6 endpoint
    pub fn new() -> Result<Self> {
        Self::with_update_url(DEFAULT_UPDATE_URL)
    }

    /// Create a client for a custom endpoint
    pub fn with_update_url(update_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            update_url: update_url.into(),
            client,
        })
    }

    /// Endpoint requests are sent to
    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    /// Build the update request without sending it
    pub fn build_request(
        &self,
        addresses: &AddressPair,
        hostname: &str,
        token: &str,
    ) -> reqwest::Result<reqwest::Request> {
        self.client
            .get(&self.update_url)
            .query(&query_pairs(addresses, hostname, token))
            .build()
    }
}

/// Query parameters in wire order
fn query_pairs(addresses: &AddressPair, hostname: &str, token: &str) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("hostname", hostname.to_string()), ("token", token.to_string())];
    if let Some(ipv6) = addresses.ipv6 {
        pairs.push(("ipv6", ipv6.to_string()));
    }
    if let Some(ipv4) = addresses.ipv4 {
        pairs.push(("ipv4", ipv4.to_string()));
    }
    pairs
}

/// Classify a response body
pub fn classify(body: &str) -> UpdateOutcome {
    if body.contains(SUCCESS_MARKER) {
        UpdateOutcome::Success
    } else {
        UpdateOutcome::TransientFailure(body.trim().to_string())
    }
}

#[async_trait]
impl UpdateClient for Dynv6Client {
    async fn publish(&self, addresses: &AddressPair, hostname: &str, token: &str) -> UpdateOutcome {
        tracing::debug!("Publishing {} for {}", addresses, hostname);

        let request = match self.build_request(addresses, hostname, token) {
            Ok(request) => request,
            Err(e) => {
                return UpdateOutcome::TransientFailure(format!(
                    "invalid request: {}",
                    e.without_url()
                ));
            }
        };

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                return UpdateOutcome::TransientFailure(format!(
                    "HTTP request failed: {}",
                    e.without_url()
                ));
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => {
                tracing::debug!("dynv6 responded {} for {}: {}", status, hostname, body.trim());
                classify(&body)
            }
            Err(e) => UpdateOutcome::TransientFailure(format!(
                "Failed to read response ({}): {}",
                status,
                e.without_url()
            )),
        }
    }

    fn client_name(&self) -> &'static str {
        "dynv6"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::RawQuery;
    use axum::routing::get;
    use std::sync::{Arc, Mutex};

    fn pair(v4: Option<&str>, v6: Option<&str>) -> AddressPair {
        AddressPair {
            ipv4: v4.map(|s| s.parse().unwrap()),
            ipv6: v6.map(|s| s.parse().unwrap()),
        }
    }

    #[test]
    fn request_carries_both_families_in_order() {
        let client = Dynv6Client::with_update_url("http://dynv6.test/api/update").unwrap();
        let request = client
            .build_request(
                &pair(Some("203.0.113.5"), Some("2001:db8::1")),
                "a.dns.navy",
                "tok",
            )
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "http://dynv6.test/api/update?hostname=a.dns.navy&token=tok&ipv6=2001%3Adb8%3A%3A1&ipv4=203.0.113.5"
        );
    }

    #[test]
    fn absent_family_is_omitted() {
        let client = Dynv6Client::with_update_url("http://dynv6.test/api/update").unwrap();
        let request = client
            .build_request(&pair(Some("203.0.113.5"), None), "a.dns.navy", "tok")
            .unwrap();

        assert_eq!(request.url().query(), Some("hostname=a.dns.navy&token=tok&ipv4=203.0.113.5"));
    }

    #[test]
    fn classification_looks_for_the_marker() {
        assert_eq!(classify("addresses updated"), UpdateOutcome::Success);
        assert_eq!(classify("updated a.example\n"), UpdateOutcome::Success);
        assert_eq!(
            classify("error: invalid token\n"),
            UpdateOutcome::TransientFailure("error: invalid token".to_string())
        );
        assert!(!classify("addresses unchanged").is_success());
    }

    #[test]
    fn debug_does_not_leak_anything_sensitive() {
        let client = Dynv6Client::new().unwrap();
        let rendered = format!("{:?}", client);
        assert!(rendered.contains(DEFAULT_UPDATE_URL));
        assert_eq!(client.client_name(), "dynv6");
    }

    async fn serve(body: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let app = Router::new().route(
            "/api/update",
            get(move |RawQuery(query): RawQuery| {
                let recorder = Arc::clone(&recorder);
                async move {
                    recorder.lock().unwrap().push(query.unwrap_or_default());
                    body
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/api/update", addr), seen)
    }

    #[tokio::test]
    async fn publish_against_loopback_server() {
        let (url, seen) = serve("addresses updated").await;
        let client = Dynv6Client::with_update_url(url).unwrap();

        let outcome = client
            .publish(&pair(None, Some("2001:db8::1")), "a.dns.navy", "tok")
            .await;

        assert_eq!(outcome, UpdateOutcome::Success);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["hostname=a.dns.navy&token=tok&ipv6=2001%3Adb8%3A%3A1".to_string()]
        );
    }

    #[tokio::test]
    async fn rejection_body_becomes_the_reason() {
        let (url, _) = serve("invalid authentication token").await;
        let client = Dynv6Client::with_update_url(url).unwrap();

        let outcome = client
            .publish(&pair(Some("203.0.113.5"), None), "a.dns.navy", "bad")
            .await;

        assert_eq!(
            outcome,
            UpdateOutcome::TransientFailure("invalid authentication token".to_string())
        );
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Dynv6Client::with_update_url(format!("http://{}/api/update", addr)).unwrap();
        let outcome = client
            .publish(&pair(Some("203.0.113.5"), None), "a.dns.navy", "secret-token")
            .await;

        match outcome {
            UpdateOutcome::TransientFailure(reason) => {
                assert!(reason.starts_with("HTTP request failed"));
                assert!(!reason.contains("secret-token"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
