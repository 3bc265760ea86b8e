//! REST bridge transport adapter.
//!
//! Implements [`bridge::ConfigurationFactory`] and
//! [`bridge::ClientConfiguration`] over `reqwest`: one `reqwest::Client` per
//! destination address, built on a cache miss and shared by every call the
//! [`bridge::ClientConfigCache`] routes to it.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL assembly, header encoding, timeouts and connection
//! handling live here. The [`bridge`] crate sees only the port traits.
//!
//! ## Behaviour
//!
//! - Redirects are not followed; a 3xx reaches the classifier unchanged.
//! - Any HTTP status is returned as a response. Only failures that prevent a
//!   response (connection, timeout, invalid URL) are errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge::{
    Address, BridgeError, ClientConfiguration, ConfigurationFactory, EndpointConfig, HttpResponse,
    InvocationRequest, ResourceRegistry, ResponseHeaders,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, trace};
use url::Url;

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Builds a [`ReqwestClientConfiguration`] per destination address.
///
/// The resource registry is built once from the endpoint configuration and
/// shared by every configuration this factory creates.
#[derive(Debug, Clone)]
pub struct ReqwestClientFactory {
    timeout: Duration,
    registry: Arc<ResourceRegistry>,
}

impl ReqwestClientFactory {
    pub fn new(endpoint: &EndpointConfig) -> Self {
        Self {
            timeout: Duration::from_millis(endpoint.timeout_ms),
            registry: Arc::new(ResourceRegistry::new(endpoint.resource_interfaces.clone())),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ConfigurationFactory for ReqwestClientFactory {
    fn create(&self, address: &Address) -> Result<Arc<dyn ClientConfiguration>, BridgeError> {
        let configuration_error = |message: String| BridgeError::Configuration {
            address: address.clone(),
            message,
        };

        let url = Url::parse(address.as_str())
            .map_err(|e| configuration_error(format!("invalid address: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(configuration_error(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| configuration_error(format!("cannot build HTTP client: {e}")))?;

        debug!(%address, timeout_ms = self.timeout.as_millis() as u64, "HTTP client created");
        Ok(Arc::new(ReqwestClientConfiguration {
            address: address.clone(),
            client,
            registry: Arc::clone(&self.registry),
        }))
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A `reqwest` client bound to one destination address.
#[derive(Debug)]
pub struct ReqwestClientConfiguration {
    address: Address,
    client: reqwest::Client,
    registry: Arc<ResourceRegistry>,
}

#[async_trait]
impl ClientConfiguration for ReqwestClientConfiguration {
    fn address(&self) -> &Address {
        &self.address
    }

    fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    async fn execute(&self, request: InvocationRequest) -> Result<HttpResponse, BridgeError> {
        let url = request_url(&request)?;
        let headers = header_map(&request)?;
        trace!(method = %request.method, %url, "Sending request");

        let mut builder = self.client.request(request.method, url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BridgeError::transport(describe(&e)))?;

        let status = response.status().as_u16();
        let headers: ResponseHeaders = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::transport(describe(&e)))?
            .to_vec();

        trace!(status, bytes = body.len(), "Response read");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Request assembly
// ---------------------------------------------------------------------------

/// The absolute URL of `request`: base, then path, then query.
///
/// Query parameters are appended to any query already present in the base.
fn request_url(request: &InvocationRequest) -> Result<Url, BridgeError> {
    let target = request.target();
    let mut url = Url::parse(&target)
        .map_err(|e| BridgeError::malformed(format!("invalid request URL '{target}': {e}")))?;
    if !request.query.is_empty() {
        url.query_pairs_mut().extend_pairs(&request.query);
    }
    Ok(url)
}

fn header_map(request: &InvocationRequest) -> Result<HeaderMap, BridgeError> {
    let mut headers = HeaderMap::with_capacity(request.headers.len());
    for (name, value) in &request.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| BridgeError::malformed(format!("invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| BridgeError::malformed(format!("invalid value for header '{name}': {e}")))?;
        headers.append(header_name, header_value);
    }
    Ok(headers)
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge::EndpointUri;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn factory() -> ReqwestClientFactory {
        factory_with_timeout(5_000)
    }

    fn factory_with_timeout(timeout_ms: u64) -> ReqwestClientFactory {
        let mut endpoint = EndpointConfig::new(
            EndpointUri::new("rest://test").unwrap(),
            Address::new("http://localhost").unwrap(),
        );
        endpoint.timeout_ms = timeout_ms;
        ReqwestClientFactory::new(&endpoint)
    }

    /// Reads one HTTP/1.1 request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before request was complete");
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).into_owned();
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return text;
            }
        }
    }

    #[test]
    fn url_joins_path_and_encodes_query() {
        let mut request = InvocationRequest::new(http_method("GET"), "http://h:8080/api/");
        request.path = Some("/customers/7".into());
        request.query.insert("name".into(), "a b&c".into());
        request.query.insert("page".into(), "2".into());

        let url = request_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://h:8080/api/customers/7?name=a+b%26c&page=2"
        );
    }

    #[test]
    fn url_without_query_has_no_question_mark() {
        let request = InvocationRequest::new(http_method("GET"), "http://h/api");
        assert_eq!(request_url(&request).unwrap().as_str(), "http://h/api");
    }

    #[test]
    fn invalid_headers_are_malformed_input() {
        let mut request = InvocationRequest::new(http_method("GET"), "http://h/api");
        request.headers.insert("bad header".into(), "x".into());
        assert!(matches!(
            header_map(&request),
            Err(BridgeError::MalformedInput { .. })
        ));
    }

    #[test]
    fn malformed_or_non_http_addresses_are_rejected() {
        let factory = factory();
        for address in ["not a url", "ftp://files.example.com/"] {
            let err = factory.create(&Address::new(address).unwrap()).unwrap_err();
            assert!(
                matches!(err, BridgeError::Configuration { .. }),
                "{address}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn executes_against_a_loopback_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream
                .write_all(
                    b"HTTP/1.1 404 Not Found\r\n\
                      Content-Length: 7\r\n\
                      X-Reply: yes\r\n\
                      Connection: close\r\n\r\n\
                      missing",
                )
                .await
                .unwrap();
            request
        });

        let address = Address::new(format!("http://127.0.0.1:{port}/api")).unwrap();
        let config = factory().create(&address).unwrap();
        let mut request = InvocationRequest::new(http_method("POST"), config.address().as_str());
        request.path = Some("/customers".into());
        request.query.insert("dry_run".into(), "true".into());
        request.headers.insert("X-Trace".into(), "t-1".into());
        request.body = Some(b"hello".to_vec());

        let response = config.execute(request).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.headers.first("X-Reply"), Some("yes"));
        assert_eq!(response.body, b"missing");

        let seen = server.await.unwrap();
        assert!(seen.starts_with("POST /api/customers?dry_run=true HTTP/1.1\r\n"), "{seen}");
        assert!(seen.to_ascii_lowercase().contains("x-trace: t-1"), "{seen}");
        assert!(seen.ends_with("hello"), "{seen}");
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let address = Address::new(format!("http://127.0.0.1:{port}")).unwrap();
        let config = factory().create(&address).unwrap();
        let request = InvocationRequest::new(http_method("GET"), config.address().as_str());

        assert!(matches!(
            config.execute(request).await,
            Err(BridgeError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn unanswered_request_times_out_as_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let address = Address::new(format!("http://127.0.0.1:{port}")).unwrap();
        let config = factory_with_timeout(100).create(&address).unwrap();
        let request = InvocationRequest::new(http_method("GET"), config.address().as_str());

        match config.execute(request).await {
            Err(BridgeError::Transport { message }) => {
                assert!(message.contains("timed out"), "{message}")
            }
            other => panic!("expected a transport timeout, got {other:?}"),
        }
        server.abort();
    }

    fn http_method(name: &str) -> reqwest::Method {
        reqwest::Method::from_bytes(name.as_bytes()).unwrap()
    }
}
