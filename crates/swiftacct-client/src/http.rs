use crate::{AccountConfig, HeaderSet, Method, Request, Response, Transport, TransportError};
use std::time::Duration;
use swiftacct_proto::headers::{canonical_name, AUTH_TOKEN};

const USER_AGENT: &str = concat!("swiftacct/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP transport for a single account storage URL.
///
/// Every request goes to `{url}{path}` and carries `User-Agent` plus, when a
/// token is configured, `X-Auth-Token`. Any completed exchange is returned as a
/// [`Response`] whatever its status code; only failures to complete the exchange
/// become [`TransportError`]s.
pub struct HttpTransport {
    config: AccountConfig,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: AccountConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout_secs.map(Duration::from_secs))
            .build();
        let agent = ureq::Agent::new_with_config(agent_config);
        Self { config, agent }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    fn with_headers<B>(
        &self,
        mut req: ureq::RequestBuilder<B>,
        headers: &HeaderSet,
    ) -> ureq::RequestBuilder<B> {
        req = req.header("User-Agent", USER_AGENT);
        if let Some(ref token) = self.config.auth_token {
            req = req.header(AUTH_TOKEN, token.as_str());
        }
        for (name, value) in headers.iter() {
            req = req.header(name, value);
        }
        req
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let url = self.url(&request.path);
        let header_count = request.headers.len();
        tracing::debug!("{} {url} ({header_count} headers)", request.method);

        let result = match request.method {
            Method::Head => self
                .with_headers(self.agent.head(&url), &request.headers)
                .call(),
            Method::Post => self
                .with_headers(self.agent.post(&url), &request.headers)
                .send_empty(),
        };
        let resp = result.map_err(map_ureq_error)?;

        let status = resp.status().as_u16();
        let headers: HeaderSet = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    canonical_name(name.as_str()),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        tracing::debug!("{} {url} -> {status}", request.method);
        Ok(Response::new(status, headers))
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Io(e) => TransportError::Io(e),
        ureq::Error::Http(e) => TransportError::InvalidRequest(e.to_string()),
        ureq::Error::BadUri(uri) => TransportError::InvalidRequest(format!("bad URI: {uri}")),
        other => TransportError::Http(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};

    /// A captured HTTP request for header inspection.
    #[derive(Debug, Clone)]
    struct CapturedRequest {
        method: String,
        path: String,
        headers: HashMap<String, String>,
    }

    /// Answers every request with a fixed raw response and records what it saw.
    struct MockServer {
        addr: String,
        _handle: std::thread::JoinHandle<()>,
        requests: Arc<Mutex<Vec<CapturedRequest>>>,
    }

    impl MockServer {
        fn start(response: &'static str) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = format!("http://{}", listener.local_addr().unwrap());
            let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));

            let requests_clone = Arc::clone(&requests);
            let handle = std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { break };
                    let reqs = Arc::clone(&requests_clone);

                    std::thread::spawn(move || {
                        let mut reader = BufReader::new(stream.try_clone().unwrap());
                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).is_err() {
                            return;
                        }
                        let parts: Vec<&str> = request_line.trim().splitn(3, ' ').collect();
                        if parts.len() < 2 {
                            return;
                        }

                        let mut content_length: usize = 0;
                        let mut headers = HashMap::new();
                        loop {
                            let mut line = String::new();
                            if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                                break;
                            }
                            if let Some((k, v)) = line.trim().split_once(':') {
                                let k = k.to_lowercase();
                                if k == "content-length" {
                                    content_length = v.trim().parse().unwrap_or(0);
                                }
                                headers.insert(k, v.trim().to_owned());
                            }
                        }
                        let mut body = vec![0u8; content_length];
                        if content_length > 0 {
                            let _ = reader.read_exact(&mut body);
                        }

                        reqs.lock().unwrap().push(CapturedRequest {
                            method: parts[0].to_owned(),
                            path: parts[1].to_owned(),
                            headers,
                        });

                        let _ = stream.write_all(response.as_bytes());
                        let _ = stream.flush();
                    });
                }
            });

            MockServer {
                addr,
                _handle: handle,
                requests,
            }
        }

        fn captured_requests(&self) -> Vec<CapturedRequest> {
            // Allow the handler thread to record the request.
            std::thread::sleep(Duration::from_millis(50));
            self.requests.lock().unwrap().clone()
        }
    }

    const NO_CONTENT: &str = "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n";

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::new(AccountConfig::new(url))
    }

    #[test]
    fn head_returns_status_and_canonical_headers() {
        let server = MockServer::start(
            "HTTP/1.1 204 No Content\r\n\
             X-Account-Container-Count: 2\r\n\
             x-account-meta-color: red\r\n\
             Connection: close\r\n\r\n",
        );
        let transport = transport(&format!("{}/v1/AUTH_test", server.addr));

        let resp = transport.execute(&Request::new(Method::Head, "")).unwrap();
        assert_eq!(resp.status, 204);
        assert_eq!(resp.headers.get("x-account-container-count"), Some("2"));
        let names: Vec<&str> = resp.headers.iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"X-Account-Meta-Color"), "{names:?}");

        let reqs = server.captured_requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].method, "HEAD");
        assert_eq!(reqs[0].path, "/v1/AUTH_test");
    }

    #[test]
    fn post_sends_request_headers() {
        let server = MockServer::start(NO_CONTENT);
        let transport = transport(&server.addr);

        let req = Request::new(Method::Post, "")
            .with_header("X-Account-Meta-Color", "red")
            .with_header("X-Remove-Account-Meta-Shape", "");
        let resp = transport.execute(&req).unwrap();
        assert_eq!(resp.status, 204);

        let reqs = server.captured_requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].method, "POST");
        let h = &reqs[0].headers;
        assert_eq!(
            h.get("x-account-meta-color").map(String::as_str),
            Some("red")
        );
        assert_eq!(
            h.get("x-remove-account-meta-shape").map(String::as_str),
            Some("")
        );
        assert!(h
            .get("user-agent")
            .is_some_and(|ua| ua.starts_with("swiftacct/")));
    }

    #[test]
    fn error_statuses_are_responses_not_errors() {
        let server = MockServer::start(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let resp = transport(&server.addr)
            .execute(&Request::new(Method::Post, ""))
            .unwrap();
        assert_eq!(resp.status, 401);
    }

    #[test]
    fn auth_token_sent_as_x_auth_token() {
        let server = MockServer::start(NO_CONTENT);
        let transport = HttpTransport::new(AccountConfig::new(&server.addr).with_token("tok-42"));
        transport.execute(&Request::new(Method::Head, "")).unwrap();

        let reqs = server.captured_requests();
        assert_eq!(
            reqs[0].headers.get("x-auth-token").map(String::as_str),
            Some("tok-42")
        );
    }

    #[test]
    fn no_auth_header_without_token() {
        let server = MockServer::start(NO_CONTENT);
        transport(&server.addr)
            .execute(&Request::new(Method::Head, ""))
            .unwrap();

        let reqs = server.captured_requests();
        assert!(!reqs[0].headers.contains_key("x-auth-token"));
    }

    #[test]
    fn connection_refused_is_transport_error() {
        let result = transport("http://127.0.0.1:1").execute(&Request::new(Method::Head, ""));
        assert!(matches!(result, Err(TransportError::Io(_))), "{result:?}");
    }

    #[test]
    fn timeout_is_transport_error() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        let _handle = std::thread::spawn(move || {
            let held: Vec<_> = listener.incoming().map_while(Result::ok).collect();
            drop(held);
        });

        let transport = HttpTransport::new(AccountConfig::new(&addr).with_timeout(1));
        let started = std::time::Instant::now();
        let err = transport
            .execute(&Request::new(Method::Head, ""))
            .unwrap_err();
        let msg = err.to_string().to_ascii_lowercase();
        assert!(msg.contains("timeout") || msg.contains("timed out"), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
