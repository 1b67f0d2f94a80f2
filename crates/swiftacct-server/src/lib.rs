//! Reference HTTP server for the object-storage account protocol.
//!
//! Accounts are kept in memory under `/v1/{account}` and created on first use.
//! `HEAD`/`GET` report counters, metadata and the temporary URL key header;
//! `POST` applies `X-Account-Meta-*` and `X-Remove-Account-Meta-*` headers and
//! answers 204. When a token is configured every account request must carry it
//! in `X-Auth-Token`.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use swiftacct_proto::headers::{
    canonical_name, strip_prefix_ignore_case, ACCOUNT_BYTES_USED, ACCOUNT_CONTAINER_COUNT,
    ACCOUNT_METADATA_PREFIX, ACCOUNT_OBJECT_COUNT, ACCOUNT_REMOVE_METADATA_PREFIX,
    ACCOUNT_TEMPORARY_URL_KEY, AUTH_TOKEN,
};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, info, warn};

pub const MAX_META_COUNT: usize = 90;
pub const MAX_META_NAME_LENGTH: usize = 128;
pub const MAX_META_VALUE_LENGTH: usize = 256;

/// State of one account. Metadata keys are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountState {
    pub container_count: u64,
    pub object_count: u64,
    pub bytes_used: u64,
    pub metadata: BTreeMap<String, String>,
    pub temp_url_key: Option<String>,
    pub timestamp: String,
}

impl AccountState {
    fn created_now() -> Self {
        Self {
            timestamp: swift_timestamp(SystemTime::now()),
            ..Self::default()
        }
    }

    /// Headers reported for an account HEAD or GET.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            (
                ACCOUNT_CONTAINER_COUNT.to_owned(),
                self.container_count.to_string(),
            ),
            (
                ACCOUNT_OBJECT_COUNT.to_owned(),
                self.object_count.to_string(),
            ),
            (ACCOUNT_BYTES_USED.to_owned(), self.bytes_used.to_string()),
            ("X-Timestamp".to_owned(), self.timestamp.clone()),
        ];
        for (key, value) in &self.metadata {
            headers.push((
                format!("{ACCOUNT_METADATA_PREFIX}{}", canonical_name(key)),
                value.clone(),
            ));
        }
        if let Some(ref key) = self.temp_url_key {
            headers.push((ACCOUNT_TEMPORARY_URL_KEY.to_owned(), key.clone()));
        }
        headers
    }

    /// Apply the metadata headers of a `POST`. Set headers with an empty value
    /// delete the key; remove headers are applied after set headers.
    pub fn apply(&mut self, headers: &[(String, String)]) -> Result<(), String> {
        let temp_url_suffix = &ACCOUNT_TEMPORARY_URL_KEY[ACCOUNT_METADATA_PREFIX.len()..];

        for (name, value) in headers {
            if name.eq_ignore_ascii_case(ACCOUNT_TEMPORARY_URL_KEY) {
                self.temp_url_key = (!value.is_empty()).then(|| value.clone());
            } else if let Some(key) = strip_prefix_ignore_case(name, ACCOUNT_METADATA_PREFIX) {
                check_limits(key, value)?;
                let key = key.to_ascii_lowercase();
                if value.is_empty() {
                    self.metadata.remove(&key);
                } else {
                    self.metadata.insert(key, value.clone());
                }
            }
        }
        for (name, _) in headers {
            if let Some(key) = strip_prefix_ignore_case(name, ACCOUNT_REMOVE_METADATA_PREFIX) {
                if key.eq_ignore_ascii_case(temp_url_suffix) {
                    self.temp_url_key = None;
                } else {
                    self.metadata.remove(&key.to_ascii_lowercase());
                }
            }
        }

        if self.metadata.len() > MAX_META_COUNT {
            return Err(format!("too many metadata items; max {MAX_META_COUNT}"));
        }
        Ok(())
    }
}

fn check_limits(key: &str, value: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("metadata name cannot be empty".to_owned());
    }
    if key.len() > MAX_META_NAME_LENGTH {
        return Err(format!(
            "metadata name too long; max {MAX_META_NAME_LENGTH}"
        ));
    }
    if value.len() > MAX_META_VALUE_LENGTH {
        return Err(format!(
            "metadata value too long; max {MAX_META_VALUE_LENGTH}"
        ));
    }
    Ok(())
}

/// Seconds since the epoch with five decimals, e.g. `1700000000.12345`.
pub fn swift_timestamp(at: SystemTime) -> String {
    let since = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:05}", since.as_secs(), since.subsec_micros() / 10)
}

/// In-memory account store shared by request handlers.
pub struct Store {
    token: Option<String>,
    accounts: RwLock<BTreeMap<String, AccountState>>,
}

impl Store {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            accounts: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn is_authorized(&self, presented: Option<&str>) -> bool {
        match self.token {
            Some(ref expected) => presented == Some(expected.as_str()),
            None => true,
        }
    }

    /// Snapshot of an account, creating it if it does not exist yet.
    pub fn account(&self, name: &str) -> AccountState {
        let mut accounts = self.accounts.write().expect("account lock poisoned");
        accounts
            .entry(name.to_owned())
            .or_insert_with(AccountState::created_now)
            .clone()
    }

    /// Set the usage counters of an account.
    pub fn set_usage(&self, name: &str, containers: u64, objects: u64, bytes: u64) {
        let mut accounts = self.accounts.write().expect("account lock poisoned");
        let state = accounts
            .entry(name.to_owned())
            .or_insert_with(AccountState::created_now);
        state.container_count = containers;
        state.object_count = objects;
        state.bytes_used = bytes;
    }

    /// Apply an update atomically: on error the account is left unchanged.
    pub fn update(&self, name: &str, headers: &[(String, String)]) -> Result<(), String> {
        let mut accounts = self.accounts.write().expect("account lock poisoned");
        let current = accounts
            .entry(name.to_owned())
            .or_insert_with(AccountState::created_now);
        let mut next = current.clone();
        next.apply(headers)?;
        *current = next;
        Ok(())
    }
}

/// Extract the account name from `/v1/{account}`, ignoring a trailing slash
/// and any query string.
pub fn parse_account_route(url: &str) -> Option<&str> {
    let path = url.split('?').next().unwrap_or(url);
    let account = path.strip_prefix("/v1/")?;
    let account = account.strip_suffix('/').unwrap_or(account);
    if account.is_empty() || account.contains('/') {
        return None;
    }
    Some(account)
}

fn header_value<'a>(req: &'a tiny_http::Request, name: &str) -> Option<&'a str> {
    req.headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

fn request_headers(req: &tiny_http::Request) -> Vec<(String, String)> {
    req.headers()
        .iter()
        .map(|h| {
            (
                h.field.as_str().as_str().to_owned(),
                h.value.as_str().to_owned(),
            )
        })
        .collect()
}

fn respond_err(req: tiny_http::Request, code: u16, msg: &str) {
    let _ = req.respond(Response::from_string(msg).with_status_code(StatusCode(code)));
}

fn respond_account(req: tiny_http::Request, state: &AccountState) {
    let mut response = Response::empty(204);
    for (name, value) in state.headers() {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response = response.with_header(header),
            Err(()) => warn!("skipping unrepresentable header {name}"),
        }
    }
    let _ = req.respond(response);
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(store: &Store, req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    if url == "/health" && method == Method::Get {
        let _ = req.respond(Response::from_string(r#"{"status":"ok"}"#));
        return;
    }

    let Some(account) = parse_account_route(&url).map(str::to_owned) else {
        respond_err(req, 404, "not found");
        return;
    };

    if !store.is_authorized(header_value(&req, AUTH_TOKEN)) {
        debug!("{method} {url}: rejected token");
        respond_err(req, 401, "unauthorized");
        return;
    }

    match method {
        Method::Head | Method::Get => respond_account(req, &store.account(&account)),
        Method::Post => {
            let headers = request_headers(&req);
            match store.update(&account, &headers) {
                Ok(()) => {
                    info!("POST {account}: updated");
                    let _ = req.respond(Response::empty(204));
                }
                Err(msg) => {
                    info!("POST {account}: rejected: {msg}");
                    respond_err(req, 400, &msg);
                }
            }
        }
        _ => respond_err(req, 405, "method not allowed"),
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(
    store: &Store,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let server = Server::http(addr)?;
    info!("listening on {addr}");
    for request in server.incoming_requests() {
        handle_request(store, request);
    }
    Ok(())
}

/// A test helper that starts a server on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}`; `store` is shared with the
/// handler thread so tests can seed usage counters.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub store: Arc<Store>,
    _server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server, optionally requiring `token`.
    /// Binds to `127.0.0.1:0` (random port).
    pub fn start(token: Option<&str>) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let store = Arc::new(Store::new(token.map(str::to_owned)));
        let srv = Arc::clone(&server);
        let handler_store = Arc::clone(&store);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&handler_store, request);
            }
        });

        Self {
            url,
            port,
            store,
            _server: server,
            _handle: handle,
        }
    }

    /// Storage URL of `account` on this server.
    pub fn account_url(&self, account: &str) -> String {
        format!("{}/v1/{account}", self.url)
    }
}
