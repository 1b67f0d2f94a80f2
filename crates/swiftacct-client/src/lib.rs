//! Account-level operations against an object-storage service.
//!
//! [`AccountService`] turns the four account operations (read account, set
//! metadata, remove metadata, rotate the temporary URL key) into requests and
//! interprets their responses. Requests are executed through the [`Transport`]
//! trait; [`http::HttpTransport`] is the blocking HTTP implementation, configured
//! by [`AccountConfig`].

pub mod config;
pub mod http;
pub mod request;
pub mod service;

pub use config::AccountConfig;
pub use request::{Method, Request, Response};
pub use service::AccountService;
pub use swiftacct_proto::{Account, HeaderSet, MetadataMap, MetadataOp};

use std::sync::Arc;
use swiftacct_proto::ProtocolError;
use thiserror::Error;

/// Failure to complete an HTTP exchange at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unexpected status {status} for account request")]
    UnexpectedStatus { status: u16 },
    #[error("account config error: {0}")]
    Config(String),
    #[error("account I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<ProtocolError> for AccountError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidArgument(msg) => AccountError::InvalidArgument(msg),
            ProtocolError::MalformedResponse(msg) => AccountError::MalformedResponse(msg),
        }
    }
}

/// Executes a single request/response exchange.
///
/// Implementations must be safe to share between threads and must report a
/// failed exchange as an error rather than a synthetic response.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}
