//! Wire protocol for object-storage account operations.
//!
//! This crate defines the account header convention: the fixed header names
//! (`headers`), a case-insensitive `HeaderSet`, the metadata codec that turns a
//! `MetadataMap` into set/remove headers (`build_headers`), and the parser that
//! reads an `Account` back out of a response header set (`parse_account`).
//! Nothing here performs I/O.

pub mod account;
pub mod codec;
pub mod headers;

pub use account::{parse_account, Account};
pub use codec::{build_headers, validate_metadata, validate_temp_url_key, MetadataOp};
pub use headers::HeaderSet;

use std::collections::BTreeMap;
use thiserror::Error;

/// Account-level custom metadata, keyed by the name without any header prefix.
pub type MetadataMap = BTreeMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
