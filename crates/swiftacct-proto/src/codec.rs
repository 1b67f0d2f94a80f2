use crate::headers::{ACCOUNT_METADATA_PREFIX, ACCOUNT_REMOVE_METADATA_PREFIX};
use crate::{HeaderSet, MetadataMap, ProtocolError};
use std::collections::BTreeSet;

/// Which metadata header family a request writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOp {
    /// Create or overwrite the named keys.
    Set,
    /// Remove the named keys. The server ignores the values.
    Remove,
}

impl MetadataOp {
    pub fn prefix(self) -> &'static str {
        match self {
            MetadataOp::Set => ACCOUNT_METADATA_PREFIX,
            MetadataOp::Remove => ACCOUNT_REMOVE_METADATA_PREFIX,
        }
    }
}

impl std::fmt::Display for MetadataOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataOp::Set => write!(f, "set"),
            MetadataOp::Remove => write!(f, "remove"),
        }
    }
}

/// Encode `metadata` as one header per key: `op.prefix() + key`, value unchanged.
///
/// Key casing is kept as given. Keys that only differ by ASCII case collapse
/// into a single header; `validate_metadata` rejects such maps up front.
pub fn build_headers(op: MetadataOp, metadata: &MetadataMap) -> HeaderSet {
    let prefix = op.prefix();
    metadata
        .iter()
        .map(|(key, value)| (format!("{prefix}{key}"), value.clone()))
        .collect()
}

/// Reject metadata that cannot be carried as headers.
pub fn validate_metadata(metadata: &MetadataMap) -> Result<(), ProtocolError> {
    let mut seen = BTreeSet::new();
    for (key, value) in metadata {
        if key.is_empty() {
            return Err(ProtocolError::InvalidArgument(
                "metadata key must not be empty".to_owned(),
            ));
        }
        if !key.bytes().all(is_token_byte) {
            return Err(ProtocolError::InvalidArgument(format!(
                "metadata key '{key}' is not a valid header name"
            )));
        }
        if !seen.insert(key.to_ascii_lowercase()) {
            return Err(ProtocolError::InvalidArgument(format!(
                "metadata key '{key}' duplicates another key ignoring case"
            )));
        }
        if !is_header_value(value) {
            return Err(ProtocolError::InvalidArgument(format!(
                "metadata value for '{key}' contains control characters"
            )));
        }
    }
    Ok(())
}

pub fn validate_temp_url_key(key: &str) -> Result<(), ProtocolError> {
    if key.trim().is_empty() {
        return Err(ProtocolError::InvalidArgument(
            "temporary URL key must not be empty".to_owned(),
        ));
    }
    if !is_header_value(key) {
        return Err(ProtocolError::InvalidArgument(
            "temporary URL key contains control characters".to_owned(),
        ));
    }
    Ok(())
}

// RFC 9110 token characters.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn is_header_value(value: &str) -> bool {
    !value.chars().any(|c| c.is_control() && c != '\t')
}
