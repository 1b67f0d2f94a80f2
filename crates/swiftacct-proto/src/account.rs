use crate::headers::{
    strip_prefix_ignore_case, ACCOUNT_BYTES_USED, ACCOUNT_CONTAINER_COUNT,
    ACCOUNT_METADATA_PREFIX, ACCOUNT_OBJECT_COUNT, ACCOUNT_TEMPORARY_URL_KEY,
};
use crate::{HeaderSet, MetadataMap, ProtocolError};
use serde::Serialize;

/// Account attributes read from an account HEAD response.
///
/// The temporary URL key is tracked by presence only; its value is never kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    container_count: u64,
    object_count: u64,
    bytes_used: u64,
    temp_url_key_set: bool,
    metadata: MetadataMap,
}

impl Account {
    pub fn container_count(&self) -> u64 {
        self.container_count
    }

    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    pub fn bytes_used(&self) -> u64 {
        self.bytes_used
    }

    pub fn has_temp_url_key(&self) -> bool {
        self.temp_url_key_set
    }

    /// Custom metadata with the `X-Account-Meta-` prefix stripped.
    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }
}

/// Build an [`Account`] from the headers of an account HEAD response.
pub fn parse_account(headers: &HeaderSet) -> Result<Account, ProtocolError> {
    if headers.is_empty() {
        return Err(ProtocolError::MalformedResponse(
            "account response carried no headers".to_owned(),
        ));
    }

    let mut temp_url_key_set = false;
    let mut metadata = MetadataMap::new();
    for (key, value) in headers.with_prefix(ACCOUNT_METADATA_PREFIX) {
        if is_temp_url_key_suffix(key) {
            temp_url_key_set = true;
        } else {
            metadata.insert(key.to_owned(), value.to_owned());
        }
    }

    Ok(Account {
        container_count: read_count(headers, ACCOUNT_CONTAINER_COUNT)?,
        object_count: read_count(headers, ACCOUNT_OBJECT_COUNT)?,
        bytes_used: read_count(headers, ACCOUNT_BYTES_USED)?,
        temp_url_key_set,
        metadata,
    })
}

/// `Temp-URL-Key` and its rotation slots (`Temp-URL-Key-2`) are secrets.
fn is_temp_url_key_suffix(key: &str) -> bool {
    let name = &ACCOUNT_TEMPORARY_URL_KEY[ACCOUNT_METADATA_PREFIX.len()..];
    match strip_prefix_ignore_case(key, name) {
        Some(rest) => rest.is_empty() || rest.starts_with('-'),
        None => false,
    }
}

/// Absent counters are zero; the service omits some of them when empty.
fn read_count(headers: &HeaderSet, name: &str) -> Result<u64, ProtocolError> {
    match headers.get(name) {
        None => Ok(0),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ProtocolError::MalformedResponse(format!("{name} is not a count: '{raw}'"))
        }),
    }
}
