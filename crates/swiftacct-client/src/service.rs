use crate::request::ACCOUNT_ROOT;
use crate::{Account, AccountError, MetadataMap, MetadataOp, Method, Request, Transport};
use swiftacct_proto::headers::ACCOUNT_TEMPORARY_URL_KEY;
use swiftacct_proto::{build_headers, parse_account, validate_metadata, validate_temp_url_key};

/// Status the service answers with once an account update is applied.
const UPDATED: u16 = 204;

/// Account operations over an injected [`Transport`].
///
/// Holds no state besides the transport, so one instance can serve any number
/// of callers. Mutating operations return `Ok(true)` only for a 204 response;
/// any other status is `Ok(false)`. Errors are reserved for bad arguments,
/// failed exchanges and unreadable responses.
pub struct AccountService<T> {
    transport: T,
}

impl<T: Transport> AccountService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Read the account root counters and metadata.
    ///
    /// A non-2xx status is reported as [`AccountError::UnexpectedStatus`] before
    /// any header is parsed.
    pub fn get_account(&self) -> Result<Account, AccountError> {
        let request = Request::new(Method::Head, ACCOUNT_ROOT);
        let response = self.transport.execute(&request)?;
        if !response.is_success() {
            return Err(AccountError::UnexpectedStatus {
                status: response.status,
            });
        }
        Ok(parse_account(&response.headers)?)
    }

    /// Create or overwrite the given metadata keys.
    pub fn update_metadata(&self, metadata: &MetadataMap) -> Result<bool, AccountError> {
        self.invoke_metadata(MetadataOp::Set, metadata)
    }

    /// Remove the given metadata keys. Values are sent as given.
    pub fn delete_metadata(&self, metadata: &MetadataMap) -> Result<bool, AccountError> {
        self.invoke_metadata(MetadataOp::Remove, metadata)
    }

    pub fn delete_metadata_keys<I, S>(&self, keys: I) -> Result<bool, AccountError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let metadata: MetadataMap = keys
            .into_iter()
            .map(|key| (key.into(), String::new()))
            .collect();
        self.delete_metadata(&metadata)
    }

    /// Replace the secret used to sign temporary URLs.
    pub fn update_temporary_url_key(&self, key: &str) -> Result<bool, AccountError> {
        validate_temp_url_key(key)?;
        let request =
            Request::new(Method::Post, ACCOUNT_ROOT).with_header(ACCOUNT_TEMPORARY_URL_KEY, key);
        let status = self.transport.execute(&request)?.status;
        tracing::debug!("temporary URL key update -> {status}");
        Ok(status == UPDATED)
    }

    fn invoke_metadata(
        &self,
        op: MetadataOp,
        metadata: &MetadataMap,
    ) -> Result<bool, AccountError> {
        validate_metadata(metadata)?;
        let request =
            Request::new(Method::Post, ACCOUNT_ROOT).with_headers(build_headers(op, metadata));
        let status = self.transport.execute(&request)?.status;
        tracing::debug!("metadata {op} of {} keys -> {status}", metadata.len());
        Ok(status == UPDATED)
    }
}
