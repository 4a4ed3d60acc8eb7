//! Collector endpoint URLs
//!
//! Reports and logs are posted to two sibling endpoints on the collector
//! server. Both carry the public API key and protocol version as query
//! parameters:
//!
//! ```text
//! {server}/api/reports?public_api_key={key}&protocol_version={version}
//! {server}/api/logs?public_api_key={key}&protocol_version={version}
//! ```

use url::Url;

use crate::domain::errors::DomainError;

/// Resolved report and log endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub reports: Url,
    pub logs: Url,
}

impl Endpoints {
    /// Builds both endpoints from the collector base URL
    ///
    /// A trailing slash on `server` is tolerated. Only `http` and `https`
    /// servers are accepted.
    pub fn new(server: &str, api_key: &str, protocol_version: &str) -> Result<Self, DomainError> {
        let base = Url::parse(server).map_err(|e| DomainError::InvalidServer(format!("{server}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(DomainError::InvalidServer(format!(
                "{server}: unsupported scheme '{}'",
                base.scheme()
            )));
        }

        Ok(Self {
            reports: build(&base, "reports", api_key, protocol_version)?,
            logs: build(&base, "logs", api_key, protocol_version)?,
        })
    }
}

fn build(base: &Url, kind: &str, api_key: &str, protocol_version: &str) -> Result<Url, DomainError> {
    let root = base.as_str().trim_end_matches('/');
    let mut url = Url::parse(&format!("{root}/api/{kind}"))
        .map_err(|e| DomainError::InvalidServer(format!("{root}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("public_api_key", api_key)
        .append_pair("protocol_version", protocol_version);
    Ok(url)
}
