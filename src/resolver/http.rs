use super::Resolver;
use crate::error::ResolveError;
use async_trait::async_trait;
use std::time::Duration;

const USER_AGENT: &str = concat!("idresolve/", env!("CARGO_PKG_VERSION"));

/// Resolves identifiers against `GET {base}.info/{identifier}`.
pub struct HttpResolver {
    service_base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpResolver {
    pub fn new(service_base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            service_base_url,
            timeout,
            client,
        }
    }

    pub fn service_base_url(&self) -> &str {
        &self.service_base_url
    }

    pub fn info_url(&self, identifier: &str) -> String {
        info_url(&self.service_base_url, identifier)
    }
}

/// Segments are percent-encoded individually so that the slashes of DOIs and
/// handle-prefixed IGSNs reach the service unchanged.
pub fn info_url(service_base_url: &str, identifier: &str) -> String {
    let path = identifier
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}.info/{}", service_base_url, path)
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, identifier: &str) -> Result<String, ResolveError> {
        let url = self.info_url(identifier);
        tracing::debug!(%url, "resolving identifier");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolveError::Timeout(self.timeout)
                } else {
                    ResolveError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "resolver returned an error status");
            return Err(ResolveError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
