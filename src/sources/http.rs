use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::{
    common::{errors::ResolveError, types::AnyResult},
    protocol::tracks::TrackInfo,
    sources::SourcePlugin,
};

const USER_AGENT: &str = concat!("jukelink/", env!("CARGO_PKG_VERSION"));

/// Direct HTTP(S) and Icecast URLs.
pub struct HttpSource {
    url_regex: Regex,
    client: Client,
}

impl HttpSource {
    pub fn new() -> AnyResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            url_regex: Regex::new(r"^(?:https?|icy)://\S+$")?,
            client,
        })
    }

    /// Last path segment, percent-decoded, without query string.
    fn title_from_url(url: &str) -> String {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let segment = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("Unknown Title");

        urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string())
    }
}

#[async_trait]
impl SourcePlugin for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn can_handle(&self, identifier: &str) -> bool {
        self.url_regex.is_match(identifier)
    }

    async fn load(&self, identifier: &str) -> Result<TrackInfo, ResolveError> {
        // Icecast streams do not answer HEAD; take them as-is.
        if !identifier.starts_with("icy://") {
            let response = self
                .client
                .head(identifier)
                .send()
                .await
                .map_err(|e| ResolveError::resolution(identifier, e))?;

            let status = response.status();
            debug!("HEAD {} -> {}", identifier, status);
            match status {
                s if s.is_success() => {}
                StatusCode::NOT_FOUND | StatusCode::GONE => {
                    return Err(ResolveError::NotFound(identifier.to_string()));
                }
                // Servers that refuse HEAD may still stream on GET.
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {}
                s => {
                    return Err(ResolveError::resolution(identifier, format!("HTTP {}", s)));
                }
            }
        }

        Ok(TrackInfo {
            title: Self::title_from_url(identifier),
            locator: identifier.to_string(),
            duration_secs: None,
            thumbnail: None,
            source_name: self.name().to_string(),
        })
    }
}
