//! Backend connection descriptor parsing.
//!
//! A DSN is a URL of the form `scheme://[token@]host[:port][/project]`
//! identifying the OTLP backend and carrying the auth material every signal
//! exporter attaches to its requests. An absent descriptor means telemetry
//! is disabled; a malformed one is a construction-time error.

use crate::error::{PipelineError, Result};
use std::collections::HashMap;
use url::Url;

/// A parsed backend connection descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    /// URL scheme, either `http` or `https`.
    pub scheme: String,
    /// Host, including a port when one was given.
    pub host: String,
    /// Project path component, without the leading slash.
    pub path: String,
    token: Option<String>,
}

impl Dsn {
    /// Parses a connection descriptor.
    ///
    /// The descriptor must be a valid URL with an `http` or `https` scheme
    /// and a host. The auth token is taken from the URL userinfo, falling
    /// back to a `token` query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDsn`] for malformed input; no
    /// partially populated descriptor is ever produced.
    pub fn parse(dsn: &str) -> Result<Self> {
        let url = Url::parse(dsn).map_err(|e| PipelineError::invalid_dsn(dsn, e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(PipelineError::invalid_dsn(
                    dsn,
                    format!("unsupported scheme {other:?}"),
                ));
            }
        }

        // The WHATWG parser reinterprets the first path segment of an
        // empty authority as the host ("https:///1" becomes host 0.0.0.1),
        // so an empty authority is rejected from the raw input.
        if let Some((_, rest)) = dsn.split_once("://")
            && rest.chars().next().is_none_or(|c| matches!(c, '/' | '?' | '#'))
        {
            return Err(PipelineError::invalid_dsn(dsn, "missing host"));
        }

        let host = url
            .host_str()
            .ok_or_else(|| PipelineError::invalid_dsn(dsn, "missing host"))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };

        let token = if url.username().is_empty() {
            url.query_pairs()
                .find(|(key, _)| key == "token")
                .map(|(_, value)| value.into_owned())
        } else {
            Some(url.username().to_owned())
        };

        Ok(Dsn {
            scheme: url.scheme().to_owned(),
            host,
            path: url.path().trim_start_matches('/').to_owned(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Base URL of the OTLP HTTP collector derived from this DSN.
    pub fn otlp_http_endpoint(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Full export URL for one signal, e.g. `signal_endpoint("/v1/traces")`.
    pub(crate) fn signal_endpoint(&self, signal_path: &str) -> String {
        format!("{}{signal_path}", self.otlp_http_endpoint())
    }

    /// Base URL of the backend UI, used to build trace links.
    pub fn site_url(&self) -> String {
        self.otlp_http_endpoint()
    }

    /// Headers attached to every exporter request.
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(token) = &self.token {
            headers.insert("authorization".to_owned(), format!("Bearer {token}"));
        }
        headers
    }

    /// Whether the descriptor uses plain HTTP (no TLS).
    pub fn is_insecure(&self) -> bool {
        self.scheme == "http"
    }
}
