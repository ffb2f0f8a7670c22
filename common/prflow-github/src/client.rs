//! GitHub client implementation
//!
//! [`GitHubClient`] owns the credentials, the API base and a shared
//! [`Transport`]. Endpoint groups (`repositories`, `branches`, `contents`,
//! `pull_requests`) extend it with `impl` blocks in their own modules.
//!
//! The client is cheap to clone: clones share the same connection pool, which
//! is safe to use concurrently for unrelated repositories and branches.

use crate::auth::Credentials;
use crate::cancel::CancelToken;
use crate::error::ApiError;
use crate::transport::{ApiRequest, HttpTransport, RequestBody, Transport};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default User-Agent header for API requests
pub const DEFAULT_USER_AGENT: &str = concat!("prflow/", env!("CARGO_PKG_VERSION"));

const AUTHORIZATION: &str = "Authorization";
const ACCEPT_HEADER: &str = "Accept";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// Settings for the production HTTP stack
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_base: String,
    /// Deadline for each call, chosen by the caller; `None` leaves calls unbounded
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Path relative to the API base, built segment by segment
///
/// Segments are percent-encoded when the URL is assembled, so branch names
/// and file paths never need manual escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Start from a `/`-separated path such as `user/repos`
    pub fn new(path: &str) -> Self {
        Self::default().segments(path)
    }

    /// Append a single segment; any `/` inside it is escaped
    pub fn segment(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append every `/`-separated part of `path` as its own segment
    pub fn segments(mut self, path: &str) -> Self {
        self.segments.extend(
            path.split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// `repos/{owner}/{repo}` prefix shared by all repository endpoints
    pub fn repo(owner: &str, repo: &str) -> Self {
        Self::new("repos").segment(owner).segment(repo)
    }

    fn resolve(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{} cannot be a base URL", base)))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

impl From<&str> for Endpoint {
    fn from(path: &str) -> Self {
        Endpoint::new(path)
    }
}

/// GitHub API client for making authenticated requests
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) credentials: Credentials,
    pub(crate) api_base: Url,
    pub(crate) cancel: Option<CancelToken>,
}

impl GitHubClient {
    /// Create a client backed by a pooled `reqwest` transport
    pub fn new(credentials: Credentials, options: ClientOptions) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(options.timeout, &options.user_agent)?;
        Self::with_transport(credentials, &options.api_base, Arc::new(transport))
    }

    /// Create a client on top of an existing transport
    pub fn with_transport(
        credentials: Credentials,
        api_base: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{} cannot be a base URL",
                api_base
            )));
        }

        Ok(Self {
            transport,
            credentials,
            api_base,
            cancel: None,
        })
    }

    /// Abandon calls once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Token set by [`with_cancellation`](Self::with_cancellation), if any
    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Account the credentials belong to
    pub fn account(&self) -> &str {
        self.credentials.account()
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// Absolute URL for an endpoint
    pub fn url(&self, endpoint: &Endpoint) -> Result<String, ApiError> {
        endpoint.resolve(&self.api_base).map(String::from)
    }

    /// Issue one authenticated request and decode its JSON response
    ///
    /// Authorization, Accept and API-version headers are always sent. Entries
    /// in `headers` may replace Accept and the API version; an Authorization
    /// entry is ignored. An empty 2xx body yields `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        endpoint: impl Into<Endpoint>,
        headers: &[(&str, &str)],
        body: Option<RequestBody>,
    ) -> Result<Value, ApiError> {
        let endpoint = endpoint.into();
        let request = ApiRequest {
            method,
            url: self.url(&endpoint)?,
            headers: self.headers(headers),
            body,
        };

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(ApiError::Cancelled);
        }

        debug!(method = %request.method, url = %request.url, "GitHub API request");

        let response = match &self.cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                response = self.transport.execute(request) => response?,
            },
            None => self.transport.execute(request).await?,
        };

        debug!(status = response.status, "GitHub API response");

        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode {
            message: e.to_string(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        })
    }

    /// Issue a request with `payload` serialized as its JSON body
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: impl Into<Endpoint>,
        payload: &T,
    ) -> Result<Value, ApiError> {
        let bytes = serde_json::to_vec(payload).map_err(|e| ApiError::Decode {
            message: format!("failed to serialize request body: {}", e),
            body: String::new(),
        })?;
        self.send(method, endpoint, &[], Some(RequestBody::json(bytes)))
            .await
    }

    pub(crate) async fn get(&self, endpoint: impl Into<Endpoint>) -> Result<Value, ApiError> {
        self.send(Method::GET, endpoint, &[], None).await
    }

    fn headers(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let extra: Vec<&(&str, &str)> = extra
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION))
            .collect();

        let mut headers = vec![(
            AUTHORIZATION.to_string(),
            self.credentials.get_auth_header(),
        )];
        for (name, value) in [(ACCEPT_HEADER, ACCEPT), (API_VERSION_HEADER, API_VERSION)] {
            if !extra.iter().any(|(key, _)| key.eq_ignore_ascii_case(name)) {
                headers.push((name.to_string(), value.to_string()));
            }
        }
        headers.extend(
            extra
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );
        headers
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("credentials", &self.credentials)
            .field("api_base", &self.api_base.as_str())
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

/// Decode a JSON value returned by [`GitHubClient::send`] into a typed response
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        message: e.to_string(),
        body,
    })
}
