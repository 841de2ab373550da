// Account service HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer-token injection
// and `{ "message": ... }` error unwrapping. Endpoints live in
// `accounts.rs` and `withdrawals.rs` as inherent methods.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Error body shape used by every endpoint.
#[derive(serde::Deserialize)]
struct ServiceError {
    message: Option<String>,
}

/// Raw HTTP client for the account service.
pub struct AccountClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl AccountClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the service root, e.g. `http://localhost:5000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout_secs: 30,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/{path}`
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    /// `{base}/api/{path}/{segment}` with `segment` percent-encoded.
    pub(crate) fn api_url_with_segment(&self, path: &str, segment: &str) -> Result<Url, Error> {
        let mut url = self.api_url(path)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(segment);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request, optionally with a bearer token.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let mut builder = self.http.get(url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;

        self.parse_response(resp).await
    }

    /// Send a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.parse_response(resp).await
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Decode a success body, or turn a non-success status into
    /// `Authentication` (401) or `Rejected` carrying the service message.
    async fn parse_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        trace!(status = status.as_u16(), len = body.len(), "response received");

        if !status.is_success() {
            let message = serde_json::from_str::<ServiceError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| preview(&body).to_owned());

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(Error::Authentication { message });
            }
            return Err(Error::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
