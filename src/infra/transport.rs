//! HTTP transport wrapper.
//!
//! Every API call funnels through here: the bearer token is attached when
//! the session holds one, cookies ride along for the refresh-cookie flow,
//! and each outcome is normalized into `Result<T, ErrorKind>`. The one
//! autonomous recovery action lives here too: a 401 clears the session and
//! the query cache, exactly once, before the error is returned. There is no
//! token refresh and no automatic retry.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::QueryCache;
use crate::config::ApiSettings;
use crate::domain::error::ErrorKind;

use super::error::InfraError;
use super::session::AuthSession;

pub struct Transport {
    client: Client,
    base: Url,
    session: Arc<AuthSession>,
    cache: Arc<QueryCache>,
}

impl Transport {
    pub fn new(
        api: &ApiSettings,
        session: Arc<AuthSession>,
        cache: Arc<QueryCache>,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(api.user_agent.clone())
            .timeout(api.timeout)
            .cookie_store(true)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            client,
            base: api.base_url.clone(),
            session,
            cache,
        })
    }

    /// GET/DELETE-style request decoding a JSON body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, ErrorKind> {
        let resp = self.builder(method, path)?.send().await.map_err(net_error)?;
        self.decode(resp).await
    }

    /// Request with a JSON body, decoding a JSON response.
    pub async fn request_with<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ErrorKind> {
        let resp = self
            .builder(method, path)?
            .json(body)
            .send()
            .await
            .map_err(net_error)?;
        self.decode(resp).await
    }

    /// Request where only the status matters (mutations returning nothing,
    /// or a confirmation string the caller does not need).
    pub async fn request_unit(&self, method: Method, path: &str) -> Result<(), ErrorKind> {
        let resp = self.builder(method, path)?.send().await.map_err(net_error)?;
        self.expect_success(resp).await
    }

    /// Unit request carrying a JSON body.
    pub async fn request_unit_with<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ErrorKind> {
        let resp = self
            .builder(method, path)?
            .json(body)
            .send()
            .await
            .map_err(net_error)?;
        self.expect_success(resp).await
    }

    /// Unit request carrying multipart form data (the image upload
    /// endpoints: description/bioText fields plus the binary image part).
    pub async fn request_unit_multipart(
        &self,
        method: Method,
        path: &str,
        form: Form,
    ) -> Result<(), ErrorKind> {
        let resp = self
            .builder(method, path)?
            .multipart(form)
            .send()
            .await
            .map_err(net_error)?;
        self.expect_success(resp).await
    }

    fn url(&self, path: &str) -> Result<Url, ErrorKind> {
        self.base
            .join(path)
            .map_err(|err| ErrorKind::Invalid(err.to_string()))
    }

    fn builder(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ErrorKind> {
        debug!(%method, path, "Dispatching API request");
        let mut req = self.client.request(method, self.url(path)?);
        if let Some(token) = self.session.token() {
            let header = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| ErrorKind::Invalid(err.to_string()))?;
            req = req.header(AUTHORIZATION, header);
        }
        Ok(req)
    }

    async fn decode<T: DeserializeOwned>(&self, resp: Response) -> Result<T, ErrorKind> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(net_error)?;
        self.check_status(status, &bytes)?;
        serde_json::from_slice(&bytes).map_err(|err| ErrorKind::Decode(err.to_string()))
    }

    async fn expect_success(&self, resp: Response) -> Result<(), ErrorKind> {
        let status = resp.status();
        let bytes = resp.bytes().await.unwrap_or_default();
        self.check_status(status, &bytes)
    }

    fn check_status(&self, status: StatusCode, body: &[u8]) -> Result<(), ErrorKind> {
        if status == StatusCode::UNAUTHORIZED {
            self.force_logout();
            return Err(ErrorKind::Unauthorized);
        }
        if status.is_server_error() {
            return Err(ErrorKind::Server {
                status: status.as_u16(),
            });
        }
        if status.is_client_error() {
            return Err(ErrorKind::Rejected {
                status: status.as_u16(),
                message: rejection_message(body),
            });
        }
        Ok(())
    }

    /// Forced logout on 401. `AuthSession::clear` reports whether a session
    /// was actually dropped, so concurrent 401s collapse into one logout and
    /// one cache reset.
    fn force_logout(&self) {
        if self.session.clear() {
            self.cache.clear();
            warn!("Received 401; session and cache cleared");
        }
    }
}

fn net_error(err: reqwest::Error) -> ErrorKind {
    ErrorKind::Network(err.to_string())
}

/// Percent-encode a user-supplied value destined for one path segment, so a
/// stray `/`, `?` or `#` cannot change the request target.
pub(crate) fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Validation responses usually arrive as `{"message": "..."}`; fall back to
/// the raw body text otherwise.
fn rejection_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body)
        && let Some(message) = value.get("message").and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    String::from_utf8_lossy(body).into_owned()
}
