//! Login, sign-up, and logout.
//!
//! Login and sign-up are plain mutations (never cached). Logout is the one
//! place besides a 401 where the whole cache is dropped: no cached entity
//! may survive into the next session.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, ResourceKind, Tag};
use crate::domain::entities::LoginResponse;
use crate::domain::error::ErrorKind;
use crate::domain::requests::{LoginRequest, SignUpRequest};
use crate::infra::session::{AuthSession, Credentials};
use crate::infra::transport::Transport;

pub struct AuthApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
    session: Arc<AuthSession>,
}

impl AuthApi {
    pub(crate) fn new(
        transport: Arc<Transport>,
        cache: Arc<QueryCache>,
        session: Arc<AuthSession>,
    ) -> Self {
        Self {
            transport,
            cache,
            session,
        }
    }

    /// Authenticate and store the returned credentials in the session and
    /// its durable storage.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ErrorKind> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .transport
            .request_with(Method::POST, "users/login", &request)
            .await?;
        self.session
            .set_credentials(Credentials::new(&response.token, &response.username));
        Ok(response)
    }

    /// Register a new account. Does not log in; callers follow with `login`.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ErrorKind> {
        self.transport
            .request_unit_with(Method::POST, "users/sign-up", request)
            .await?;
        self.cache.invalidate(&[Tag::list(ResourceKind::UserList)]);
        Ok(())
    }

    /// Explicit logout: clear the session, its durable storage, and every
    /// cached query result.
    pub fn logout(&self) {
        self.session.clear();
        self.cache.clear();
    }
}
