//! Session lifecycle manager: login, logout, restore, and request flows.
//!
//! A [`SessionManager`] owns one token store, one refresh coordinator, and
//! the client wired to both. Build one per process (or per test) and pass
//! it by reference.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use authwire_auth::guard::AuthGuard;
use authwire_auth::refresh::{RefreshCoordinator, RefreshEndpoint};
use authwire_auth::session::SessionState;
use authwire_auth::token::{FileTokenStorage, MemoryTokenStorage, TokenLifetimes, TokenStore};
use authwire_core::config::{AppConfig, TokenBackend};
use authwire_core::error::AppError;
use authwire_core::events::TeardownReason;
use authwire_core::result::AppResult;
use authwire_core::traits::{Navigator, TokenStorage, Transport};
use authwire_core::types::request::OutboundRequest;
use authwire_core::types::{
    ApiEnvelope, ApiResponse, Method, RequestSpec, Session, TokenPair, User, UserRole,
};

use crate::client::{HttpClient, status_error};
use crate::navigator::LogNavigator;
use crate::transport::ReqwestTransport;

/// Login response payload.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    access_token: String,
    refresh_token: String,
    user: User,
}

/// Partial profile update merged into the current user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    /// New email.
    pub email: Option<String>,
    /// New role.
    pub role: Option<UserRole>,
    /// New username.
    pub username: Option<String>,
    /// New display name.
    pub full_name: Option<String>,
}

impl UserPatch {
    /// Applies the set fields to `user`.
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if self.username.is_some() {
            user.username = self.username;
        }
        if self.full_name.is_some() {
            user.full_name = self.full_name;
        }
    }
}

/// Owns the session stack for one client instance.
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: AppConfig,
    transport: Arc<dyn Transport>,
    store: Arc<TokenStore>,
    coordinator: RefreshCoordinator,
    client: HttpClient,
    guard: AuthGuard,
}

impl SessionManager {
    /// Wires a manager from its collaborators.
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let store = Arc::new(TokenStore::new(storage));
        let endpoint = RefreshEndpoint::from_config(Arc::clone(&transport), &config.client);
        let coordinator = RefreshCoordinator::new(
            Arc::clone(&store),
            endpoint,
            navigator,
            config.guard.login_route.clone(),
        );
        let client = HttpClient::new(
            config.client.clone(),
            Arc::clone(&transport),
            Arc::clone(&store),
            coordinator.clone(),
        );
        let guard = AuthGuard::new(Arc::clone(store.state()), &config.guard);

        Self {
            config,
            transport,
            store,
            coordinator,
            client,
            guard,
        }
    }

    /// Builds the production stack: `reqwest` transport, the configured
    /// token backend, and a logging navigator.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config.client)?);
        let storage: Arc<dyn TokenStorage> = match config.tokens.storage {
            TokenBackend::Memory => Arc::new(MemoryTokenStorage::new(TokenLifetimes::from_config(
                &config.tokens,
            ))),
            TokenBackend::File => Arc::new(FileTokenStorage::from_config(&config.tokens)),
        };
        info!(
            base_url = %config.client.base_url,
            backend = storage.backend_name(),
            "Session manager initialized"
        );
        Ok(Self::new(config, transport, storage, Arc::new(LogNavigator)))
    }

    /// Configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The authenticated client.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// The token store.
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Observable session state.
    pub fn state(&self) -> &Arc<SessionState> {
        self.store.state()
    }

    /// The navigation guard.
    pub fn guard(&self) -> &AuthGuard {
        &self.guard
    }

    /// The refresh coordinator.
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Sends an authenticated request.
    pub async fn request(&self, spec: RequestSpec) -> AppResult<ApiResponse> {
        self.client.request(spec).await
    }

    /// Performs the login flow:
    ///
    /// 1. Post credentials to the login endpoint
    /// 2. Decode the wrapped or flat `{accessToken, refreshToken, user}` payload
    /// 3. End the previous session epoch
    /// 4. Install the new session atomically
    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let spec = RequestSpec::post(&self.config.client.login_path).json(&serde_json::json!({
            "email": email,
            "password": password,
        }))?;
        let response = self.client.send_anonymous(&spec).await?;
        if !response.is_success() {
            let err = status_error(&response);
            warn!(status = response.status, "Login rejected");
            return Err(err);
        }

        let payload: LoginPayload = ApiEnvelope::decode(&response.body)?;
        if payload.access_token.is_empty() || payload.refresh_token.is_empty() {
            return Err(AppError::authentication("Login response did not contain tokens"));
        }

        self.coordinator.invalidate();
        let user = payload.user;
        self.store
            .set_session(Session::new(
                TokenPair::new(payload.access_token, payload.refresh_token),
                Some(user.clone()),
            ))
            .await;

        info!(user_id = %user.id, role = %user.role, "Login successful");
        Ok(user)
    }

    /// Performs the logout flow:
    ///
    /// 1. Reject every request waiting on a refresh and discard any
    ///    outstanding refresh result
    /// 2. Clear the store and persisted tokens
    /// 3. Notify the server, best-effort
    ///
    /// Returns whether a session was present. Server errors are logged only.
    pub async fn logout(&self) -> AppResult<bool> {
        let tokens = self.store.get();

        let rejected = self.coordinator.invalidate();
        let had_session = self.store.clear(TeardownReason::Logout).await;

        if let Some(tokens) = tokens {
            let request = OutboundRequest {
                method: Method::Post,
                url: self.config.client.url_for(&self.config.client.logout_path),
                headers: vec![
                    ("Content-Type".to_string(), "application/json".to_string()),
                    (
                        "Authorization".to_string(),
                        format!("Bearer {}", tokens.access_token),
                    ),
                ],
                body: None,
            };
            match self.transport.send(request).await {
                Ok(response) if !response.is_success() => {
                    warn!(status = response.status, "Server-side logout was not acknowledged");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Server-side logout failed"),
            }
        }

        info!(had_session, rejected, "Logout completed");
        Ok(had_session)
    }

    /// Loads a persisted session and refreshes the user profile.
    ///
    /// The profile is fetched through the authenticated client, so an
    /// expired access token is refreshed transparently. Returns `None` when
    /// nothing was persisted or the persisted session can no longer be
    /// refreshed.
    pub async fn restore(&self) -> AppResult<Option<User>> {
        if !self.store.restore().await? {
            return Ok(None);
        }

        match self.client.get_json::<User>(&self.config.client.me_path).await {
            Ok(user) => {
                self.store.update_user(user.clone()).await;
                info!(user_id = %user.id, "Session restored");
                Ok(Some(user))
            }
            Err(e) if e.is_session_terminal() => {
                warn!(error = %e, "Persisted session could not be restored");
                if self.store.is_populated() {
                    self.store.clear(TeardownReason::RefreshFailed).await;
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Merges `patch` into the current user and republishes the session.
    pub async fn update_user(&self, patch: UserPatch) -> AppResult<User> {
        let mut user = self
            .store
            .session()
            .and_then(|s| s.user.clone())
            .ok_or_else(|| AppError::auth_expired("No signed-in user to update"))?;
        patch.apply(&mut user);

        if !self.store.update_user(user.clone()).await {
            return Err(AppError::auth_expired("Session ended during update"));
        }
        Ok(user)
    }
}
