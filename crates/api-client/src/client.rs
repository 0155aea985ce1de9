//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{AuthApi, CategoriesApi, CheckInsApi, OsmApi, PlacesApi, QuestsApi, UsersApi};
use crate::error::{ApiError, ApiResult};
use crate::models::AuthToken;
use crate::session::{FileTokenStorage, Session, TokenStorage};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Observable sign-in state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn { username: String },
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(s) => Self::SignedIn {
                username: s.user.username.clone(),
            },
            None => Self::SignedOut,
        }
    }
}

/// FourMore backend client
///
/// Wraps `reqwest`, attaches the stored bearer token, and clears the session
/// whenever the backend answers 401. Requests are never retried
/// automatically.
#[derive(Clone)]
pub struct FourmoreClient {
    inner: Client,
    config: Arc<ClientConfig>,
    storage: Arc<dyn TokenStorage>,
    session: Arc<RwLock<Option<Session>>>,
    auth: Arc<watch::Sender<AuthState>>,
}

impl std::fmt::Debug for FourmoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FourmoreClient")
            .field("base_url", &self.config.base_url)
            .field("auth", &*self.auth.borrow())
            .finish_non_exhaustive()
    }
}

impl FourmoreClient {
    /// Create a client from environment configuration with file-backed sessions
    pub fn new() -> ApiResult<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a client with specific configuration and file-backed sessions
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        let path = match config.session_path {
            Some(ref path) => path.clone(),
            None => FileTokenStorage::default_path()?,
        };
        Self::with_storage(config, Arc::new(FileTokenStorage::new(path)))
    }

    /// Create a client with an explicit session store
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("fourmore-api-client/", env!("CARGO_PKG_VERSION"))),
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let session = storage.load()?;
        let (auth, _) = watch::channel(AuthState::from_session(session.as_ref()));

        Ok(Self {
            inner,
            config: Arc::new(config),
            storage,
            session: Arc::new(RwLock::new(session)),
            auth: Arc::new(auth),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// Subscribe to sign-in state changes
    #[must_use]
    pub fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }

    /// True if a token and user profile are stored
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.borrow().is_signed_in()
    }

    /// The signed-in session, if any
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Persist a freshly exchanged token
    pub fn sign_in(&self, token: AuthToken) -> ApiResult<Session> {
        let session = Session {
            token: token.access_token,
            user: token.user,
        };
        self.storage.save(&session)?;
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        self.auth.send_replace(AuthState::from_session(Some(&session)));
        info!(user = %session.user.username, "Signed in");
        Ok(session)
    }

    /// Forget the stored session
    pub fn sign_out(&self) -> ApiResult<()> {
        self.session.write().unwrap_or_else(PoisonError::into_inner).take();
        self.auth.send_replace(AuthState::SignedOut);
        self.storage.clear()
    }

    fn bearer_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.token.clone())
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access place search and detail endpoints
    #[must_use]
    pub fn places(&self) -> PlacesApi {
        PlacesApi::new(self.clone())
    }

    /// Access check-in endpoints
    #[must_use]
    pub fn checkins(&self) -> CheckInsApi {
        CheckInsApi::new(self.clone())
    }

    /// Access upstream OpenStreetMap edit endpoints
    #[must_use]
    pub fn osm(&self) -> OsmApi {
        OsmApi::new(self.clone())
    }

    /// Access quest endpoints
    #[must_use]
    pub fn quests(&self) -> QuestsApi {
        QuestsApi::new(self.clone())
    }

    /// Access sign-in endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access current-user endpoints
    #[must_use]
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    /// Access category catalog endpoints
    #[must_use]
    pub fn categories(&self) -> CategoriesApi {
        CategoriesApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods
    // -------------------------------------------------------------------------

    /// Perform a GET request
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, Option::<&()>::None, Option::<&()>::None)
            .await
    }

    /// Perform a GET request with query parameters
    #[instrument(skip(self, query))]
    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        self.request(Method::GET, path, Some(query), Option::<&()>::None)
            .await
    }

    /// Perform a POST request
    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.request(Method::POST, path, Option::<&()>::None, Some(body))
            .await
    }

    /// Perform a PATCH request
    #[instrument(skip(self, body))]
    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.request(Method::PATCH, path, Option::<&()>::None, Some(body))
            .await
    }

    /// Perform a DELETE request
    #[instrument(skip(self))]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::DELETE, path, Option::<&()>::None, Option::<&()>::None)
            .await
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn request<T, Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize,
    {
        let request_id = Uuid::new_v4().to_string();
        let url = self.url(path);

        let mut request = self
            .inner
            .request(method.clone(), &url)
            .header(X_REQUEST_ID, &request_id);

        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(q) = query {
            request = request.query(q);
        }
        if let Some(b) = body {
            request = request.json(b);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!(request_id = %request_id, %method, url = %url, error = %e, "Request failed");
            ApiError::Request(e)
        })?;

        debug!(
            request_id = %request_id,
            %method,
            url = %url,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            "Response received"
        );

        self.handle_response(response).await
    }

    /// Handle HTTP response and deserialize
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(ApiError::Request);
        }

        let body = response.text().await.unwrap_or_default();
        Err(self.reject(status, &body))
    }

    /// Turn a non-success answer into an error; a 401 also ends the session
    fn reject(&self, status: StatusCode, body: &str) -> ApiError {
        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected the session, signing out");
            if let Err(e) = self.sign_out() {
                warn!(error = %e, "Failed to clear stored session");
            }
            return ApiError::Unauthorized;
        }
        error_from_body(status, body)
    }
}

/// Map a non-success body onto an error, unwrapping FastAPI's `detail`
fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    match detail {
        Some(serde_json::Value::String(message)) => ApiError::api_response(status.as_u16(), message),
        Some(serde_json::Value::Object(detail)) => {
            let message = detail
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Request rejected")
                .to_string();
            if status == StatusCode::FORBIDDEN
                && detail.get("code").and_then(|c| c.as_str()) == Some("waitlist_required")
            {
                ApiError::Waitlisted { message }
            } else {
                ApiError::api_response(status.as_u16(), message)
            }
        }
        Some(other) => ApiError::api_response(status.as_u16(), other.to_string()),
        None if body.is_empty() => ApiError::api_response(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error"),
        ),
        None => ApiError::api_response(status.as_u16(), body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{sample_session, sample_user};
    use crate::session::MemoryTokenStorage;

    fn client_with(storage: MemoryTokenStorage) -> FourmoreClient {
        FourmoreClient::with_storage(ClientConfig::development(), Arc::new(storage)).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client_with(MemoryTokenStorage::new());
        assert!(!client.is_authenticated());
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::default().with_base_url("localhost");
        let result = FourmoreClient::with_storage(config, Arc::new(MemoryTokenStorage::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_restores_stored_session() {
        let client = client_with(MemoryTokenStorage::with_session(sample_session()));
        assert!(client.is_authenticated());
        assert_eq!(
            *client.auth_state().borrow(),
            AuthState::SignedIn {
                username: "mapper".into()
            }
        );
    }

    #[test]
    fn test_sign_in_and_out_flip_state() {
        let client = client_with(MemoryTokenStorage::new());
        let state = client.auth_state();

        client
            .sign_in(AuthToken {
                access_token: "t".into(),
                token_type: "bearer".into(),
                user: sample_user(),
            })
            .unwrap();
        assert!(state.borrow().is_signed_in());
        assert_eq!(client.bearer_token().as_deref(), Some("t"));

        client.sign_out().unwrap();
        assert_eq!(*state.borrow(), AuthState::SignedOut);
        assert!(client.session().is_none());
    }

    #[test]
    fn test_unauthorized_answer_clears_session() {
        let storage = Arc::new(MemoryTokenStorage::with_session(sample_session()));
        let client =
            FourmoreClient::with_storage(ClientConfig::development(), storage.clone()).unwrap();
        let state = client.auth_state();
        assert!(state.borrow().is_signed_in());

        let err = client.reject(StatusCode::UNAUTHORIZED, r#"{"detail": "Not authenticated"}"#);
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(storage.load().unwrap().is_none());
        assert_eq!(*state.borrow(), AuthState::SignedOut);
        assert!(!client.is_authenticated());
        assert!(client.bearer_token().is_none());
    }

    #[test]
    fn test_other_rejections_keep_session() {
        let storage = Arc::new(MemoryTokenStorage::with_session(sample_session()));
        let client =
            FourmoreClient::with_storage(ClientConfig::development(), storage.clone()).unwrap();

        let err = client.reject(StatusCode::NOT_FOUND, r#"{"detail": "Place not found"}"#);
        assert!(matches!(err, ApiError::ApiResponse { status: 404, .. }));
        assert!(storage.load().unwrap().is_some());
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_url_joining() {
        let client = client_with(MemoryTokenStorage::new());
        assert_eq!(client.url("/places/nearby"), "http://localhost:8000/places/nearby");
        assert_eq!(client.url("me"), "http://localhost:8000/me");
    }

    #[test]
    fn test_error_from_body_detail_string() {
        let err = error_from_body(StatusCode::NOT_FOUND, r#"{"detail": "Place not found"}"#);
        assert!(matches!(err, ApiError::ApiResponse { status: 404, ref message } if message == "Place not found"));
    }

    #[test]
    fn test_error_from_body_waitlist() {
        let body = r#"{"detail": {"code": "waitlist_required", "message": "Thanks for your interest!"}}"#;
        let err = error_from_body(StatusCode::FORBIDDEN, body);
        assert!(matches!(err, ApiError::Waitlisted { ref message } if message == "Thanks for your interest!"));
    }

    #[test]
    fn test_error_from_body_plain() {
        let err = error_from_body(StatusCode::BAD_GATEWAY, "");
        assert!(err.is_server_error());
        let err = error_from_body(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, ApiError::ApiResponse { ref message, .. } if message == "boom"));
    }
}
