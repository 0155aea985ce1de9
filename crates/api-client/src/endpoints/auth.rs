//! Sign-in endpoints

use crate::client::FourmoreClient;
use crate::error::ApiResult;
use crate::models::{AuthToken, Envelope};
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Auth API interface
#[derive(Clone)]
pub struct AuthApi {
    client: FourmoreClient,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    auth_url: String,
}

#[derive(Debug, Serialize)]
struct CallbackParams<'a> {
    code: &'a str,
}

impl AuthApi {
    pub(crate) fn new(client: FourmoreClient) -> Self {
        Self { client }
    }

    /// OpenStreetMap authorization URL to send the user to
    ///
    /// GET /auth/login
    pub async fn login_url(&self) -> ApiResult<String> {
        let response: Envelope<LoginData> = self.client.get("auth/login").await?;
        Ok(response.into_data()?.auth_url)
    }

    /// Exchange the authorization code and persist the resulting session
    ///
    /// GET /auth/callback?code=
    pub async fn exchange_code(&self, code: &str) -> ApiResult<Session> {
        let token: AuthToken = self
            .client
            .get_query("auth/callback", &CallbackParams { code })
            .await?;
        self.client.sign_in(token)
    }
}
