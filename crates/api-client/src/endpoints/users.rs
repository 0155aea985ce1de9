//! Current-user endpoints

use crate::client::FourmoreClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{SettingsUpdate, User};

/// Users API interface
#[derive(Clone)]
pub struct UsersApi {
    client: FourmoreClient,
}

impl UsersApi {
    pub(crate) fn new(client: FourmoreClient) -> Self {
        Self { client }
    }

    /// GET /me
    pub async fn me(&self) -> ApiResult<User> {
        self.client.get("me").await
    }

    /// Update only the provided settings
    ///
    /// PATCH /me/settings
    pub async fn update_settings(&self, update: &SettingsUpdate) -> ApiResult<User> {
        if update.is_empty() {
            return Err(ApiError::validation("No settings to update"));
        }
        if update.display_name.as_ref().is_some_and(|n| n.chars().count() > 100) {
            return Err(ApiError::validation("Display names are limited to 100 characters"));
        }
        self.client.patch("me/settings", update).await
    }
}
