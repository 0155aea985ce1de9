//! Category catalog endpoints

use crate::client::FourmoreClient;
use crate::error::ApiResult;
use crate::models::{Category, Envelope};

/// Categories API interface
#[derive(Clone)]
pub struct CategoriesApi {
    client: FourmoreClient,
}

impl CategoriesApi {
    pub(crate) fn new(client: FourmoreClient) -> Self {
        Self { client }
    }

    /// Every category the backend knows about
    ///
    /// GET /categories/
    pub async fn list(&self) -> ApiResult<Vec<Category>> {
        let response: Envelope<Vec<Category>> = self.client.get("categories/").await?;
        response.into_data()
    }

    /// GET /categories/{class}
    pub async fn get(&self, class: &str) -> ApiResult<Category> {
        let response: Envelope<Category> = self.client.get(&format!("categories/{class}")).await?;
        response.into_data()
    }
}
