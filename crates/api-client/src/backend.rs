//! The search-facing port of the client
//!
//! Search and map code depends on [`PlacesBackend`] rather than on
//! [`FourmoreClient`] directly, so it can run against an in-memory fake.

use crate::client::FourmoreClient;
use crate::error::ApiResult;
use crate::models::{Poi, SearchBias};
use async_trait::async_trait;
use fourmore_geo::BoundingBox;
use std::sync::Arc;

/// The two place queries the search and map layers issue
#[async_trait]
pub trait PlacesBackend: Send + Sync {
    /// Free-text search
    async fn search_places(&self, query: &str, limit: usize, bias: Option<SearchBias>) -> ApiResult<Vec<Poi>>;

    /// Everything (or one class) inside a box
    async fn search_places_in_bbox(
        &self,
        bbox: &BoundingBox,
        category: Option<&str>,
        limit: usize,
    ) -> ApiResult<Vec<Poi>>;
}

#[async_trait]
impl PlacesBackend for FourmoreClient {
    async fn search_places(&self, query: &str, limit: usize, bias: Option<SearchBias>) -> ApiResult<Vec<Poi>> {
        self.places().search(query, limit, bias).await
    }

    async fn search_places_in_bbox(
        &self,
        bbox: &BoundingBox,
        category: Option<&str>,
        limit: usize,
    ) -> ApiResult<Vec<Poi>> {
        self.places().in_bbox(bbox, category, limit).await
    }
}

#[async_trait]
impl<T: PlacesBackend + ?Sized> PlacesBackend for Arc<T> {
    async fn search_places(&self, query: &str, limit: usize, bias: Option<SearchBias>) -> ApiResult<Vec<Poi>> {
        (**self).search_places(query, limit, bias).await
    }

    async fn search_places_in_bbox(
        &self,
        bbox: &BoundingBox,
        category: Option<&str>,
        limit: usize,
    ) -> ApiResult<Vec<Poi>> {
        (**self).search_places_in_bbox(bbox, category, limit).await
    }
}
