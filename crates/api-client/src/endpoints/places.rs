//! Place search and detail endpoints

use crate::client::FourmoreClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{NearbyQuery, Poi, PoiKey, SearchBias};
use fourmore_geo::BoundingBox;
use serde::Serialize;
use tracing::instrument;

/// Places API interface
#[derive(Clone)]
pub struct PlacesApi {
    client: FourmoreClient,
}

#[derive(Debug, Serialize)]
struct TextSearchParams<'a> {
    q: &'a str,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
}

#[derive(Debug, Serialize)]
struct BboxRequest<'a> {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    limit: usize,
}

impl PlacesApi {
    /// Create a new places API interface
    pub(crate) fn new(client: FourmoreClient) -> Self {
        Self { client }
    }

    /// Free-text place search, optionally biased toward a location
    ///
    /// GET /places/search
    #[instrument(skip(self, bias))]
    pub async fn search(&self, query: &str, limit: usize, bias: Option<SearchBias>) -> ApiResult<Vec<Poi>> {
        let params = TextSearchParams {
            q: query,
            limit,
            lat: bias.map(|b| b.center.latitude),
            lon: bias.map(|b| b.center.longitude),
            radius: bias.map(|b| b.radius_m),
        };
        self.client.get_query("places/search", &params).await
    }

    /// Places inside a bounding box, optionally filtered by class
    ///
    /// POST /places/bbox
    #[instrument(skip(self))]
    pub async fn in_bbox(&self, bbox: &BoundingBox, category: Option<&str>, limit: usize) -> ApiResult<Vec<Poi>> {
        if bbox.north < bbox.south || bbox.east < bbox.west {
            return Err(ApiError::validation("bounding box edges are inverted"));
        }
        let body = BboxRequest {
            north: bbox.north,
            south: bbox.south,
            east: bbox.east,
            west: bbox.west,
            category,
            limit,
        };
        self.client.post("places/bbox", &body).await
    }

    /// Places within a radius, nearest first
    ///
    /// POST /places/nearby
    #[instrument(skip(self))]
    pub async fn nearby(&self, query: &NearbyQuery) -> ApiResult<Vec<Poi>> {
        query.validate()?;
        self.client.post("places/nearby", query).await
    }

    /// Full details for one place
    ///
    /// GET /places/{osm_type}/{osm_id}
    #[instrument(skip(self), fields(poi = %key))]
    pub async fn details(&self, key: PoiKey) -> ApiResult<Poi> {
        self.client
            .get(&format!("places/{}/{}", key.osm_type, key.osm_id))
            .await
    }
}
