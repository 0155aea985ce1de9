//! Upstream OpenStreetMap contributions
//!
//! Both calls write to OpenStreetMap on the user's behalf through the backend.

use crate::client::FourmoreClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{ConfirmResult, NoteResult, OsmType, PoiKey};
use serde::Serialize;
use tracing::{info, instrument};

/// OSM edits API interface
#[derive(Clone)]
pub struct OsmApi {
    client: FourmoreClient,
}

#[derive(Debug, Serialize)]
struct PoiRef {
    poi_osm_type: OsmType,
    poi_osm_id: i64,
}

#[derive(Debug, Serialize)]
struct NoteRequest<'a> {
    poi_osm_type: OsmType,
    poi_osm_id: i64,
    text: &'a str,
}

impl OsmApi {
    pub(crate) fn new(client: FourmoreClient) -> Self {
        Self { client }
    }

    /// Mark the place's data as still accurate (adds a `check_date`)
    ///
    /// POST /osm/confirm-info
    #[instrument(skip(self), fields(poi = %key))]
    pub async fn confirm_info(&self, key: PoiKey) -> ApiResult<ConfirmResult> {
        let body = PoiRef {
            poi_osm_type: key.osm_type,
            poi_osm_id: key.osm_id,
        };
        let result: ConfirmResult = self.client.post("osm/confirm-info", &body).await?;
        info!(changeset = ?result.changeset_id, "Place info confirmed");
        Ok(result)
    }

    /// Leave an OpenStreetMap note at the place
    ///
    /// POST /osm/note
    #[instrument(skip(self, text), fields(poi = %key))]
    pub async fn create_note(&self, key: PoiKey, text: &str) -> ApiResult<NoteResult> {
        if text.trim().is_empty() {
            return Err(ApiError::validation("Note text cannot be empty"));
        }
        let body = NoteRequest {
            poi_osm_type: key.osm_type,
            poi_osm_id: key.osm_id,
            text,
        };
        self.client.post("osm/note", &body).await
    }
}
