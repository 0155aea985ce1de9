//! Check-in endpoints

use crate::client::FourmoreClient;
use crate::error::ApiResult;
use crate::models::{CheckIn, CheckInPage, CheckInStats, Envelope, NewCheckIn};
use serde::Serialize;
use tracing::{info, instrument};

/// Check-ins API interface
#[derive(Clone)]
pub struct CheckInsApi {
    client: FourmoreClient,
}

#[derive(Debug, Serialize)]
struct PageParams {
    page: u32,
    per_page: u32,
}

impl CheckInsApi {
    pub(crate) fn new(client: FourmoreClient) -> Self {
        Self { client }
    }

    /// Record a visit
    ///
    /// POST /checkins
    #[instrument(skip(self, checkin), fields(poi = %checkin.osm_id))]
    pub async fn create(&self, checkin: &NewCheckIn) -> ApiResult<CheckIn> {
        checkin.validate()?;
        let created: CheckIn = self.client.post("checkins", checkin).await?;
        info!(checkin_id = created.id, "Checked in");
        Ok(created)
    }

    /// One page of the signed-in user's history, newest first
    ///
    /// GET /checkins?page=&per_page=
    pub async fn history(&self, page: u32, per_page: u32) -> ApiResult<CheckInPage> {
        self.client
            .get_query("checkins", &PageParams { page, per_page })
            .await
    }

    /// GET /checkins/{id}
    pub async fn get(&self, id: i64) -> ApiResult<CheckIn> {
        self.client.get(&format!("checkins/{id}")).await
    }

    /// DELETE /checkins/{id}
    pub async fn delete(&self, id: i64) -> ApiResult<String> {
        let response: Envelope<serde_json::Value> =
            self.client.delete(&format!("checkins/{id}")).await?;
        Ok(response.message)
    }

    /// Totals for the signed-in user
    ///
    /// GET /checkins/stats/summary
    pub async fn stats(&self) -> ApiResult<CheckInStats> {
        let response: Envelope<CheckInStats> = self.client.get("checkins/stats/summary").await?;
        response.into_data()
    }
}
