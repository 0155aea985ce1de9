//! Quest endpoints

use crate::client::FourmoreClient;
use crate::error::ApiResult;
use crate::models::{PoiKey, QuestAnswer, QuestAnswerResult, QuestList};
use tracing::{instrument, warn};

/// Quests API interface
#[derive(Clone)]
pub struct QuestsApi {
    client: FourmoreClient,
}

impl QuestsApi {
    pub(crate) fn new(client: FourmoreClient) -> Self {
        Self { client }
    }

    /// Questions that apply to a place
    ///
    /// GET /quests/applicable/{osm_type}/{osm_id}
    pub async fn applicable(&self, key: PoiKey) -> ApiResult<QuestList> {
        self.client
            .get(&format!("quests/applicable/{}/{}", key.osm_type, key.osm_id))
            .await
    }

    /// Answer a quest
    ///
    /// A `success == false` result is not an error: the message explains why
    /// the upstream edit was not made and is meant to be shown verbatim.
    ///
    /// POST /quests/respond
    #[instrument(skip(self, answer), fields(quest = %answer.quest_id))]
    pub async fn respond(&self, answer: &QuestAnswer) -> ApiResult<QuestAnswerResult> {
        let result: QuestAnswerResult = self.client.post("quests/respond", answer).await?;
        if !result.success {
            warn!(message = %result.message, "Quest answer was not applied upstream");
        }
        Ok(result)
    }
}
