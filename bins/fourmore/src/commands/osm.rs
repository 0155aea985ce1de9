//! Commands that write back to OpenStreetMap

use super::Context;
use anyhow::{bail, Result};
use fourmore_api_client::{PoiKey, QuestAnswer};
use fourmore_cli::output::Status;
use fourmore_cli::progress;
use owo_colors::OwoColorize;

pub async fn confirm(ctx: &Context, key: PoiKey) -> Result<()> {
    let spinner = progress::spinner_unless(ctx.is_json(), "Confirming place info...");
    let result = ctx.client.osm().confirm_info(key).await;
    spinner.finish_and_clear();
    let result = result?;

    if ctx.emit_json(&result)? {
        return Ok(());
    }
    if !result.success {
        bail!(result.message);
    }
    Status::success(&result.message);
    if let Some(changeset) = &result.changeset_id {
        Status::field("Changeset", changeset);
    }
    if let Some(check_date) = &result.check_date {
        Status::field("check_date", check_date);
    }
    Ok(())
}

pub async fn note(ctx: &Context, key: PoiKey, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Note text cannot be empty");
    }
    let result = ctx.client.osm().create_note(key, text.trim()).await?;
    if ctx.emit_json(&result)? {
        return Ok(());
    }
    Status::success(&result.message);
    Status::field("Note", &format!("#{}", result.note_id));
    Ok(())
}

pub async fn quests(ctx: &Context, key: PoiKey) -> Result<()> {
    let list = ctx.client.quests().applicable(key).await?;
    if ctx.emit_json(&list)? {
        return Ok(());
    }
    if list.quests.is_empty() {
        Status::info("No open questions for this place");
        return Ok(());
    }
    for quest in &list.quests {
        println!("  {} {}", quest.id.dimmed(), quest.question);
    }
    Ok(())
}

pub async fn answer(ctx: &Context, key: PoiKey, quest_id: String, answer: String) -> Result<()> {
    let request = QuestAnswer {
        osm_type: key.osm_type,
        osm_id: key.osm_id,
        quest_id,
        answer,
    };
    let result = ctx.client.quests().respond(&request).await?;
    if ctx.emit_json(&result)? {
        return Ok(());
    }
    if result.success {
        Status::success(&result.message);
        if let Some(changeset) = &result.changeset_id {
            Status::field("Changeset", changeset);
        }
    } else {
        Status::warning(&result.message);
    }
    Ok(())
}
