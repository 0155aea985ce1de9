//! Check-in commands

use super::Context;
use anyhow::Result;
use fourmore_api_client::{NewCheckIn, PoiKey};
use fourmore_cli::output::{format_count, poi_line, Status};
use fourmore_cli::progress;
use owo_colors::OwoColorize;

pub async fn checkin(ctx: &Context, key: PoiKey, comment: Option<String>, at: Option<(f64, f64)>) -> Result<()> {
    let mut request = NewCheckIn::new(key);
    if let Some(comment) = comment.filter(|c| !c.trim().is_empty()) {
        request = request.with_comment(comment);
    }
    if let Some(at) = at {
        request = request.with_location(ctx.locate(at).await?);
    }
    request.validate()?;

    let spinner = progress::spinner_unless(ctx.is_json(), "Checking in...");
    let created = match ctx.client.checkins().create(&request).await {
        Ok(created) => created,
        Err(e) => {
            progress::finish_error(&spinner, "Check-in failed");
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    if ctx.emit_json(&created)? {
        return Ok(());
    }
    Status::success(&format!("Checked in at {}", created.poi.display_name().bold()));
    if let Some(comment) = &created.comment {
        Status::field("Comment", comment);
    }
    Ok(())
}

pub async fn history(ctx: &Context, page: u32, per_page: u32) -> Result<()> {
    let history = ctx.client.checkins().history(page.max(1), per_page.max(1)).await?;
    if ctx.emit_json(&history)? {
        return Ok(());
    }

    if history.checkins.is_empty() {
        Status::info("No check-ins yet");
        return Ok(());
    }
    Status::header(&format!(
        "Page {} · {}",
        history.page,
        format_count(history.total as usize, "check-in", "check-ins")
    ));
    for checkin in &history.checkins {
        println!(
            "  {} {}",
            checkin.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            poi_line(&checkin.poi)
        );
        if let Some(comment) = &checkin.comment {
            println!("      {}", comment.italic());
        }
    }
    Ok(())
}

pub async fn stats(ctx: &Context) -> Result<()> {
    let stats = ctx.client.checkins().stats().await?;
    if ctx.emit_json(&stats)? {
        return Ok(());
    }

    Status::header("Your check-ins");
    Status::field("Total", &stats.total_checkins.to_string());
    Status::field("Unique places", &stats.unique_places.to_string());
    if let Some(class) = &stats.favorite_class {
        Status::field("Favorite category", &fourmore_search::humanize_class(class));
    }
    if let Some(since) = stats.member_since {
        Status::field("Member since", &since.format("%Y-%m-%d").to_string());
    }
    Ok(())
}
