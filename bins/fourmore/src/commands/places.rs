//! Place search commands

use super::Context;
use anyhow::{Context as _, Result};
use fourmore_api_client::{NearbyQuery, Poi, PoiKey, SearchBias};
use fourmore_cli::output::{self, format_count, format_duration, Status};
use fourmore_cli::progress;
use fourmore_geo::BoundingBox;
use fourmore_search::{CategoryCatalog, ProgressiveSearch, ProgressiveSearchConfig};
use owo_colors::OwoColorize;
use serde_json::json;
use std::time::Instant;
use tracing::warn;

/// Categories from the backend, or the bundled list when it is unreachable
async fn load_catalog(ctx: &Context) -> CategoryCatalog {
    match ctx.client.categories().list().await {
        Ok(categories) if !categories.is_empty() => CategoryCatalog::from_categories(categories),
        Ok(_) => CategoryCatalog::builtin().clone(),
        Err(e) => {
            warn!(error = %e, "Category list unavailable, using bundled categories");
            CategoryCatalog::builtin().clone()
        }
    }
}

pub async fn categories(ctx: &Context, query: Option<&str>) -> Result<()> {
    let catalog = load_catalog(ctx).await;
    let matches = match query {
        Some(query) => catalog.suggest(query, ctx.config.search.category_suggestion_cap),
        None => catalog.iter().collect(),
    };

    if ctx.emit_json(&matches)? {
        return Ok(());
    }
    if matches.is_empty() {
        Status::info("No matching categories");
        return Ok(());
    }
    for category in matches {
        println!("  {:<24} {}", category.label.bold(), category.class.dimmed());
    }
    Ok(())
}

pub async fn suggest(ctx: &Context, query: &str, near: Option<(f64, f64)>) -> Result<()> {
    let search = &ctx.config.search;
    let bias = match near {
        Some(near) => Some(SearchBias {
            center: ctx.locate(near).await?,
            radius_m: search.suggestion_radius_m,
        }),
        None => None,
    };

    let spinner = progress::spinner_unless(ctx.is_json(), &format!("Searching for {query}..."));
    let places = ctx.client.places().search(query.trim(), search.suggestion_limit, bias).await;
    spinner.finish_and_clear();
    let places = places?;

    let categories = CategoryCatalog::builtin().suggest(query, search.category_suggestion_cap);
    if ctx.emit_json(&json!({ "categories": categories, "places": places }))? {
        return Ok(());
    }

    if !categories.is_empty() {
        Status::header("Categories");
        for category in &categories {
            println!("  {} {}", category.label, category.class.dimmed());
        }
    }
    Status::header("Places");
    output::print_pois(&places, "No places found");
    Ok(())
}

pub async fn category(ctx: &Context, class: &str, at: (f64, f64), zoom: Option<f64>) -> Result<()> {
    let center = ctx.locate(at).await?;
    let mut config = ProgressiveSearchConfig::from_schema(&ctx.config);
    if let Some(zoom) = zoom {
        config.street_zoom = zoom.max(config.min_zoom);
    }
    let search = ProgressiveSearch::new(ctx.client.clone(), config);
    let label = CategoryCatalog::builtin().label_for(class);

    let spinner = progress::spinner_unless(ctx.is_json(), &format!("Looking for {label} nearby..."));
    let started = Instant::now();
    let outcome = match search.search_category(class, center, None).await {
        Ok(outcome) => outcome,
        Err(e) => {
            progress::finish_error(&spinner, &e.user_message());
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    if ctx.emit_json(&json!({
        "category": outcome.category,
        "center": outcome.center,
        "zoom": outcome.zoom,
        "bbox": outcome.bbox,
        "queries": outcome.queries,
        "results": outcome.results,
    }))? {
        return Ok(());
    }

    if outcome.is_empty() {
        Status::info(&format!(
            "No results found nearby, searched down to zoom {} in {}",
            outcome.zoom,
            format_count(outcome.queries as usize, "query", "queries")
        ));
        return Ok(());
    }
    Status::success(&format!(
        "{} at zoom {} ({})",
        format_count(outcome.results.len(), "result", "results"),
        outcome.zoom,
        format_duration(started.elapsed())
    ));
    output::print_pois(&outcome.results, "No results found nearby");
    Ok(())
}

pub async fn nearby(
    ctx: &Context,
    at: (f64, f64),
    radius: f64,
    category: Option<String>,
    limit: u32,
    offset: u32,
) -> Result<()> {
    let center = ctx.locate(at).await?;
    let mut query = NearbyQuery::new(center).with_radius(radius).with_page(limit, offset);
    if let Some(category) = category {
        query = query.with_category(category);
    }

    let spinner = progress::spinner_unless(ctx.is_json(), "Searching nearby...");
    let places = ctx.client.places().nearby(&query).await;
    spinner.finish_and_clear();
    let places = places?;

    if ctx.emit_json(&places)? {
        return Ok(());
    }
    output::print_pois(&places, "No results found nearby");
    Ok(())
}

pub async fn bbox(
    ctx: &Context,
    (north, south, east, west): (f64, f64, f64, f64),
    category: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let bounds = BoundingBox::try_new(north, south, east, west).context("invalid bounding box")?;
    let limit = limit.unwrap_or(ctx.config.search.viewport_result_limit);

    let spinner = progress::spinner_unless(ctx.is_json(), "Searching area...");
    let places = ctx.client.places().in_bbox(&bounds, category, limit).await;
    spinner.finish_and_clear();
    let places = places?;

    if ctx.emit_json(&places)? {
        return Ok(());
    }
    output::print_pois(&places, "No results in this area");
    Ok(())
}

pub async fn details(ctx: &Context, key: PoiKey) -> Result<()> {
    let poi = ctx.client.places().details(key).await?;
    if ctx.emit_json(&poi)? {
        return Ok(());
    }
    print_details(&poi);
    Ok(())
}

fn print_details(poi: &Poi) {
    Status::header(poi.display_name());
    Status::field("Category", &CategoryCatalog::builtin().label_for(&poi.class));
    Status::field("Location", &format!("{:.6}, {:.6}", poi.lat, poi.lon));
    for (label, value) in [
        ("Address", &poi.address),
        ("Phone", &poi.phone),
        ("Website", &poi.website),
        ("Hours", &poi.opening_hours),
    ] {
        if let Some(value) = value {
            Status::field(label, value);
        }
    }
    if let Some(timestamp) = poi.timestamp {
        Status::field("Last edited", &timestamp.format("%Y-%m-%d").to_string());
    }
    if !poi.tags.is_empty() {
        Status::subheader("Tags");
        for (key, value) in &poi.tags {
            println!("  {}={}", key.dimmed(), value);
        }
    }
    Status::field("OSM", &poi.key().to_string());
}
