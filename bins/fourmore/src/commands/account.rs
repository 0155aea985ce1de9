//! Sign-in and profile commands

use super::Context;
use anyhow::Result;
use fourmore_api_client::User;
use fourmore_cli::output::Status;
use fourmore_cli::progress;
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn login_url(ctx: &Context) -> Result<()> {
    let url = ctx.client.auth().login_url().await?;
    if ctx.emit_json(&json!({ "auth_url": url }))? {
        return Ok(());
    }
    Status::info("Open this URL to sign in with OpenStreetMap:");
    println!("  {}", url.underline());
    Ok(())
}

pub async fn login(ctx: &Context, code: &str) -> Result<()> {
    let spinner = progress::spinner_unless(ctx.is_json(), "Signing in...");
    let session = match ctx.client.auth().exchange_code(code).await {
        Ok(session) => session,
        Err(e) => {
            progress::finish_error(&spinner, "Sign-in failed");
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    if ctx.emit_json(&session.user)? {
        return Ok(());
    }
    Status::success(&format!("Signed in as {}", session.user.display_name().bold()));
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    let was_signed_in = ctx.client.is_authenticated();
    ctx.client.sign_out()?;
    if ctx.emit_json(&json!({ "signed_out": was_signed_in }))? {
        return Ok(());
    }
    if was_signed_in {
        Status::success("Signed out");
    } else {
        Status::info("Not signed in");
    }
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let user = ctx.client.users().me().await?;
    if ctx.emit_json(&user)? {
        return Ok(());
    }
    print_user(&user);
    Ok(())
}

fn print_user(user: &User) {
    Status::header(user.display_name());
    Status::field("Username", &user.username);
    Status::field("OSM user", &user.osm_user_id);
    if let Some(email) = &user.email {
        Status::field("Email", email);
    }
    if let Some(created) = user.created_at {
        Status::field("Member since", &created.format("%Y-%m-%d").to_string());
    }
    if let Some(settings) = &user.settings {
        Status::field("Expert mode", if settings.expert { "on" } else { "off" });
        Status::field("Quests", if settings.participate_in_quests { "on" } else { "off" });
    }
}
