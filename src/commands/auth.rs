//! Sign-in, sign-out and password commands.

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, read_secret};
use crate::config::Config;
use crate::desk::Desk;
use crate::error::Result;
use crate::gateway::Credentials;
use crate::session::{self, SessionStore};
use crate::types::UserType;

pub const PASSWORD_ENV: &str = "TICKETDESK_PASSWORD";

pub async fn cmd_login(
    email: &str,
    password: Option<String>,
    user_type: Option<UserType>,
    output_json: bool,
) -> Result<()> {
    let desk = Desk::open()?;
    let password = read_secret(password, PASSWORD_ENV, "Password")?;
    let user_type = user_type.unwrap_or(desk.config.user_type);

    let user = session::login(
        desk.gateway.as_ref(),
        &desk.session,
        &Credentials {
            email: email.trim().to_string(),
            password,
        },
        user_type,
    )
    .await?;

    CommandOutput::new(json!({
        "action": "login",
        "user": user,
        "user_type": user_type.to_string(),
    }))
    .with_text(format!("Signed in as {}", user.name.cyan()))
    .print(output_json)
}

pub fn cmd_logout(output_json: bool) -> Result<()> {
    let session = SessionStore::restore(Config::session_path()?);
    let was_signed_in = session.is_authenticated();
    session.logout()?;

    let text = if was_signed_in {
        "Signed out".to_string()
    } else {
        "Not signed in".dimmed().to_string()
    };
    CommandOutput::new(json!({
        "action": "logout",
        "was_signed_in": was_signed_in,
    }))
    .with_text(text)
    .print(output_json)
}

pub fn cmd_whoami(output_json: bool) -> Result<()> {
    let session = SessionStore::restore(Config::session_path()?);
    let user = session.require_user()?;

    let mut text = format!("{} ({})", user.name.bold(), user.id.dimmed());
    if let Some(email) = &user.email {
        text.push_str(&format!("\n  email: {email}"));
    }
    if let Some(category) = &user.category {
        text.push_str(&format!("\n  type: {category}"));
    }
    CommandOutput::new(json!({ "user": user }))
        .with_text(text)
        .print(output_json)
}

pub async fn cmd_passwd(
    current: Option<String>,
    new: Option<String>,
    output_json: bool,
) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    let current = read_secret(current, "TICKETDESK_CURRENT_PASSWORD", "Current password")?;
    let new = read_secret(new, "TICKETDESK_NEW_PASSWORD", "New password")?;

    session::change_password(desk.gateway.as_ref(), &desk.session, &current, &new).await?;

    CommandOutput::new(json!({ "action": "change_password", "success": true }))
        .with_text("Password updated")
        .print(output_json)
}
