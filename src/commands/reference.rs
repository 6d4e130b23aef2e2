use serde_json::json;

use super::CommandOutput;
use crate::desk::Desk;
use crate::display::{render_categories, render_users};
use crate::error::Result;

pub async fn cmd_categories(output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    let categories = desk.categories.ensure_loaded().await?;

    CommandOutput::new(json!({ "categories": categories }))
        .with_text(render_categories(&categories))
        .print(output_json)
}

pub async fn cmd_users(output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    let users = desk.users.ensure_loaded().await?;

    CommandOutput::new(json!({ "users": users }))
        .with_text(render_users(&users))
        .print(output_json)
}
