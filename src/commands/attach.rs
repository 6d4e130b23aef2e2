use std::path::PathBuf;

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use super::tickets::upload_files;
use crate::desk::Desk;
use crate::error::{DeskError, Result};
use crate::forms::TicketForm;

/// Upload files and attach them to an existing ticket.
pub async fn cmd_attach(id: &str, files: &[PathBuf], output_json: bool) -> Result<()> {
    if files.is_empty() {
        return Err(DeskError::Other("no files given".to_string()));
    }
    let desk = Desk::open()?;
    let updater = desk.require_user()?;
    desk.tickets.fetch().await?;
    let ticket = desk.tickets.find(id)?;

    let mut form = TicketForm::from_ticket(&ticket, &desk.tz);
    let before = form.attachments.urls().len();
    upload_files(&desk, &form.attachments, files).await?;
    let added = form.attachments.urls().len() - before;

    if added > 0 {
        desk.tickets
            .update(&ticket.id, &mut form, &updater, &desk.tz)
            .await?;
    }

    CommandOutput::new(json!({
        "action": "attach",
        "id": ticket.id,
        "added": added,
        "attachments": form.attachments.urls(),
    }))
    .with_text(format!(
        "Attached {added} of {} file(s) to {}",
        files.len(),
        ticket.display_no().cyan()
    ))
    .print(output_json)
}
