use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, text_or_stdin};
use crate::desk::Desk;
use crate::error::Result;
use crate::worknote::WorknoteThread;

/// Add a worknote to a ticket. With no words, the note is read from stdin.
pub async fn cmd_note(id: &str, words: &[String], output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    desk.tickets.fetch().await?;
    let ticket = desk.tickets.find(id)?;

    let mut thread = WorknoteThread::from_ticket(&ticket);
    thread.set_draft(text_or_stdin(words)?);
    let note = thread
        .submit(desk.gateway.as_ref(), &desk.session)
        .await?
        .clone();

    CommandOutput::new(json!({
        "action": "note",
        "id": ticket.id,
        "note": note,
        "count": thread.entries().len(),
    }))
    .with_text(format!(
        "Added worknote to {} as {}",
        ticket.display_no().cyan(),
        note.author.display_name()
    ))
    .print(output_json)
}
