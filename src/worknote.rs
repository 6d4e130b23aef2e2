//! Worknotes on a ticket.
//!
//! A posted note is appended to the thread shown for the ticket. The cached
//! ticket itself is left alone; the server's copy picks the note up on the
//! next fetch.

use jiff::Timestamp;

use crate::error::{DeskError, Result};
use crate::forms::{Field, FieldErrors};
use crate::gateway::{Gateway, WorknotePayload};
use crate::model::{Ticket, Worknote};
use crate::session::SessionStore;
use crate::types::TicketId;

pub const EMPTY_COMMENT: &str = "Comment cannot be empty";

/// Visible worknote history of one ticket plus the note being written.
#[derive(Debug, Clone)]
pub struct WorknoteThread {
    ticket_id: TicketId,
    entries: Vec<Worknote>,
    pub draft: String,
    errors: FieldErrors,
}

impl WorknoteThread {
    pub fn new(ticket_id: TicketId) -> Self {
        Self {
            ticket_id,
            entries: Vec::new(),
            draft: String::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            entries: ticket.worknotes.clone(),
            ..Self::new(ticket.id.clone())
        }
    }

    pub fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    pub fn entries(&self) -> &[Worknote] {
        &self.entries
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.errors.clear(Field::Comment);
    }

    /// Post the draft. On success the note is appended and the draft cleared.
    pub async fn submit(&mut self, gateway: &dyn Gateway, session: &SessionStore) -> Result<&Worknote> {
        let text = self.draft.clone();
        let note = match post_worknote(gateway, session, &self.ticket_id, &text).await {
            Ok(note) => note,
            Err(DeskError::Validation(errors)) => {
                self.errors = errors.clone();
                return Err(DeskError::Validation(errors));
            }
            Err(e) => return Err(e),
        };
        self.draft.clear();
        self.entries.push(note);
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }
}

/// Post a worknote and return the entry to show for it.
///
/// The entry is built locally: its author is the signed-in user and its
/// time is the moment of submission.
pub async fn post_worknote(
    gateway: &dyn Gateway,
    session: &SessionStore,
    ticket_id: &TicketId,
    text: &str,
) -> Result<Worknote> {
    let text = text.trim();
    if text.is_empty() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Comment, EMPTY_COMMENT);
        return Err(DeskError::Validation(errors));
    }
    let author = session.require_user()?;

    tracing::debug!("posting worknote on ticket '{ticket_id}'");
    gateway
        .post_worknote(ticket_id, &WorknotePayload::new(&author, text))
        .await?;

    Ok(Worknote {
        author: author.to_person(),
        text: text.to_string(),
        at: Some(Timestamp::now()),
    })
}
