//! Ticket store: cached ticket list, mutation workflow and optimistic
//! status changes.

use std::collections::HashMap;
use std::sync::Arc;

use jiff::tz::TimeZone;
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::error::{DeskError, Result};
use crate::forms::TicketForm;
use crate::gateway::{Gateway, ServerFilterPayload, UpdateTicketPayload};
use crate::model::{CurrentUser, Ticket};
use crate::types::{TicketId, TicketStatus};

use super::{Confirm, Generation, StoreStatus};

/// An optimistic status change awaiting the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStatus {
    /// Status before the first unconfirmed change, restored on failure.
    pub previous: TicketStatus,
    pub requested: TicketStatus,
    /// Identifies the latest request; older completions are ignored.
    pub token: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TicketState {
    pub tickets: Vec<Ticket>,
    pub status: StoreStatus,
    pub pending: HashMap<TicketId, PendingStatus>,
    latest_fetch: u64,
}

impl TicketState {
    pub fn get(&self, id: &TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| &t.id == id)
    }

    pub fn is_pending(&self, id: &TicketId) -> bool {
        self.pending.contains_key(id)
    }

    fn get_mut(&mut self, id: &TicketId) -> Option<&mut Ticket> {
        self.tickets.iter_mut().find(|t| &t.id == id)
    }

    fn replace(&mut self, ticket: Ticket) {
        match self.get_mut(&ticket.id) {
            Some(existing) => *existing = ticket,
            None => self.tickets.push(ticket),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TicketEvent {
    FetchStarted { generation: u64 },
    FetchSucceeded { generation: u64, tickets: Vec<Ticket> },
    FetchFailed { generation: u64, message: String },
    MutationStarted,
    Created(Option<Ticket>),
    Updated(Option<Ticket>),
    Deleted(TicketId),
    MutationFailed(String),
    StatusChangeRequested { id: TicketId, status: TicketStatus, token: u64 },
    StatusChangeConfirmed { id: TicketId, token: u64, ticket: Option<Ticket> },
    StatusChangeFailed { id: TicketId, token: u64, message: String },
    ClearMessages,
}

/// The single writer of [`TicketState`].
pub fn reduce_ticket_state(state: &mut TicketState, event: TicketEvent) {
    match event {
        TicketEvent::FetchStarted { generation } => {
            state.latest_fetch = state.latest_fetch.max(generation);
            state.status.begin_fetch();
        }
        TicketEvent::FetchSucceeded {
            generation,
            mut tickets,
        } => {
            if generation < state.latest_fetch {
                tracing::debug!("discarding stale ticket fetch (generation {generation})");
                return;
            }
            // Unconfirmed status changes win over what the server last saw.
            for ticket in &mut tickets {
                if let Some(pending) = state.pending.get(&ticket.id) {
                    ticket.status = pending.requested;
                }
            }
            state.tickets = tickets;
            state.status.finish_fetch();
        }
        TicketEvent::FetchFailed {
            generation,
            message,
        } => {
            if generation < state.latest_fetch {
                return;
            }
            state.status.fail(message);
        }
        TicketEvent::MutationStarted => state.status.start(),
        TicketEvent::Created(ticket) => {
            if let Some(ticket) = ticket
                && state.get(&ticket.id).is_none()
            {
                state.tickets.push(ticket);
            }
            state.status.succeed(Some("Ticket created successfully"));
        }
        TicketEvent::Updated(ticket) => {
            if let Some(ticket) = ticket {
                state.replace(ticket);
            }
            state.status.succeed(Some("Ticket updated successfully"));
        }
        TicketEvent::Deleted(id) => {
            state.tickets.retain(|t| t.id != id);
            state.pending.remove(&id);
            state.status.succeed(Some("Ticket deleted successfully"));
        }
        TicketEvent::MutationFailed(message) => state.status.fail(message),
        TicketEvent::StatusChangeRequested { id, status, token } => {
            let Some(ticket) = state.get_mut(&id) else {
                return;
            };
            let current = ticket.status;
            ticket.status = status;
            let previous = state
                .pending
                .get(&id)
                .map(|p| p.previous)
                .unwrap_or(current);
            state.pending.insert(
                id,
                PendingStatus {
                    previous,
                    requested: status,
                    token,
                },
            );
        }
        TicketEvent::StatusChangeConfirmed { id, token, ticket } => {
            if state.pending.get(&id).is_none_or(|p| p.token != token) {
                return;
            }
            state.pending.remove(&id);
            if let Some(ticket) = ticket {
                state.replace(ticket);
            }
            state.status.succeed(Some("Ticket status updated"));
        }
        TicketEvent::StatusChangeFailed { id, token, message } => {
            if let Some(pending) = state.pending.get(&id).copied()
                && pending.token == token
            {
                state.pending.remove(&id);
                if let Some(ticket) = state.get_mut(&id) {
                    ticket.status = pending.previous;
                }
            }
            state.status.fail(message);
        }
        TicketEvent::ClearMessages => {
            state.status.error = None;
            state.status.success = None;
        }
    }
}

/// Shared handle to the ticket cache. Clones refer to the same state.
#[derive(Clone)]
pub struct TicketStore {
    gateway: Arc<dyn Gateway>,
    state: Arc<RwLock<TicketState>>,
    generation: Arc<Generation>,
    status_tokens: Arc<Generation>,
}

impl TicketStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(TicketState::default())),
            generation: Arc::new(Generation::default()),
            status_tokens: Arc::new(Generation::default()),
        }
    }

    pub fn dispatch(&self, event: TicketEvent) {
        reduce_ticket_state(&mut self.state.write(), event);
    }

    pub fn snapshot(&self) -> TicketState {
        self.state.read().clone()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.state.read().tickets.clone()
    }

    pub fn status(&self) -> StoreStatus {
        self.state.read().status.clone()
    }

    pub fn get(&self, id: &TicketId) -> Option<Ticket> {
        self.state.read().get(id).cloned()
    }

    /// Resolve a ticket by server id or ticket number (case-insensitive).
    pub fn find(&self, needle: &str) -> Result<Ticket> {
        let needle = needle.trim();
        let state = self.state.read();
        state
            .tickets
            .iter()
            .find(|t| t.id.as_str() == needle)
            .or_else(|| {
                state.tickets.iter().find(|t| {
                    t.ticket_no
                        .as_deref()
                        .is_some_and(|no| no.eq_ignore_ascii_case(needle))
                })
            })
            .cloned()
            .ok_or_else(|| DeskError::TicketNotFound(needle.to_string()))
    }

    /// Replace the cache with the server's full ticket list.
    pub async fn fetch(&self) -> Result<()> {
        let generation = self.generation.next();
        self.dispatch(TicketEvent::FetchStarted { generation });
        let result = self.gateway.list_tickets().await;
        self.finish_fetch(generation, result)
    }

    /// Replace the cache with the result of a server-side filter.
    pub async fn fetch_filtered(&self, filter: &ServerFilterPayload) -> Result<()> {
        let generation = self.generation.next();
        self.dispatch(TicketEvent::FetchStarted { generation });
        let result = self.gateway.filter_tickets(filter).await;
        self.finish_fetch(generation, result)
    }

    fn finish_fetch(&self, generation: u64, result: Result<Vec<Ticket>>) -> Result<()> {
        match result {
            Ok(tickets) => {
                tracing::debug!("fetched {} tickets", tickets.len());
                self.dispatch(TicketEvent::FetchSucceeded {
                    generation,
                    tickets,
                });
                Ok(())
            }
            Err(e) => {
                self.dispatch(TicketEvent::FetchFailed {
                    generation,
                    message: e.store_message(),
                });
                Err(e)
            }
        }
    }

    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.fetch().await {
            tracing::warn!("refreshing tickets after update failed: {e}");
        }
    }

    /// Validate and create a ticket, then refresh the list.
    ///
    /// Invalid input is returned as [`DeskError::Validation`] without any
    /// request being made.
    pub async fn create(
        &self,
        form: &mut TicketForm,
        reporter: &CurrentUser,
        tz: &TimeZone,
    ) -> Result<Option<Ticket>> {
        let payload = form.create_payload(reporter, tz)?;

        self.dispatch(TicketEvent::MutationStarted);
        match self.gateway.create_ticket(&payload).await {
            Ok(created) => {
                self.dispatch(TicketEvent::Created(created.clone()));
                self.refresh_after_mutation().await;
                Ok(created)
            }
            Err(e) => {
                self.dispatch(TicketEvent::MutationFailed(e.store_message()));
                Err(e)
            }
        }
    }

    /// Merge the form over the cached ticket, send it, then refresh.
    pub async fn update(
        &self,
        id: &TicketId,
        form: &mut TicketForm,
        updater: &CurrentUser,
        tz: &TimeZone,
    ) -> Result<Option<Ticket>> {
        let base = self
            .get(id)
            .ok_or_else(|| DeskError::TicketNotFound(id.to_string()))?;
        let payload = form.update_payload(&base, updater, tz)?;

        self.dispatch(TicketEvent::MutationStarted);
        match self.gateway.update_ticket(id, &payload).await {
            Ok(updated) => {
                self.dispatch(TicketEvent::Updated(updated.clone()));
                self.refresh_after_mutation().await;
                Ok(updated)
            }
            Err(e) => {
                self.dispatch(TicketEvent::MutationFailed(e.store_message()));
                Err(e)
            }
        }
    }

    /// Delete after confirmation. Declining returns [`DeskError::Cancelled`]
    /// and makes no request.
    pub async fn delete(&self, id: &TicketId, confirm: &dyn Confirm) -> Result<()> {
        let ticket = self
            .get(id)
            .ok_or_else(|| DeskError::TicketNotFound(id.to_string()))?;
        let prompt = format!("Delete ticket {} \"{}\"?", ticket.display_no(), ticket.subject);
        if !confirm.confirm(&prompt) {
            return Err(DeskError::Cancelled);
        }

        self.dispatch(TicketEvent::MutationStarted);
        match self.gateway.delete_ticket(id).await {
            Ok(()) => {
                self.dispatch(TicketEvent::Deleted(id.clone()));
                Ok(())
            }
            Err(e) => {
                self.dispatch(TicketEvent::MutationFailed(e.store_message()));
                Err(e)
            }
        }
    }

    /// Change a ticket's status optimistically.
    ///
    /// The cached ticket takes the new status before this returns; the
    /// update request runs on a background task. If it fails, the ticket is
    /// rolled back (unless a newer change superseded it) and the error is
    /// recorded. Returns `None` when the ticket already has `status`.
    pub fn change_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
        updater: &CurrentUser,
    ) -> Result<Option<JoinHandle<Result<()>>>> {
        let ticket = self
            .get(id)
            .ok_or_else(|| DeskError::TicketNotFound(id.to_string()))?;
        if ticket.status == status {
            return Ok(None);
        }

        let token = self.status_tokens.next();
        let mut target = ticket;
        target.status = status;
        let payload = UpdateTicketPayload::from_ticket(&target, updater);

        self.dispatch(TicketEvent::StatusChangeRequested {
            id: id.clone(),
            status,
            token,
        });

        let store = self.clone();
        let id = id.clone();
        Ok(Some(tokio::spawn(async move {
            match store.gateway.update_ticket(&id, &payload).await {
                Ok(ticket) => {
                    store.dispatch(TicketEvent::StatusChangeConfirmed { id, token, ticket });
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("status change for ticket '{id}' failed: {e}");
                    store.dispatch(TicketEvent::StatusChangeFailed {
                        id,
                        token,
                        message: e.store_message(),
                    });
                    Err(e)
                }
            }
        })))
    }
}
