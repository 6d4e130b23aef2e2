//! Kanban board: view state bound to the ticket store.
//!
//! [`model`] holds the pure state, reducer and view model. [`Board`] runs
//! the reducer and carries out its effects against the [`TicketStore`], then
//! syncs the store's tickets back into the view state.

pub mod model;

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::model::{Category, CurrentUser, Project};
use crate::query::{FilterContext, ViewControls};
use crate::store::TicketStore;

pub use model::{
    BoardAction, BoardEffect, BoardState, BoardViewModel, CardViewModel, ColumnViewModel,
    DragState, EmptyState, compute_board_view_model, reduce_board_state,
};

pub struct Board {
    store: TicketStore,
    state: BoardState,
}

impl Board {
    pub fn new(store: TicketStore, controls: ViewControls, context: FilterContext) -> Self {
        let mut board = Self {
            store,
            state: BoardState {
                controls,
                context,
                ..Default::default()
            },
        };
        board.sync();
        board
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn view_model(&self, column_height: usize) -> BoardViewModel {
        compute_board_view_model(&self.state, column_height)
    }

    /// Copy the store's current tickets, pending markers and status.
    pub fn sync(&mut self) {
        let snapshot = self.store.snapshot();
        self.reduce(BoardAction::SyncTickets {
            tickets: snapshot.tickets,
            pending: snapshot.pending.into_keys().collect(),
        });
        self.reduce(BoardAction::SetLoading(snapshot.status.loading));
        self.reduce(BoardAction::SetError(snapshot.status.error));
    }

    pub fn set_references(&mut self, projects: Vec<Project>, categories: Vec<Category>) {
        self.reduce(BoardAction::SetReferences {
            projects,
            categories,
        });
    }

    fn reduce(&mut self, action: BoardAction) -> Option<BoardEffect> {
        let (state, effect) = reduce_board_state(std::mem::take(&mut self.state), action);
        self.state = state;
        effect
    }

    /// Apply an action. A status change is handed to the store, which
    /// updates the ticket immediately and confirms it in the background;
    /// the returned handle resolves once the server has answered.
    pub fn dispatch(
        &mut self,
        action: BoardAction,
        updater: &CurrentUser,
    ) -> Result<Option<JoinHandle<Result<()>>>> {
        let Some(effect) = self.reduce(action) else {
            return Ok(None);
        };

        match effect {
            BoardEffect::ChangeStatus { ticket_id, status } => {
                tracing::debug!("moving ticket '{ticket_id}' to {status}");
                let handle = self.store.change_status(&ticket_id, status, updater)?;
                self.sync();
                self.reduce(BoardAction::SelectTicket(ticket_id));
                Ok(handle)
            }
        }
    }
}
