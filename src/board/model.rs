//! Kanban board model types for testable state management
//!
//! This module separates state (BoardState) from view (BoardViewModel).
//! The reducer is pure: actions that need the server, such as dropping a
//! card on another status column, come back as a [`BoardEffect`] for the
//! caller to carry out.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{Category, Project, Ticket};
use crate::query::{
    FilterContext, FilterSet, GroupKey, GroupMode, GroupRefs, Scope, SortField, SortSpec,
    TicketGroup, ViewControls, build_view,
};
use crate::types::{TicketId, TicketStatus};

/// A card being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    pub ticket_id: TicketId,
    /// Column the card was picked up from.
    pub from_column: usize,
}

/// Raw state that changes during user interaction
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    /// All tickets from the ticket store
    pub tickets: Vec<Ticket>,
    /// Ids of tickets with an unconfirmed status change
    pub pending: HashSet<TicketId>,
    /// Reference projects, for project grouping
    pub projects: Vec<Project>,
    /// Reference categories, for category grouping
    pub categories: Vec<Category>,
    /// Scope, search text, filters, sort and grouping
    pub controls: ViewControls,
    pub context: FilterContext,
    /// Index of the currently selected column
    pub current_column: usize,
    /// Index of the currently selected row within the column
    pub current_row: usize,
    pub drag: Option<DragState>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// All possible actions on the board
#[derive(Debug, Clone, PartialEq)]
pub enum BoardAction {
    // Navigation
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    GoToTop,
    GoToBottom,
    /// Select the card for this ticket, wherever it is
    SelectTicket(TicketId),

    // Drag and drop
    /// Pick up the card for this ticket
    StartDrag(TicketId),
    /// Drop the dragged card on a column
    DropOnColumn(usize),
    CancelDrag,

    // Ticket status changes
    /// Move selected ticket to the next status (right)
    MoveTicketStatusRight,
    /// Move selected ticket to the previous status (left)
    MoveTicketStatusLeft,

    // View controls
    SetGroupMode(GroupMode),
    SetScope(Scope),
    UpdateSearch(String),
    ClearSearch,
    SetSort(Option<SortSpec>),
    /// Sort by a field, flipping direction if it is already active
    ToggleSort(SortField),
    SetFilters(FilterSet),
    ClearFilters,

    // Data
    /// Replace tickets and pending markers with a store snapshot
    SyncTickets {
        tickets: Vec<Ticket>,
        pending: Vec<TicketId>,
    },
    SetReferences {
        projects: Vec<Project>,
        categories: Vec<Category>,
    },
    SetLoading(bool),
    SetError(Option<String>),
}

/// Work the reducer asks the caller to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEffect {
    ChangeStatus {
        ticket_id: TicketId,
        status: TicketStatus,
    },
}

/// What to show instead of (or above) the columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    Loading,
    NoTickets,
    NoMatches,
}

/// Computed view model for rendering
#[derive(Debug, Clone, Serialize)]
pub struct BoardViewModel {
    pub group_mode: GroupMode,
    pub columns: Vec<ColumnViewModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_ticket: Option<Ticket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub search_query: String,
    pub total_filtered_tickets: usize,
    pub total_all_tickets: usize,
    /// Whether a card is being dragged
    pub is_dragging: bool,
}

/// View model for a single column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnViewModel {
    pub key: GroupKey,
    pub title: String,
    pub is_active: bool,
    pub ticket_count: usize,
    /// Whether the dragged card may be dropped here
    pub accepts_drop: bool,
    pub cards: Vec<CardViewModel>,
    /// Number of tickets past the visible rows
    pub hidden_below: usize,
}

/// View model for a single ticket card
#[derive(Debug, Clone, Serialize)]
pub struct CardViewModel {
    pub ticket: Ticket,
    pub is_selected: bool,
    pub is_dragging: bool,
    /// Status change sent but not yet confirmed
    pub is_pending: bool,
}

// ============================================================================
// Pure Functions
// ============================================================================

/// Visible tickets of `state`, grouped into board columns.
pub fn board_columns(state: &BoardState) -> Vec<TicketGroup> {
    build_view(
        &state.tickets,
        &state.controls,
        &state.context,
        GroupRefs {
            projects: &state.projects,
            categories: &state.categories,
        },
    )
}

/// Pure function: compute view model from state
///
/// `column_height` caps the number of cards listed per column; `0` means
/// no limit.
pub fn compute_board_view_model(state: &BoardState, column_height: usize) -> BoardViewModel {
    let groups = board_columns(state);
    let total_filtered: usize = groups.iter().map(|g| g.tickets.len()).sum();
    let total_all = state.tickets.len();
    let dragging = state.drag.as_ref();

    let empty_state = if state.is_loading && total_all == 0 {
        Some(EmptyState::Loading)
    } else if total_all == 0 {
        Some(EmptyState::NoTickets)
    } else if total_filtered == 0 {
        Some(EmptyState::NoMatches)
    } else {
        None
    };

    let columns = groups
        .iter()
        .enumerate()
        .map(|(col_idx, group)| {
            let is_active = state.current_column == col_idx;
            let ticket_count = group.tickets.len();
            let limit = if column_height == 0 {
                ticket_count
            } else {
                column_height.min(ticket_count)
            };
            // Keep the selected card on screen.
            let start = if is_active && state.current_row >= limit && limit > 0 {
                state.current_row + 1 - limit
            } else {
                0
            };

            let cards = group
                .tickets
                .iter()
                .enumerate()
                .skip(start)
                .take(limit)
                .map(|(row_idx, ticket)| CardViewModel {
                    ticket: ticket.clone(),
                    is_selected: is_active && row_idx == state.current_row,
                    is_dragging: dragging.is_some_and(|d| d.ticket_id == ticket.id),
                    is_pending: state.pending.contains(&ticket.id),
                })
                .collect();

            ColumnViewModel {
                key: group.key.clone(),
                title: group.title.clone(),
                is_active,
                ticket_count,
                accepts_drop: dragging.is_some_and(|d| d.from_column != col_idx)
                    && group.key.status().is_some(),
                cards,
                hidden_below: ticket_count.saturating_sub(start + limit),
            }
        })
        .collect();

    BoardViewModel {
        group_mode: state.controls.group,
        columns,
        selected_ticket: selected_ticket(state, &groups),
        empty_state,
        error: state.error.clone(),
        search_query: state.controls.text.clone(),
        total_filtered_tickets: total_filtered,
        total_all_tickets: total_all,
        is_dragging: dragging.is_some(),
    }
}

/// Pure function: apply action to state (reducer pattern)
///
/// Returns the new state and, for actions that change a ticket's status,
/// the effect to run. The reducer never edits tickets itself; the ticket
/// store applies the change and the caller syncs it back.
pub fn reduce_board_state(
    mut state: BoardState,
    action: BoardAction,
) -> (BoardState, Option<BoardEffect>) {
    let mut effect = None;

    match action {
        // Navigation
        BoardAction::MoveLeft => {
            state.current_column = state.current_column.saturating_sub(1);
            clamp_selection(&mut state);
        }
        BoardAction::MoveRight => {
            let columns = board_columns(&state).len();
            if state.current_column + 1 < columns {
                state.current_column += 1;
            }
            clamp_selection(&mut state);
        }
        BoardAction::MoveUp => {
            state.current_row = state.current_row.saturating_sub(1);
        }
        BoardAction::MoveDown => {
            state.current_row += 1;
            clamp_selection(&mut state);
        }
        BoardAction::GoToTop => {
            state.current_row = 0;
        }
        BoardAction::GoToBottom => {
            state.current_row = usize::MAX;
            clamp_selection(&mut state);
        }
        BoardAction::SelectTicket(id) => {
            if let Some((column, row)) = locate(&board_columns(&state), &id) {
                state.current_column = column;
                state.current_row = row;
            }
        }

        // Drag and drop
        BoardAction::StartDrag(id) => {
            if let Some((column, row)) = locate(&board_columns(&state), &id) {
                state.current_column = column;
                state.current_row = row;
                state.drag = Some(DragState {
                    ticket_id: id,
                    from_column: column,
                });
            }
        }
        BoardAction::DropOnColumn(target) => {
            if let Some(drag) = state.drag.take() {
                let groups = board_columns(&state);
                // Only status columns map to a status.
                let status = groups.get(target).and_then(|g| g.key.status());
                let current = state
                    .tickets
                    .iter()
                    .find(|t| t.id == drag.ticket_id)
                    .map(|t| t.status);
                if let (Some(status), Some(current)) = (status, current)
                    && status != current
                {
                    effect = Some(BoardEffect::ChangeStatus {
                        ticket_id: drag.ticket_id,
                        status,
                    });
                }
            }
        }
        BoardAction::CancelDrag => {
            state.drag = None;
        }

        // Ticket status changes
        BoardAction::MoveTicketStatusRight => {
            effect = step_selected_status(&state, TicketStatus::next);
        }
        BoardAction::MoveTicketStatusLeft => {
            effect = step_selected_status(&state, TicketStatus::prev);
        }

        // View controls
        BoardAction::SetGroupMode(mode) => {
            state.controls.group = mode;
            state.drag = None;
            reset_selection(&mut state);
        }
        BoardAction::SetScope(scope) => {
            state.controls.scope = scope;
            clamp_selection(&mut state);
        }
        BoardAction::UpdateSearch(query) => {
            state.controls.text = query;
            clamp_selection(&mut state);
        }
        BoardAction::ClearSearch => {
            state.controls.text.clear();
            clamp_selection(&mut state);
        }
        BoardAction::SetSort(sort) => {
            state.controls.sort = sort;
        }
        BoardAction::ToggleSort(field) => {
            state.controls.sort = Some(SortSpec::toggle(state.controls.sort, field));
        }
        BoardAction::SetFilters(filters) => {
            state.controls.filters = filters;
            clamp_selection(&mut state);
        }
        BoardAction::ClearFilters => {
            state.controls.filters = FilterSet::default();
            clamp_selection(&mut state);
        }

        // Data
        BoardAction::SyncTickets { tickets, pending } => {
            state.tickets = tickets;
            state.pending = pending.into_iter().collect();
            if let Some(drag) = &state.drag
                && !state.tickets.iter().any(|t| t.id == drag.ticket_id)
            {
                state.drag = None;
            }
            clamp_selection(&mut state);
        }
        BoardAction::SetReferences {
            projects,
            categories,
        } => {
            state.projects = projects;
            state.categories = categories;
            clamp_selection(&mut state);
        }
        BoardAction::SetLoading(loading) => {
            state.is_loading = loading;
        }
        BoardAction::SetError(error) => {
            state.error = error;
        }
    }

    (state, effect)
}

fn step_selected_status(
    state: &BoardState,
    step: fn(&TicketStatus) -> Option<TicketStatus>,
) -> Option<BoardEffect> {
    let ticket = selected_ticket(state, &board_columns(state))?;
    step(&ticket.status).map(|status| BoardEffect::ChangeStatus {
        ticket_id: ticket.id,
        status,
    })
}

fn reset_selection(state: &mut BoardState) {
    state.current_column = 0;
    state.current_row = 0;
}

/// Keep the selection inside the current columns.
fn clamp_selection(state: &mut BoardState) {
    let groups = board_columns(state);
    if groups.is_empty() {
        reset_selection(state);
        return;
    }
    state.current_column = state.current_column.min(groups.len() - 1);
    let rows = groups[state.current_column].tickets.len();
    state.current_row = state.current_row.min(rows.saturating_sub(1));
}

/// Column and row of a ticket's card.
pub fn locate(groups: &[TicketGroup], id: &TicketId) -> Option<(usize, usize)> {
    groups.iter().enumerate().find_map(|(column, group)| {
        group
            .tickets
            .iter()
            .position(|t| &t.id == id)
            .map(|row| (column, row))
    })
}

fn selected_ticket(state: &BoardState, groups: &[TicketGroup]) -> Option<Ticket> {
    groups
        .get(state.current_column)
        .and_then(|g| g.tickets.get(state.current_row))
        .cloned()
}

// ============================================================================
// Tests
// ============================================================================
