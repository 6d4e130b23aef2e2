//! Ticket commands: list, board, show, create, update, delete, move.

use std::path::PathBuf;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, StdinConfirm};
use crate::attachments::{AttachmentSet, PendingFile};
use crate::board::{Board, BoardAction};
use crate::desk::Desk;
use crate::display::{format_status_colored, render_board, render_ticket_detail, render_ticket_list};
use crate::error::{DeskError, Result};
use crate::forms::TicketForm;
use crate::list::compute_list_view_model;
use crate::model::{Category, PersonRef};
use crate::query::{ViewControls, filter_and_sort};
use crate::store::{AssumeYes, Confirm};
use crate::types::{Priority, Severity, TicketStatus};
use crate::worknote::WorknoteThread;

/// Ticket fields given on the command line. For updates, `None` keeps the
/// current value.
#[derive(Debug, Clone, Default)]
pub struct TicketOptions {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub project: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub severity: Option<Severity>,
    pub assignee: Option<String>,
    pub reported_to: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub scope: Option<String>,
    pub escalated: Option<bool>,
    pub files: Vec<PathBuf>,
}

/// List tickets, filtered and sorted locally or by the server.
pub async fn cmd_ls(
    controls: ViewControls,
    server: bool,
    page: usize,
    output_json: bool,
) -> Result<()> {
    let desk = Desk::open()?;
    let user = desk.require_user()?;

    let context = desk.filter_context();
    let tickets = if server {
        let payload = controls.filters.to_server_payload(Some(&user.id));
        desk.tickets.fetch_filtered(&payload).await?;
        // The server applied the structured filters; scope, text and sort
        // still run here.
        let local = ViewControls {
            filters: Default::default(),
            ..controls.clone()
        };
        filter_and_sort(&desk.tickets.tickets(), &local, &context)
    } else {
        desk.tickets.fetch().await?;
        filter_and_sort(&desk.tickets.tickets(), &controls, &context)
    };

    let vm = compute_list_view_model(&tickets, controls.sort, page);
    CommandOutput::new(serde_json::to_value(&vm)?)
        .with_text(render_ticket_list(&vm, &desk.tz))
        .print(output_json)
}

pub async fn cmd_board(
    controls: ViewControls,
    column_height: usize,
    output_json: bool,
) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;

    let (fetched, (projects, categories)) =
        futures::join!(desk.tickets.fetch(), desk.load_references());
    fetched?;

    let mut board = Board::new(desk.tickets.clone(), controls, desk.filter_context());
    board.set_references(projects, categories);
    let vm = board.view_model(column_height);

    CommandOutput::new(serde_json::to_value(&vm)?)
        .with_text(render_board(&vm))
        .print(output_json)
}

pub async fn cmd_show(id: &str, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    desk.tickets.fetch().await?;
    let ticket = desk.tickets.find(id)?;
    let thread = WorknoteThread::from_ticket(&ticket);

    CommandOutput::new(json!({ "ticket": ticket }))
        .with_text(render_ticket_detail(&ticket, thread.entries(), &desk.tz))
        .print(output_json)
}

pub async fn cmd_create(options: TicketOptions, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    let reporter = desk.require_user()?;

    let mut form = TicketForm::new();
    apply_options(&desk, &mut form, &options).await?;
    upload_files(&desk, &form.attachments, &options.files).await?;

    let created = desk.tickets.create(&mut form, &reporter, &desk.tz).await?;

    let text = match &created {
        Some(ticket) => format!("Created {} {}", ticket.display_no().cyan(), ticket.subject),
        None => "Ticket created".to_string(),
    };
    CommandOutput::new(json!({
        "action": "create",
        "ticket": created,
    }))
    .with_text(text)
    .print(output_json)
}

pub async fn cmd_update(id: &str, options: TicketOptions, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    let updater = desk.require_user()?;
    desk.tickets.fetch().await?;
    let ticket = desk.tickets.find(id)?;

    let mut form = TicketForm::from_ticket(&ticket, &desk.tz);
    apply_options(&desk, &mut form, &options).await?;
    upload_files(&desk, &form.attachments, &options.files).await?;

    let updated = desk
        .tickets
        .update(&ticket.id, &mut form, &updater, &desk.tz)
        .await?;

    CommandOutput::new(json!({
        "action": "update",
        "id": ticket.id,
        "ticket": updated,
    }))
    .with_text(format!("Updated {}", ticket.display_no().cyan()))
    .print(output_json)
}

pub async fn cmd_delete(id: &str, yes: bool, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    desk.require_user()?;
    desk.tickets.fetch().await?;
    let ticket = desk.tickets.find(id)?;

    let confirm: &dyn Confirm = if yes { &AssumeYes } else { &StdinConfirm };
    desk.tickets.delete(&ticket.id, confirm).await?;

    CommandOutput::new(json!({
        "action": "delete",
        "id": ticket.id,
    }))
    .with_text(format!("Deleted {}", ticket.display_no().cyan()))
    .print(output_json)
}

/// Move a ticket to another status column, as dragging its card would.
pub async fn cmd_move(id: &str, status: TicketStatus, output_json: bool) -> Result<()> {
    let desk = Desk::open()?;
    let user = desk.require_user()?;
    desk.tickets.fetch().await?;
    let ticket = desk.tickets.find(id)?;
    let previous = ticket.status;

    let mut board = Board::new(
        desk.tickets.clone(),
        ViewControls::default(),
        desk.filter_context(),
    );
    board.dispatch(BoardAction::StartDrag(ticket.id.clone()), &user)?;
    let handle = board.dispatch(BoardAction::DropOnColumn(status.index()), &user)?;

    if let Some(handle) = handle {
        handle.await??;
    }

    CommandOutput::new(json!({
        "action": "move",
        "id": ticket.id,
        "from": previous.to_string(),
        "to": status.to_string(),
    }))
    .with_text(format!(
        "{} {} -> {}",
        ticket.display_no().cyan(),
        format_status_colored(previous),
        format_status_colored(status)
    ))
    .print(output_json)
}

/// Resolve the named entities, then copy the given fields. The category's
/// default severity and scope go in first so explicit flags override them.
async fn apply_options(desk: &Desk, form: &mut TicketForm, options: &TicketOptions) -> Result<()> {
    if let Some(category) = &options.category {
        let categories = desk.categories.ensure_loaded().await?;
        form.apply_category(resolve_category(&categories, category)?);
    }
    if let Some(project) = &options.project {
        desk.projects.fetch().await?;
        form.set_project(desk.projects.find(project)?.id);
    }
    if let Some(assignee) = &options.assignee {
        form.assignee = Some(resolve_user(desk, assignee).await?);
    }
    if let Some(reported_to) = &options.reported_to {
        form.reported_to = Some(resolve_user(desk, reported_to).await?);
    }
    apply_fields(form, options);
    Ok(())
}

fn apply_fields(form: &mut TicketForm, options: &TicketOptions) {
    if let Some(subject) = &options.subject {
        form.set_subject(subject.clone());
    }
    if let Some(description) = &options.description {
        form.set_description(description.clone());
    }
    if options.status.is_some() {
        form.status = options.status;
    }
    if options.priority.is_some() {
        form.priority = options.priority;
    }
    if options.severity.is_some() {
        form.severity = options.severity;
    }
    if let Some(start) = &options.start {
        form.set_start(start.clone());
    }
    if let Some(end) = &options.end {
        form.set_end(end.clone());
    }
    if options.scope.is_some() {
        form.scope = options.scope.clone();
    }
    if options.escalated.is_some() {
        form.escalated = options.escalated;
    }
}

/// Match a category by id or name (case-insensitive).
fn resolve_category<'a>(categories: &'a [Category], needle: &str) -> Result<&'a Category> {
    let needle = needle.trim();
    categories
        .iter()
        .find(|c| c.id == needle)
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(needle)))
        .ok_or_else(|| DeskError::CategoryNotFound(needle.to_string()))
}

/// Match a user by id, username, email or name.
async fn resolve_user(desk: &Desk, needle: &str) -> Result<PersonRef> {
    let needle = needle.trim();
    let users = desk.users.ensure_loaded().await?;
    users
        .iter()
        .find(|u| u.id == needle)
        .or_else(|| {
            users.iter().find(|u| {
                u.username.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(needle))
                    || u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(needle))
                    || u.name.eq_ignore_ascii_case(needle)
            })
        })
        .map(|u| u.to_person())
        .ok_or_else(|| DeskError::UserNotFound(needle.to_string()))
}

/// Upload files into the form's attachment set, reporting progress on
/// stderr. Failed files are reported and skipped.
pub(super) async fn upload_files(
    desk: &Desk,
    attachments: &AttachmentSet,
    paths: &[PathBuf],
) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(PendingFile::from_path(path).await?);
    }

    let report = attachments
        .upload_all(desk.gateway.as_ref(), files, &|name, pct| {
            tracing::debug!("uploading {name}: {pct}%");
        })
        .await?;

    for url in &report.uploaded {
        eprintln!("{} {url}", "uploaded".green());
    }
    for (file, message) in &report.failed {
        eprintln!("{} {file}: {message}", "upload failed".red());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            severity: None,
            scope: None,
        }
    }

    #[test]
    fn test_resolve_category_by_id_or_name() {
        let categories = vec![category("c1", "Hardware"), category("c2", "Network")];
        assert_eq!(resolve_category(&categories, "c2").unwrap().id, "c2");
        assert_eq!(resolve_category(&categories, "hardware").unwrap().id, "c1");
        assert!(matches!(
            resolve_category(&categories, "Plumbing"),
            Err(DeskError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn test_flags_override_category_defaults() {
        let network = Category {
            severity: Some(Severity::High),
            scope: Some("Internal".to_string()),
            ..category("c2", "Network")
        };
        let mut form = TicketForm::new();
        form.apply_category(&network);

        let options = TicketOptions {
            severity: Some(Severity::Low),
            ..Default::default()
        };
        apply_fields(&mut form, &options);

        assert_eq!(form.category.as_deref(), Some("c2"));
        assert_eq!(form.severity, Some(Severity::Low));
        assert_eq!(form.scope.as_deref(), Some("Internal"));
    }
}
