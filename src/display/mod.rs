//! Terminal rendering of tickets, projects and the board.
//!
//! Everything here returns a `String`; the commands decide where it goes.

pub mod board;
pub mod detail;
pub mod tables;

use owo_colors::OwoColorize;

use crate::model::Ticket;
use crate::types::{ProjectStatus, Severity, TicketStatus};

pub use board::render_board;
pub use detail::{render_project_detail, render_ticket_detail};
pub use tables::{render_categories, render_projects, render_ticket_list, render_users};

pub fn format_status_colored(status: TicketStatus) -> String {
    format_status_colored_with_format(status, |s| format!("[{}]", s))
}

pub fn format_status_colored_with_format<F>(status: TicketStatus, format_fn: F) -> String
where
    F: Fn(&str) -> String,
{
    let badge = format_fn(&status.to_string());
    match status {
        TicketStatus::Open => badge.blue().to_string(),
        TicketStatus::InProgress => badge.yellow().to_string(),
        TicketStatus::Resolved => badge.magenta().to_string(),
        TicketStatus::Closed => badge.green().to_string(),
    }
}

pub fn format_severity_colored(severity: Option<Severity>) -> String {
    match severity {
        Some(Severity::Critical) => "Critical".red().bold().to_string(),
        Some(Severity::High) => "High".bright_red().to_string(),
        Some(Severity::Medium) => "Medium".yellow().to_string(),
        Some(Severity::Low) => "Low".green().to_string(),
        None => "N/A".dimmed().to_string(),
    }
}

pub fn format_project_status(status: ProjectStatus) -> String {
    let label = status.to_string();
    match status {
        ProjectStatus::Active => label.green().to_string(),
        ProjectStatus::Completed => label.blue().to_string(),
        ProjectStatus::OnHold => label.yellow().to_string(),
        ProjectStatus::Draft => label.dimmed().to_string(),
    }
}

/// `SR12  [OPEN] Printer on fire`
pub fn format_ticket_line(ticket: &Ticket) -> String {
    format!(
        "{} {} {}",
        format!("{:8}", ticket.display_no()).cyan(),
        format_status_colored(ticket.status),
        ticket.subject
    )
}

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}
