//! Per-project figures derived from the ticket list.

use jiff::Timestamp;
use serde::Serialize;

use crate::model::{Project, Ticket};
use crate::time::days_remaining;
use crate::types::TicketStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
    /// Server-reported progress when present, otherwise the share of
    /// resolved and closed tickets.
    pub progress: u8,
    /// Whole days until the end date, zero once it has passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    pub overdue: bool,
}

impl ProjectSummary {
    pub fn done(&self) -> usize {
        self.resolved + self.closed
    }
}

pub fn summarize_project(project: &Project, tickets: &[Ticket], now: Timestamp) -> ProjectSummary {
    let mut summary = ProjectSummary {
        project_id: project.id.clone(),
        total: 0,
        open: 0,
        in_progress: 0,
        resolved: 0,
        closed: 0,
        progress: 0,
        days_remaining: project.end_date.map(|end| days_remaining(end, now)),
        overdue: project.end_date.is_some_and(|end| end < now),
    };

    for ticket in tickets
        .iter()
        .filter(|t| t.project_id() == Some(project.id.as_str()))
    {
        summary.total += 1;
        match ticket.status {
            TicketStatus::Open => summary.open += 1,
            TicketStatus::InProgress => summary.in_progress += 1,
            TicketStatus::Resolved => summary.resolved += 1,
            TicketStatus::Closed => summary.closed += 1,
        }
    }

    summary.progress = match project.progress {
        Some(progress) => progress.min(100),
        None if summary.total == 0 => 0,
        None => ((summary.done() * 100) / summary.total) as u8,
    };
    summary
}

pub fn summarize_projects(
    projects: &[Project],
    tickets: &[Ticket],
    now: Timestamp,
) -> Vec<ProjectSummary> {
    projects
        .iter()
        .map(|p| summarize_project(p, tickets, now))
        .collect()
}
