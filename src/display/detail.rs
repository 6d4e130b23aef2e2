use jiff::tz::TimeZone;
use owo_colors::OwoColorize;

use crate::model::{PersonRef, Project, Ticket, Worknote};
use crate::summary::ProjectSummary;
use crate::time::{format_display, format_optional_date};

use super::{format_project_status, format_severity_colored, format_status_colored};

fn person(p: Option<&PersonRef>) -> String {
    p.map(|p| match &p.email {
        Some(email) if p.name.is_some() => format!("{} <{email}>", p.display_name()),
        _ => p.display_name().to_string(),
    })
    .unwrap_or_else(|| "-".to_string())
}

fn field(out: &mut String, label: &str, value: impl AsRef<str>) {
    out.push_str(&format!("{:>12}: {}\n", label.dimmed(), value.as_ref()));
}

/// Full ticket view: fields, attachments, change history and worknotes.
pub fn render_ticket_detail(ticket: &Ticket, worknotes: &[Worknote], tz: &TimeZone) -> String {
    let mut out = format!(
        "{} {} {}\n\n",
        ticket.display_no().cyan().bold(),
        format_status_colored(ticket.status),
        ticket.subject.bold()
    );

    field(&mut out, "Severity", format_severity_colored(ticket.severity));
    field(
        &mut out,
        "Priority",
        ticket
            .priority
            .map(|p| format!("{p}/10"))
            .unwrap_or_else(|| "N/A".to_string()),
    );
    if let Some(category) = &ticket.category {
        field(&mut out, "Category", category.label());
    }
    if let Some(project) = &ticket.project {
        field(&mut out, "Project", project.label());
    }
    field(&mut out, "Assignee", person(ticket.assignee.as_ref()));
    field(&mut out, "Reporter", person(ticket.reporter.as_ref()));
    if ticket.reported_to.is_some() {
        field(&mut out, "Reported to", person(ticket.reported_to.as_ref()));
    }
    if let Some(scope) = &ticket.scope {
        field(&mut out, "Scope", scope);
    }
    if let Some(order) = &ticket.order_id {
        field(&mut out, "Order", order);
    }
    if ticket.escalated {
        field(&mut out, "Escalated", "yes".red().to_string());
    }
    field(&mut out, "Start", format_optional_date(ticket.start_date, tz));
    field(&mut out, "End", format_optional_date(ticket.end_date, tz));
    if let Some(created) = ticket.created_at {
        field(&mut out, "Created", format_display(created, tz));
    }
    if let Some(updated) = ticket.updated_at {
        field(&mut out, "Updated", format_display(updated, tz));
    }

    if !ticket.description.trim().is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Description".bold(), ticket.description));
    }

    if !ticket.attachments.is_empty() {
        out.push_str(&format!("\n{}\n", "Attachments".bold()));
        for url in &ticket.attachments {
            out.push_str(&format!("  - {url}\n"));
        }
    }

    if !ticket.change_history.is_empty() {
        out.push_str(&format!("\n{}\n", "History".bold()));
        for entry in &ticket.change_history {
            let when = entry
                .at
                .map(|at| format_display(at, tz))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {} {} {}\n",
                when.dimmed(),
                person(entry.by.as_ref()).cyan(),
                entry.description
            ));
        }
    }

    out.push_str(&format!("\n{}\n", "Worknotes".bold()));
    if worknotes.is_empty() {
        out.push_str(&format!("  {}\n", "No worknotes yet.".dimmed()));
    }
    for note in worknotes {
        let when = note.at.map(|at| format_display(at, tz)).unwrap_or_default();
        out.push_str(&format!(
            "  {} {}\n    {}\n",
            note.author.display_name().cyan(),
            when.dimmed(),
            note.text
        ));
    }
    out
}

pub fn render_project_detail(project: &Project, summary: &ProjectSummary, tz: &TimeZone) -> String {
    let mut out = format!(
        "{} {}\n\n",
        project.name.bold(),
        format_project_status(project.status)
    );
    if let Some(code) = &project.code {
        field(&mut out, "Code", code);
    }
    if let Some(client) = &project.client {
        field(&mut out, "Client", client);
    }
    field(&mut out, "Owner", person(project.owner.as_ref()));
    field(&mut out, "Start", format_optional_date(project.start_date, tz));
    field(&mut out, "End", format_optional_date(project.end_date, tz));
    if let Some(days) = summary.days_remaining {
        let remaining = if summary.overdue {
            "overdue".red().to_string()
        } else {
            format!("{days} days")
        };
        field(&mut out, "Remaining", remaining);
    }
    field(&mut out, "Progress", format!("{}%", summary.progress));
    field(
        &mut out,
        "Tickets",
        format!(
            "{} total, {} open, {} in progress, {} resolved, {} closed",
            summary.total, summary.open, summary.in_progress, summary.resolved, summary.closed
        ),
    );
    if let Some(description) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str(&format!("\n{description}\n"));
    }
    out
}
