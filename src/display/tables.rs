use jiff::tz::TimeZone;
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::list::{ListViewModel, PageLink};
use crate::model::{Category, Project, User};
use crate::summary::ProjectSummary;
use crate::time::format_optional_date;

use super::{format_project_status, format_severity_colored, format_status_colored, truncate};

/// A row in the ticket list table
#[derive(Tabled)]
struct TicketRow {
    #[tabled(rename = "Ticket")]
    number: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Assigned")]
    assignee: String,
    #[tabled(rename = "Reporter")]
    reporter: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Created")]
    created: String,
}

/// Render one page of the list view, with sort indicators and pager.
pub fn render_ticket_list(vm: &ListViewModel, tz: &TimeZone) -> String {
    if vm.total == 0 {
        return "No tickets found.".to_string();
    }

    let rows: Vec<TicketRow> = vm
        .rows
        .iter()
        .map(|row| {
            let t = &row.ticket;
            TicketRow {
                number: t.display_no().to_string(),
                subject: truncate(&t.subject, 40),
                description: row.description_preview.clone(),
                category: t
                    .category
                    .as_ref()
                    .map(|c| c.label().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                severity: format_severity_colored(t.severity),
                status: format_status_colored(t.status),
                assignee: t
                    .assignee
                    .as_ref()
                    .map(|p| p.display_name().to_string())
                    .unwrap_or_else(|| "Unassigned".to_string()),
                reporter: t
                    .reporter
                    .as_ref()
                    .map(|p| p.display_name().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                priority: row.priority_label.clone(),
                created: format_optional_date(t.created_at, tz),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let sort_line = vm
        .headers
        .iter()
        .map(|h| format!("{} {}", h.title, h.indicator.symbol()))
        .collect::<Vec<_>>()
        .join("  ");

    let mut out = format!("{}\n{table}\n{}", sort_line.dimmed(), vm.footer());
    if !vm.pager.is_empty() {
        let pager = vm
            .pager
            .iter()
            .map(|link| match link {
                PageLink::Page(n) if *n == vm.page => format!("[{n}]").bold().to_string(),
                PageLink::Page(n) => n.to_string(),
                PageLink::Ellipsis => "...".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("\nPage {pager}"));
    }
    out
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Tickets")]
    tickets: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Ends")]
    ends: String,
}

/// Projects with their derived summaries, matched by position.
pub fn render_projects(projects: &[Project], summaries: &[ProjectSummary], tz: &TimeZone) -> String {
    if projects.is_empty() {
        return "No projects found.".to_string();
    }

    let rows: Vec<ProjectRow> = projects
        .iter()
        .zip(summaries)
        .map(|(p, s)| ProjectRow {
            code: p.code.clone().unwrap_or_else(|| "-".to_string()),
            name: p.name.clone(),
            status: format_project_status(p.status),
            client: p.client.clone().unwrap_or_else(|| "-".to_string()),
            tickets: format!("{}/{}", s.done(), s.total),
            progress: format!("{}%", s.progress),
            ends: match (p.end_date, s.overdue) {
                (Some(_), true) => format!("{} (overdue)", format_optional_date(p.end_date, tz))
                    .red()
                    .to_string(),
                (Some(_), false) => format!(
                    "{} ({}d)",
                    format_optional_date(p.end_date, tz),
                    s.days_remaining.unwrap_or_default()
                ),
                (None, _) => "-".to_string(),
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Scope")]
    scope: String,
}

pub fn render_categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }
    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.clone(),
            name: c.name.clone(),
            severity: format_severity_colored(c.severity),
            scope: c.scope.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
}

pub fn render_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }
    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone().unwrap_or_else(|| "-".to_string()),
            phone: u.phone.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::compute_list_view_model;
    use crate::model::Ticket;

    #[test]
    fn test_ticket_list_renders_rows_and_footer() {
        let mut ticket = Ticket::new("1", "VPN drops every hour");
        ticket.ticket_no = Some("SR7".to_string());
        let vm = compute_list_view_model(&[ticket], None, 1);
        let out = render_ticket_list(&vm, &TimeZone::UTC);
        assert!(out.contains("SR7"));
        assert!(out.contains("VPN drops every hour"));
        assert!(out.contains("Showing 1-1 of 1 tickets"));
    }

    #[test]
    fn test_empty_tables() {
        let vm = compute_list_view_model(&[], None, 1);
        assert_eq!(render_ticket_list(&vm, &TimeZone::UTC), "No tickets found.");
        assert_eq!(render_categories(&[]), "No categories found.");
        assert_eq!(render_users(&[]), "No users found.");
    }
}
