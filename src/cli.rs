use clap::{Args, Parser, Subcommand};
use jiff::civil::Date;
use std::path::PathBuf;
use std::str::FromStr;

use crate::commands::{ProjectOptions, TicketOptions};
use crate::query::{FilterSet, GroupMode, Scope, SortSpec, ViewControls};
use crate::time::parse_date;
use crate::types::{
    Priority, ProjectStatus, Severity, TicketStatus, UserType, VALID_SEVERITIES, VALID_STATUSES,
};

#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(about = "Service desk tickets, projects and boards from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        /// Email address
        email: String,

        /// Password (default: $TICKETDESK_PASSWORD, then stdin)
        #[arg(long)]
        password: Option<String>,

        /// Login endpoint: employee or tenant (default: from config)
        #[arg(long = "as", value_parser = parse_user_type)]
        user_type: Option<UserType>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out and forget the persisted session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change the signed-in user's password
    Passwd {
        /// Current password (default: $TICKETDESK_CURRENT_PASSWORD, then stdin)
        #[arg(long)]
        current: Option<String>,

        /// New password (default: $TICKETDESK_NEW_PASSWORD, then stdin)
        #[arg(long)]
        new: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tickets as a paginated table
    #[command(visible_alias = "l")]
    Ls {
        #[command(flatten)]
        view: ViewArgs,

        /// Let the server apply the status, priority, category, assignee,
        /// date and reference filters
        #[arg(long)]
        server: bool,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show tickets as a kanban board
    #[command(visible_alias = "b")]
    Board {
        #[command(flatten)]
        view: ViewArgs,

        /// Grouping: status, project, category (default: status)
        #[arg(short, long, default_value = "status", value_parser = parse_group)]
        group: GroupMode,

        /// Cards shown per column before "+N more" (0 shows all)
        #[arg(long, default_value_t = 0)]
        height: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display a ticket with its history and worknotes
    #[command(visible_alias = "s")]
    Show {
        /// Ticket id or number
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new ticket
    #[command(visible_alias = "c")]
    Create {
        /// Ticket subject
        subject: String,

        #[command(flatten)]
        fields: TicketFieldArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a ticket
    #[command(visible_alias = "u")]
    Update {
        /// Ticket id or number
        id: String,

        /// New subject
        #[arg(long)]
        subject: Option<String>,

        #[command(flatten)]
        fields: TicketFieldArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a ticket
    Delete {
        /// Ticket id or number
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a ticket to another status
    #[command(visible_alias = "mv")]
    Move {
        /// Ticket id or number
        id: String,

        /// Target status: OPEN, IN_PROGRESS, RESOLVED, CLOSED
        #[arg(value_parser = parse_status)]
        status: TicketStatus,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a worknote to a ticket
    Note {
        /// Ticket id or number
        id: String,

        /// Note text (provide as argument or pipe from stdin)
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload files and attach them to a ticket
    Attach {
        /// Ticket id or number
        id: String,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project management
    #[command(visible_alias = "p")]
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// List ticket categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List users
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Filter, search and sort controls shared by `ls` and `board`.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Only tickets assigned to me
    #[arg(long)]
    pub mine: bool,

    /// Search assignee and reporter names and emails
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Filter by status
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TicketStatus>,

    /// Filter by exact priority (0-10)
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// Filter by category id
    #[arg(long)]
    pub category: Option<String>,

    /// Filter by assignee user id
    #[arg(long)]
    pub assignee: Option<String>,

    /// Tickets on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub from: Option<Date>,

    /// Tickets on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub to: Option<Date>,

    /// Ticket number or order id contains this text
    #[arg(long = "ref")]
    pub ticket_ref: Option<String>,

    /// Sort as field[:asc|desc]; fields: ticketNo, subject, status,
    /// priority, severity, createdAt
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortSpec>,
}

impl ViewArgs {
    pub fn to_controls(&self, group: GroupMode) -> ViewControls {
        ViewControls {
            scope: if self.mine { Scope::My } else { Scope::All },
            text: self.search.clone().unwrap_or_default(),
            filters: FilterSet {
                status: self.status,
                priority: self.priority,
                category: self.category.clone(),
                assignee: self.assignee.clone(),
                date_from: self.from,
                date_to: self.to,
                ticket_ref: self.ticket_ref.clone(),
            },
            sort: self.sort,
            group,
        }
    }
}

/// Ticket fields shared by `create` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct TicketFieldArgs {
    /// Description text
    #[arg(short, long)]
    pub description: Option<String>,

    /// Category id or name
    #[arg(long)]
    pub category: Option<String>,

    /// Project id, code or name
    #[arg(long)]
    pub project: Option<String>,

    /// Status: OPEN, IN_PROGRESS, RESOLVED, CLOSED
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TicketStatus>,

    /// Priority (0-10)
    #[arg(short, long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// Severity: Low, Medium, High, Critical
    #[arg(long, value_parser = parse_severity)]
    pub severity: Option<Severity>,

    /// Assignee user id, email or name
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Reported-to user id, email or name
    #[arg(long)]
    pub reported_to: Option<String>,

    /// Start date/time in local time (YYYY-MM-DDTHH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// End date/time in local time (YYYY-MM-DDTHH:MM)
    #[arg(long)]
    pub end: Option<String>,

    /// Free-form scope
    #[arg(long)]
    pub scope: Option<String>,

    /// Mark as escalated (true or false)
    #[arg(long, value_parser = parse_bool_strict)]
    pub escalated: Option<bool>,

    /// Files to upload and attach
    #[arg(long = "attach")]
    pub files: Vec<PathBuf>,
}

impl TicketFieldArgs {
    pub fn into_options(self, subject: Option<String>) -> TicketOptions {
        TicketOptions {
            subject,
            description: self.description,
            category: self.category,
            project: self.project,
            status: self.status,
            priority: self.priority,
            severity: self.severity,
            assignee: self.assignee,
            reported_to: self.reported_to,
            start: self.start,
            end: self.end,
            scope: self.scope,
            escalated: self.escalated,
            files: self.files,
        }
    }
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List projects with progress
    Ls {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one project
    Show {
        /// Project id, code or name
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a project
    Create {
        /// Project name
        name: String,
        #[command(flatten)]
        fields: ProjectFieldArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a project
    Update {
        /// Project id, code or name
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ProjectFieldArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a project
    Delete {
        /// Project id, code or name
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Project fields shared by `project create` and `project update`.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectFieldArgs {
    /// Short project code
    #[arg(long)]
    pub code: Option<String>,

    /// Description text
    #[arg(short, long)]
    pub description: Option<String>,

    /// Status: ACTIVE, COMPLETED, ON HOLD, DRAFT
    #[arg(long, value_parser = parse_project_status)]
    pub status: Option<ProjectStatus>,

    /// Client name
    #[arg(long)]
    pub client: Option<String>,

    /// Owner user id
    #[arg(long)]
    pub owner: Option<String>,

    /// Category id
    #[arg(long)]
    pub category: Option<String>,

    /// Start date/time in local time (YYYY-MM-DDTHH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// End date/time in local time (YYYY-MM-DDTHH:MM)
    #[arg(long)]
    pub end: Option<String>,
}

impl ProjectFieldArgs {
    pub fn into_options(self, name: Option<String>) -> ProjectOptions {
        ProjectOptions {
            name,
            code: self.code,
            description: self.description,
            status: self.status,
            client: self.client,
            owner: self.owner,
            category: self.category,
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (identity_url, service_url, api_key, timezone,
        /// user_type, request_timeout)
        key: String,
        /// Value to set
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Generic validation helper for parsing values with a standard error message format.
fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> Result<T, String>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_status(s: &str) -> Result<TicketStatus, String> {
    parse_with_validation(
        s,
        |v| TicketStatus::from_str(v).map_err(|_| String::new()),
        "status",
        VALID_STATUSES,
    )
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    parse_with_validation(
        s,
        |v| Severity::from_str(v).map_err(|_| String::new()),
        "severity",
        VALID_SEVERITIES,
    )
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(s).map_err(|e| e.to_string())
}

fn parse_project_status(s: &str) -> Result<ProjectStatus, String> {
    parse_with_validation(
        s,
        |v| ProjectStatus::from_str(v).map_err(|_| String::new()),
        "project status",
        &["ACTIVE", "COMPLETED", "ON HOLD", "DRAFT"],
    )
}

fn parse_user_type(s: &str) -> Result<UserType, String> {
    parse_with_validation(
        s,
        |v| UserType::from_str(v).map_err(|_| String::new()),
        "user type",
        &["employee", "tenant"],
    )
}

fn parse_group(s: &str) -> Result<GroupMode, String> {
    parse_with_validation(
        s,
        |v| GroupMode::from_str(v).map_err(|_| String::new()),
        "grouping",
        &["status", "project", "category"],
    )
}

fn parse_sort(s: &str) -> Result<SortSpec, String> {
    SortSpec::from_str(s).map_err(|e| e.to_string())
}

fn parse_day(s: &str) -> Result<Date, String> {
    parse_date(s).map_err(|e| e.to_string())
}

/// Strict boolean parser that only accepts "true" or "false" (case-insensitive).
fn parse_bool_strict(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!(
            "Invalid value '{s}'. Must be 'true' or 'false' (case-insensitive)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SortDirection, SortField};
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bool_strict() {
        assert_eq!(parse_bool_strict("True"), Ok(true));
        assert_eq!(parse_bool_strict("FALSE"), Ok(false));
        let err = parse_bool_strict("yes").unwrap_err();
        assert!(err.contains("yes"));
        assert!(err.contains("true") && err.contains("false"));
    }

    #[test]
    fn test_parse_status_lists_valid_values() {
        assert_eq!(parse_status("in_progress"), Ok(TicketStatus::InProgress));
        let err = parse_status("done").unwrap_err();
        assert!(err.contains("OPEN") && err.contains("CLOSED"));
    }

    #[test]
    fn test_parse_priority_range() {
        assert_eq!(parse_priority("7").map(|p| p.value()), Ok(7));
        assert!(parse_priority("11").is_err());
        assert!(parse_priority("high").is_err());
    }

    #[test]
    fn test_view_args_to_controls() {
        let cli = Cli::parse_from([
            "ticketdesk",
            "ls",
            "--mine",
            "-q",
            "chen",
            "--status",
            "open",
            "--from",
            "2024-03-01",
            "--sort",
            "priority:desc",
        ]);
        let Commands::Ls { view, page, .. } = cli.command else {
            panic!("expected ls");
        };
        let controls = view.to_controls(GroupMode::Status);

        assert_eq!(page, 1);
        assert_eq!(controls.scope, Scope::My);
        assert_eq!(controls.text, "chen");
        assert_eq!(controls.filters.status, Some(TicketStatus::Open));
        assert_eq!(
            controls.filters.date_from,
            Some(jiff::civil::date(2024, 3, 1))
        );
        assert_eq!(
            controls.sort,
            Some(SortSpec::new(SortField::Priority, SortDirection::Desc))
        );
    }

    #[test]
    fn test_update_fields_leave_unset_as_none() {
        let cli = Cli::parse_from(["ticketdesk", "update", "T-1", "--severity", "high"]);
        let Commands::Update { id, subject, fields, .. } = cli.command else {
            panic!("expected update");
        };
        let options = fields.into_options(subject);
        assert_eq!(id, "T-1");
        assert_eq!(options.severity, Some(Severity::High));
        assert!(options.subject.is_none());
        assert!(options.priority.is_none());
        assert!(options.files.is_empty());
    }
}
