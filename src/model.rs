//! Canonical entity shapes.
//!
//! Every server response is normalized into these types by the gateway
//! (see `gateway::wire`), so nothing past the gateway boundary has to
//! care whether the server sent `id` or `_id`, a bare reference id or an
//! embedded object, or an attachment as a string or as `{url}`.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::types::{Priority, ProjectStatus, Severity, TicketId, TicketStatus};

/// Reference to a project or category, optionally carrying its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// Name if known, otherwise the raw id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Reference to a person (assignee, reporter, author).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

impl PersonRef {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Unknown")
    }
}

/// A freeform note on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worknote {
    pub author: PersonRef,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<Timestamp>,
}

/// A server-recorded change on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<PersonRef>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<PersonRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<PersonRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_to: Option<PersonRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_history: Vec<ChangeEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub worknotes: Vec<Worknote>,
    #[serde(default)]
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl Ticket {
    /// A ticket with only identity, subject and default status set.
    pub fn new(id: impl Into<TicketId>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ticket_no: None,
            order_id: None,
            subject: subject.into(),
            description: String::new(),
            status: TicketStatus::default(),
            severity: None,
            priority: None,
            category: None,
            project: None,
            assignee: None,
            reporter: None,
            reported_to: None,
            start_date: None,
            end_date: None,
            created_at: None,
            updated_at: None,
            attachments: Vec::new(),
            change_history: Vec::new(),
            worknotes: Vec::new(),
            escalated: false,
            scope: None,
            tenant: None,
        }
    }

    /// Ticket number for display, falling back to the server id.
    pub fn display_no(&self) -> &str {
        self.ticket_no.as_deref().unwrap_or(self.id.as_str())
    }

    /// Date used for range filtering: creation time, else start date.
    pub fn reference_date(&self) -> Option<Timestamp> {
        self.created_at.or(self.start_date)
    }

    pub fn assignee_id(&self) -> Option<&str> {
        self.assignee.as_ref().and_then(|a| a.id.as_deref())
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.id.as_str())
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<PersonRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    /// Progress percentage as reported by the server, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Task count as reported by the server, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_count: Option<u32>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: None,
            description: None,
            status: ProjectStatus::default(),
            client: None,
            owner: None,
            category: None,
            start_date: None,
            end_date: None,
            progress: None,
            task_count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    pub fn to_person(&self) -> PersonRef {
        PersonRef {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            email: self.email.clone(),
            phone: self.phone.clone(),
            user_type: None,
        }
    }
}

/// The signed-in user as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Server-side user category (e.g. INSPECTOR, TENANT).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CurrentUser {
    /// The user as an author/reporter reference.
    pub fn to_person(&self) -> PersonRef {
        PersonRef {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            email: self.email.clone(),
            phone: self.phone.clone(),
            user_type: self.category.clone(),
        }
    }
}
