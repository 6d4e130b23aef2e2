//! Mock data builders for creating test tickets and other entities.

use jiff::Timestamp;

use ticketdesk::model::{Category, EntityRef, PersonRef, Project, Ticket};
use ticketdesk::types::{Priority, Severity, TicketStatus};

/// Builder for creating test tickets
pub struct TicketBuilder {
    ticket: Ticket,
}

impl TicketBuilder {
    /// Create a new ticket builder with the given ID
    pub fn new(id: &str) -> Self {
        let mut ticket = Ticket::new(id, format!("Ticket {id}"));
        ticket.ticket_no = Some(format!("TCK-{id}"));
        ticket.created_at = Some(
            "2024-01-01T00:00:00Z"
                .parse::<Timestamp>()
                .expect("test timestamp should be valid"),
        );
        Self { ticket }
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.ticket.subject = subject.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.ticket.description = description.to_string();
        self
    }

    pub fn status(mut self, status: TicketStatus) -> Self {
        self.ticket.status = status;
        self
    }

    pub fn priority(mut self, p: u8) -> Self {
        self.ticket.priority = Some(Priority::new(p).expect("test priority should be valid"));
        self
    }

    pub fn severity(mut self, s: Severity) -> Self {
        self.ticket.severity = Some(s);
        self
    }

    pub fn project(mut self, id: &str, name: &str) -> Self {
        self.ticket.project = Some(EntityRef::named(id, name));
        self
    }

    pub fn category(mut self, id: &str, name: &str) -> Self {
        self.ticket.category = Some(EntityRef::named(id, name));
        self
    }

    pub fn assignee(mut self, id: &str, name: &str) -> Self {
        self.ticket.assignee = Some(PersonRef {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        });
        self
    }

    /// Creation time as RFC 3339
    pub fn created(mut self, at: &str) -> Self {
        self.ticket.created_at = Some(at.parse().expect("test timestamp should be valid"));
        self
    }

    pub fn build(self) -> Ticket {
        self.ticket
    }
}

pub fn mock_ticket(id: &str, status: TicketStatus) -> Ticket {
    TicketBuilder::new(id).status(status).build()
}

pub fn mock_project(id: &str, name: &str) -> Project {
    Project::new(id, name)
}

pub fn mock_category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        severity: None,
        scope: None,
    }
}
