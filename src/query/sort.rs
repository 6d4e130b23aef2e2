//! Sort functions for tickets.
//!
//! Missing values (no ticket number, empty subject, no priority, ...) sort
//! after present ones in both directions. Equal keys fall back to ticket
//! number and then id, and descending order reverses that whole
//! comparison, so the two directions are exact mirrors whenever no values
//! are missing.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use unicase::UniCase;

use crate::error::DeskError;
use crate::model::Ticket;

/// Sort field for ticket listing and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    TicketNo,
    Subject,
    Status,
    Priority,
    Severity,
    CreatedAt,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::TicketNo,
        SortField::Subject,
        SortField::Status,
        SortField::Priority,
        SortField::Severity,
        SortField::CreatedAt,
    ];

    /// Column heading used by the list view.
    pub fn title(&self) -> &'static str {
        match self {
            SortField::TicketNo => "Ticket",
            SortField::Subject => "Subject",
            SortField::Status => "Status",
            SortField::Priority => "Priority",
            SortField::Severity => "Severity",
            SortField::CreatedAt => "Created",
        }
    }
}

enum_display_fromstr!(
    SortField,
    DeskError::InvalidSortField,
    {
        TicketNo => "ticketNo" | "ticket_no" | "ticket-no" | "ticket" | "number",
        Subject => "subject",
        Status => "status",
        Priority => "priority",
        Severity => "severity",
        CreatedAt => "createdAt" | "created_at" | "created-at" | "created",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

enum_display_fromstr!(
    SortDirection,
    DeskError::InvalidSortDirection,
    {
        Asc => "asc" | "ascending",
        Desc => "desc" | "descending",
    }
);

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// A sort field with direction, written `field[:asc|desc]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn asc(field: SortField) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: SortField) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Selecting the active field flips direction; a new field starts ascending.
    pub fn toggle(current: Option<SortSpec>, field: SortField) -> SortSpec {
        match current {
            Some(spec) if spec.field == field => SortSpec::new(field, spec.direction.reversed()),
            _ => SortSpec::asc(field),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

impl FromStr for SortSpec {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((field, direction)) => Ok(SortSpec::new(field.parse()?, direction.parse()?)),
            None => Ok(SortSpec::asc(s.parse()?)),
        }
    }
}

/// A comparable key extracted from one ticket for one field.
#[derive(Debug, Clone, Copy)]
enum SortKey<'a> {
    Text(&'a str),
    Rank(usize),
    Time(Timestamp),
}

fn compare_keys(a: SortKey<'_>, b: SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Text(x), SortKey::Text(y)) => compare_text(x, y),
        (SortKey::Rank(x), SortKey::Rank(y)) => x.cmp(&y),
        (SortKey::Time(x), SortKey::Time(y)) => x.cmp(&y),
        // Keys of one field always share a variant.
        _ => Ordering::Equal,
    }
}

/// Case-insensitive, with a case-sensitive fallback so the order is total.
fn compare_text(a: &str, b: &str) -> Ordering {
    UniCase::new(a).cmp(&UniCase::new(b)).then_with(|| a.cmp(b))
}

fn non_blank(s: &str) -> Option<&str> {
    if s.trim().is_empty() { None } else { Some(s) }
}

fn sort_key(ticket: &Ticket, field: SortField) -> Option<SortKey<'_>> {
    match field {
        SortField::TicketNo => ticket
            .ticket_no
            .as_deref()
            .and_then(non_blank)
            .map(SortKey::Text),
        SortField::Subject => non_blank(&ticket.subject).map(SortKey::Text),
        SortField::Status => Some(SortKey::Rank(ticket.status.index())),
        SortField::Priority => ticket.priority.map(|p| SortKey::Rank(p.value() as usize)),
        SortField::Severity => ticket.severity.map(|s| SortKey::Rank(s as usize)),
        SortField::CreatedAt => ticket.created_at.map(SortKey::Time),
    }
}

/// Final tie-break: ticket number (present first), then id.
fn tie_break(a: &Ticket, b: &Ticket) -> Ordering {
    let no_a = a.ticket_no.as_deref().and_then(non_blank);
    let no_b = b.ticket_no.as_deref().and_then(non_blank);
    let by_no = match (no_a, no_b) {
        (Some(x), Some(y)) => compare_text(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_no.then_with(|| a.id.cmp(&b.id))
}

/// Compare two tickets under a sort spec.
pub fn compare_tickets(a: &Ticket, b: &Ticket, spec: SortSpec) -> Ordering {
    match (sort_key(a, spec.field), sort_key(b, spec.field)) {
        (Some(ka), Some(kb)) => {
            let ord = compare_keys(ka, kb).then_with(|| tie_break(a, b));
            match spec.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => tie_break(a, b),
    }
}

/// Sort tickets in place. `None` keeps the current order.
pub fn sort_tickets(tickets: &mut [Ticket], spec: Option<SortSpec>) {
    if let Some(spec) = spec {
        tickets.sort_by(|a, b| compare_tickets(a, b, spec));
    }
}
