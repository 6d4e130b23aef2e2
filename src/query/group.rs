//! Grouping of filtered tickets into board columns.

use serde::{Deserialize, Serialize};

use crate::error::DeskError;
use crate::model::{Category, EntityRef, Project, Ticket};
use crate::types::TicketStatus;

pub const NO_PROJECT: &str = "No Project";
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    #[default]
    Status,
    Project,
    Category,
}

enum_display_fromstr!(
    GroupMode,
    DeskError::InvalidGroupMode,
    {
        Status => "status",
        Project => "project" | "projects",
        Category => "category" | "categories",
    }
);

/// Identity of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum GroupKey {
    Status(TicketStatus),
    Project(String),
    Category(String),
    /// Tickets with no project.
    NoProject,
    /// Tickets with no category.
    Uncategorized,
}

impl GroupKey {
    /// The status a card dropped on this group would take, if any.
    pub fn status(&self) -> Option<TicketStatus> {
        match self {
            GroupKey::Status(status) => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketGroup {
    pub key: GroupKey,
    pub title: String,
    pub tickets: Vec<Ticket>,
}

/// Reference entities used to order and title project/category groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupRefs<'a> {
    pub projects: &'a [Project],
    pub categories: &'a [Category],
}

/// Split `tickets` into groups, preserving their order within each group.
///
/// Status grouping always yields the four status columns. Project and
/// category grouping yield the reference entities first (in reference
/// order, even when empty), then entities only seen on tickets (in order of
/// first appearance), then the unassigned bucket if it has any tickets.
pub fn group_tickets(tickets: &[Ticket], mode: GroupMode, refs: GroupRefs<'_>) -> Vec<TicketGroup> {
    match mode {
        GroupMode::Status => TicketStatus::ALL
            .iter()
            .map(|status| TicketGroup {
                key: GroupKey::Status(*status),
                title: status.title().to_string(),
                tickets: tickets
                    .iter()
                    .filter(|t| t.status == *status)
                    .cloned()
                    .collect(),
            })
            .collect(),
        GroupMode::Project => group_by_entity(
            tickets,
            refs.projects.iter().map(|p| (p.id.as_str(), p.name.as_str())),
            |t| t.project.as_ref(),
            GroupKey::Project,
            GroupKey::NoProject,
            NO_PROJECT,
        ),
        GroupMode::Category => group_by_entity(
            tickets,
            refs.categories.iter().map(|c| (c.id.as_str(), c.name.as_str())),
            |t| t.category.as_ref(),
            GroupKey::Category,
            GroupKey::Uncategorized,
            UNCATEGORIZED,
        ),
    }
}

fn group_by_entity<'a>(
    tickets: &[Ticket],
    configured: impl Iterator<Item = (&'a str, &'a str)>,
    entity_of: impl Fn(&Ticket) -> Option<&EntityRef>,
    make_key: impl Fn(String) -> GroupKey,
    unassigned_key: GroupKey,
    unassigned_title: &str,
) -> Vec<TicketGroup> {
    let mut groups: Vec<(String, TicketGroup)> = Vec::new();

    for (id, name) in configured {
        if groups.iter().any(|(existing, _)| existing == id) {
            continue;
        }
        groups.push((
            id.to_string(),
            TicketGroup {
                key: make_key(id.to_string()),
                title: name.to_string(),
                tickets: Vec::new(),
            },
        ));
    }

    let mut unassigned = Vec::new();
    for ticket in tickets {
        let Some(entity) = entity_of(ticket) else {
            unassigned.push(ticket.clone());
            continue;
        };
        match groups.iter_mut().find(|(id, _)| *id == entity.id) {
            Some((_, group)) => group.tickets.push(ticket.clone()),
            None => groups.push((
                entity.id.clone(),
                TicketGroup {
                    key: make_key(entity.id.clone()),
                    title: entity.label().to_string(),
                    tickets: vec![ticket.clone()],
                },
            )),
        }
    }

    let mut result: Vec<TicketGroup> = groups.into_iter().map(|(_, g)| g).collect();
    if !unassigned.is_empty() {
        result.push(TicketGroup {
            key: unassigned_key,
            title: unassigned_title.to_string(),
            tickets: unassigned,
        });
    }
    result
}
