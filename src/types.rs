use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use crate::error::DeskError;

/// Name of the configuration directory under the platform config root.
pub const APP_DIR: &str = "ticketdesk";

/// Server-assigned ticket identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for TicketId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TicketId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Ticket workflow status, in board column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

enum_display_fromstr!(
    TicketStatus,
    DeskError::InvalidStatus,
    {
        Open => "OPEN",
        InProgress => "IN_PROGRESS" | "in-progress" | "in progress" | "inprogress",
        Resolved => "RESOLVED",
        Closed => "CLOSED",
    }
);

impl TicketStatus {
    /// All statuses in their fixed board order.
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    /// Human-readable column title.
    pub fn title(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Position in the fixed workflow order.
    pub fn index(&self) -> usize {
        match self {
            TicketStatus::Open => 0,
            TicketStatus::InProgress => 1,
            TicketStatus::Resolved => 2,
            TicketStatus::Closed => 3,
        }
    }

    pub fn next(&self) -> Option<TicketStatus> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(&self) -> Option<TicketStatus> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

pub const VALID_STATUSES: &[&str] = &["OPEN", "IN_PROGRESS", "RESOLVED", "CLOSED"];

/// Ticket severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

enum_display_fromstr!(
    Severity,
    DeskError::InvalidSeverity,
    {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Critical => "Critical",
    }
);

pub const VALID_SEVERITIES: &[&str] = &["Low", "Medium", "High", "Critical"];

/// Numeric ticket priority in the range 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MAX: u8 = 10;

    /// Priority used when a new ticket does not specify one.
    pub const DEFAULT: Priority = Priority(5);

    pub fn new(value: u8) -> Result<Self, DeskError> {
        if value > Self::MAX {
            return Err(DeskError::InvalidPriority(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Priority {
    type Error = DeskError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Priority::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Priority {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| DeskError::InvalidPriority(s.to_string()))?;
        Priority::new(value)
    }
}

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "ON HOLD")]
    OnHold,
    #[serde(rename = "DRAFT")]
    Draft,
}

enum_display_fromstr!(
    ProjectStatus,
    DeskError::InvalidProjectStatus,
    {
        Active => "ACTIVE",
        Completed => "COMPLETED",
        OnHold => "ON HOLD" | "on_hold" | "on-hold" | "onhold",
        Draft => "DRAFT",
    }
);

/// Which login endpoint a user authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Employee,
    Tenant,
}

enum_display_fromstr!(
    UserType,
    DeskError::InvalidUserType,
    {
        Employee => "employee",
        Tenant => "tenant",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_accepts_api_and_cli_forms() {
        assert_eq!("OPEN".parse::<TicketStatus>().unwrap(), TicketStatus::Open);
        assert_eq!(
            "in_progress".parse::<TicketStatus>().unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!(
            "in-progress".parse::<TicketStatus>().unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!(
            "Resolved".parse::<TicketStatus>().unwrap(),
            TicketStatus::Resolved
        );
        assert!("done".parse::<TicketStatus>().is_err());
        assert!("".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_as_api_value() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert_eq!(TicketStatus::InProgress.to_string(), "IN_PROGRESS");
    }

    #[test]
    fn test_status_neighbours() {
        assert_eq!(TicketStatus::Open.next(), Some(TicketStatus::InProgress));
        assert_eq!(TicketStatus::Closed.next(), None);
        assert_eq!(TicketStatus::Open.prev(), None);
        assert_eq!(TicketStatus::Closed.prev(), Some(TicketStatus::Resolved));
    }

    #[test]
    fn test_priority_bounds() {
        assert!(Priority::new(0).is_ok());
        assert!(Priority::new(10).is_ok());
        assert!(Priority::new(11).is_err());
        assert!("abc".parse::<Priority>().is_err());
        assert_eq!("7".parse::<Priority>().unwrap().value(), 7);
        assert_eq!(Priority::default().value(), 5);
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
    }

    #[test]
    fn test_project_status_with_space() {
        assert_eq!(
            "on hold".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::OnHold
        );
        assert_eq!(ProjectStatus::OnHold.to_string(), "ON HOLD");
        let json = serde_json::to_string(&ProjectStatus::OnHold).unwrap();
        assert_eq!(json, "\"ON HOLD\"");
    }
}
