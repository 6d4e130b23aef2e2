//! Query builder pattern for filtering tickets.
//!
//! Filters are small trait objects composed with AND semantics by
//! [`TicketQueryBuilder`]. [`build_view`] runs the full pipeline used by the
//! board and list views: filter, then sort, then group.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use crate::error::DeskError;
use crate::gateway::ServerFilterPayload;
use crate::model::{PersonRef, Ticket};
use crate::time::local_date;
use crate::types::{Priority, TicketStatus};

pub mod group;
pub mod sort;

pub use group::{GroupKey, GroupMode, GroupRefs, TicketGroup, group_tickets};
pub use sort::{SortDirection, SortField, SortSpec, compare_tickets, sort_tickets};

/// Context passed to filters containing shared state
#[derive(Debug, Clone)]
pub struct FilterContext {
    /// Id of the signed-in user, for the "my tickets" scope.
    pub current_user_id: Option<String>,
    /// Timezone used to turn timestamps into calendar dates.
    pub tz: TimeZone,
}

impl FilterContext {
    pub fn new(current_user_id: Option<String>, tz: TimeZone) -> Self {
        Self {
            current_user_id,
            tz,
        }
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new(None, TimeZone::UTC)
    }
}

/// Trait for ticket filters
pub trait TicketFilter: Send + Sync {
    fn matches(&self, ticket: &Ticket, context: &FilterContext) -> bool;
}

/// Which tickets a view starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    My,
}

enum_display_fromstr!(
    Scope,
    DeskError::InvalidScope,
    {
        All => "all",
        My => "my" | "mine",
    }
);

/// Only tickets assigned to the current user. Matches nothing when nobody
/// is signed in.
pub struct MyTicketsFilter;

impl TicketFilter for MyTicketsFilter {
    fn matches(&self, ticket: &Ticket, context: &FilterContext) -> bool {
        match (&context.current_user_id, ticket.assignee_id()) {
            (Some(me), Some(assignee)) => me == assignee,
            _ => false,
        }
    }
}

/// Case-insensitive substring search over assignee and reporter name/email.
pub struct TextFilter {
    needle: String,
}

impl TextFilter {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
        }
    }
}

fn person_matches(person: Option<&PersonRef>, needle: &str) -> bool {
    person.is_some_and(|p| {
        [p.name.as_deref(), p.email.as_deref()]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(needle))
    })
}

impl TicketFilter for TextFilter {
    fn matches(&self, ticket: &Ticket, _context: &FilterContext) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        person_matches(ticket.assignee.as_ref(), &self.needle)
            || person_matches(ticket.reporter.as_ref(), &self.needle)
    }
}

/// Filter tickets by status
pub struct StatusFilter {
    target_status: TicketStatus,
}

impl StatusFilter {
    pub fn new(status: TicketStatus) -> Self {
        Self {
            target_status: status,
        }
    }
}

impl TicketFilter for StatusFilter {
    fn matches(&self, ticket: &Ticket, _context: &FilterContext) -> bool {
        ticket.status == self.target_status
    }
}

/// Exact priority match. Tickets without a priority never match.
pub struct PriorityFilter {
    priority: Priority,
}

impl PriorityFilter {
    pub fn new(priority: Priority) -> Self {
        Self { priority }
    }
}

impl TicketFilter for PriorityFilter {
    fn matches(&self, ticket: &Ticket, _context: &FilterContext) -> bool {
        ticket.priority == Some(self.priority)
    }
}

/// Exact category id match.
pub struct CategoryFilter {
    category_id: String,
}

impl CategoryFilter {
    pub fn new(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
        }
    }
}

impl TicketFilter for CategoryFilter {
    fn matches(&self, ticket: &Ticket, _context: &FilterContext) -> bool {
        ticket.category_id() == Some(self.category_id.as_str())
    }
}

/// Exact assignee id match.
pub struct AssigneeFilter {
    assignee_id: String,
}

impl AssigneeFilter {
    pub fn new(assignee_id: impl Into<String>) -> Self {
        Self {
            assignee_id: assignee_id.into(),
        }
    }
}

impl TicketFilter for AssigneeFilter {
    fn matches(&self, ticket: &Ticket, _context: &FilterContext) -> bool {
        ticket.assignee_id() == Some(self.assignee_id.as_str())
    }
}

/// Inclusive calendar-date range over the ticket's reference date
/// (`created_at`, else `start_date`), evaluated in the context timezone.
/// Tickets with no reference date are excluded.
pub struct DateRangeFilter {
    from: Option<Date>,
    to: Option<Date>,
}

impl DateRangeFilter {
    pub fn new(from: Option<Date>, to: Option<Date>) -> Self {
        Self { from, to }
    }
}

impl TicketFilter for DateRangeFilter {
    fn matches(&self, ticket: &Ticket, context: &FilterContext) -> bool {
        let Some(ts) = ticket.reference_date() else {
            return false;
        };
        let date = local_date(ts, &context.tz);
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Case-insensitive substring over ticket number or order id.
pub struct TicketRefFilter {
    needle: String,
}

impl TicketRefFilter {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.trim().to_lowercase(),
        }
    }
}

impl TicketFilter for TicketRefFilter {
    fn matches(&self, ticket: &Ticket, _context: &FilterContext) -> bool {
        [ticket.ticket_no.as_deref(), ticket.order_id.as_deref()]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&self.needle))
    }
}

/// Structured filter fields. Unset fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub assignee: Option<String>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub ticket_ref: Option<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }

    /// Body for the server-side filter endpoint. The reporter defaults to
    /// the current user, as the endpoint expects.
    pub fn to_server_payload(&self, current_user_id: Option<&str>) -> ServerFilterPayload {
        let date = |d: Option<Date>| d.map(|d| d.to_string()).unwrap_or_default();
        ServerFilterPayload {
            status: self.status.map(|s| s.to_string()).unwrap_or_default(),
            priority: self.priority,
            category: self.category.clone().unwrap_or_default(),
            from_date: date(self.date_from),
            to_date: date(self.date_to),
            reported_by: current_user_id.unwrap_or_default().to_string(),
            assign_to: self.assignee.clone().unwrap_or_default(),
            order_id: self.ticket_ref.clone().unwrap_or_default(),
        }
    }
}

/// Everything a view needs to derive its visible tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewControls {
    pub scope: Scope,
    pub text: String,
    pub filters: FilterSet,
    pub sort: Option<SortSpec>,
    pub group: GroupMode,
}

/// An executed query configuration that can be applied to ticket data.
pub struct TicketQuery {
    filters: Vec<Box<dyn TicketFilter>>,
    sort: Option<SortSpec>,
}

impl TicketQuery {
    /// Filter then sort. Input order is kept when no sort is set.
    pub fn apply(&self, tickets: &[Ticket], context: &FilterContext) -> Vec<Ticket> {
        let mut filtered: Vec<Ticket> = tickets
            .iter()
            .filter(|t| self.filters.iter().all(|f| f.matches(t, context)))
            .cloned()
            .collect();
        sort_tickets(&mut filtered, self.sort);
        filtered
    }
}

/// Query builder for filtering and sorting tickets
#[derive(Default)]
pub struct TicketQueryBuilder {
    filters: Vec<Box<dyn TicketFilter>>,
    sort: Option<SortSpec>,
}

impl TicketQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter to the query (AND composition)
    pub fn with_filter(mut self, filter: Box<dyn TicketFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_scope(self, scope: Scope) -> Self {
        match scope {
            Scope::All => self,
            Scope::My => self.with_filter(Box::new(MyTicketsFilter)),
        }
    }

    pub fn with_text(self, query: &str) -> Self {
        if query.trim().is_empty() {
            self
        } else {
            self.with_filter(Box::new(TextFilter::new(query)))
        }
    }

    /// Add one filter per set field of `set`.
    pub fn with_filter_set(mut self, set: &FilterSet) -> Self {
        if let Some(status) = set.status {
            self = self.with_filter(Box::new(StatusFilter::new(status)));
        }
        if let Some(priority) = set.priority {
            self = self.with_filter(Box::new(PriorityFilter::new(priority)));
        }
        if let Some(category) = set.category.as_deref().filter(|c| !c.is_empty()) {
            self = self.with_filter(Box::new(CategoryFilter::new(category)));
        }
        if let Some(assignee) = set.assignee.as_deref().filter(|a| !a.is_empty()) {
            self = self.with_filter(Box::new(AssigneeFilter::new(assignee)));
        }
        if set.date_from.is_some() || set.date_to.is_some() {
            self = self.with_filter(Box::new(DateRangeFilter::new(set.date_from, set.date_to)));
        }
        if let Some(needle) = set.ticket_ref.as_deref().filter(|n| !n.trim().is_empty()) {
            self = self.with_filter(Box::new(TicketRefFilter::new(needle)));
        }
        self
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    /// Builder for everything in `controls` except grouping.
    pub fn from_controls(controls: &ViewControls) -> Self {
        Self::new()
            .with_scope(controls.scope)
            .with_text(&controls.text)
            .with_filter_set(&controls.filters)
            .with_sort(controls.sort)
    }

    pub fn build(self) -> TicketQuery {
        TicketQuery {
            filters: self.filters,
            sort: self.sort,
        }
    }
}

/// Filter and sort according to `controls`.
pub fn filter_and_sort(
    tickets: &[Ticket],
    controls: &ViewControls,
    context: &FilterContext,
) -> Vec<Ticket> {
    TicketQueryBuilder::from_controls(controls)
        .build()
        .apply(tickets, context)
}

/// Filter, sort and group according to `controls`.
pub fn build_view(
    tickets: &[Ticket],
    controls: &ViewControls,
    context: &FilterContext,
    refs: GroupRefs<'_>,
) -> Vec<TicketGroup> {
    let visible = filter_and_sort(tickets, controls, context);
    group_tickets(&visible, controls.group, refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityRef;

    fn person(id: &str, name: &str, email: &str) -> PersonRef {
        PersonRef {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_my_scope() {
        let mut mine = Ticket::new("1", "mine");
        mine.assignee = Some(person("u1", "Me", "me@x.io"));
        let theirs = Ticket::new("2", "unassigned");

        let context = FilterContext::new(Some("u1".to_string()), TimeZone::UTC);
        let result = TicketQueryBuilder::new()
            .with_scope(Scope::My)
            .build()
            .apply(&[mine, theirs.clone()], &context);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_str(), "1");

        let anonymous = FilterContext::default();
        assert!(!MyTicketsFilter.matches(&theirs, &anonymous));
    }

    #[test]
    fn test_text_matches_reporter_email() {
        let mut t = Ticket::new("1", "x");
        t.reporter = Some(person("u2", "Ajay", "AJAY@Example.com"));
        let filter = TextFilter::new("ajay@example");
        assert!(filter.matches(&t, &FilterContext::default()));
        assert!(!TextFilter::new("zed").matches(&t, &FilterContext::default()));
    }

    #[test]
    fn test_date_range_uses_local_calendar_date() {
        let mut t = Ticket::new("1", "x");
        // 20:00 UTC on the 10th is already the 11th in Kolkata.
        t.created_at = Some("2024-03-10T20:00:00Z".parse().unwrap());
        let from: Date = "2024-03-11".parse().unwrap();
        let filter = DateRangeFilter::new(Some(from), Some(from));

        let utc = FilterContext::default();
        let kolkata = FilterContext::new(None, TimeZone::get("Asia/Kolkata").unwrap());
        assert!(!filter.matches(&t, &utc));
        assert!(filter.matches(&t, &kolkata));
    }

    #[test]
    fn test_date_range_falls_back_to_start_and_excludes_undated() {
        let mut started = Ticket::new("1", "x");
        started.start_date = Some("2024-01-05T10:00:00Z".parse().unwrap());
        let undated = Ticket::new("2", "y");
        let filter = DateRangeFilter::new(Some("2024-01-01".parse().unwrap()), None);
        let context = FilterContext::default();
        assert!(filter.matches(&started, &context));
        assert!(!filter.matches(&undated, &context));
    }

    #[test]
    fn test_ticket_ref_matches_number_or_order() {
        let mut t = Ticket::new("1", "x");
        t.ticket_no = Some("SR20451".to_string());
        t.order_id = Some("ORD-77".to_string());
        let context = FilterContext::default();
        assert!(TicketRefFilter::new("sr204").matches(&t, &context));
        assert!(TicketRefFilter::new("ord-7").matches(&t, &context));
        assert!(!TicketRefFilter::new("999").matches(&t, &context));
    }

    #[test]
    fn test_category_and_assignee_are_exact() {
        let mut t = Ticket::new("1", "x");
        t.category = Some(EntityRef::new("cat-10"));
        t.assignee = Some(person("u10", "A", "a@x.io"));
        let context = FilterContext::default();
        assert!(CategoryFilter::new("cat-10").matches(&t, &context));
        assert!(!CategoryFilter::new("cat-1").matches(&t, &context));
        assert!(AssigneeFilter::new("u10").matches(&t, &context));
        assert!(!AssigneeFilter::new("u1").matches(&t, &context));
    }

    #[test]
    fn test_filter_set_server_payload() {
        let set = FilterSet {
            status: Some(TicketStatus::InProgress),
            date_from: Some("2024-01-01".parse().unwrap()),
            ..Default::default()
        };
        let payload = set.to_server_payload(Some("u1"));
        assert_eq!(payload.status, "IN_PROGRESS");
        assert_eq!(payload.from_date, "2024-01-01");
        assert_eq!(payload.to_date, "");
        assert_eq!(payload.reported_by, "u1");
        assert!(FilterSet::default().is_empty());
        assert!(!set.is_empty());
    }
}
