//! Paginated list view of tickets.

use serde::Serialize;

use crate::model::Ticket;
use crate::query::{SortDirection, SortField, SortSpec};

/// Rows per page.
pub const PAGE_SIZE: usize = 20;

/// Characters of description shown before truncation.
const DESCRIPTION_PREVIEW: usize = 30;

/// Sort state of a column heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortIndicator {
    Unsorted,
    Asc,
    Desc,
}

impl SortIndicator {
    pub fn for_field(sort: Option<SortSpec>, field: SortField) -> Self {
        match sort {
            Some(spec) if spec.field == field => match spec.direction {
                SortDirection::Asc => SortIndicator::Asc,
                SortDirection::Desc => SortIndicator::Desc,
            },
            _ => SortIndicator::Unsorted,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            SortIndicator::Unsorted => "⇅",
            SortIndicator::Asc => "↑",
            SortIndicator::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnHeader {
    pub field: SortField,
    pub title: &'static str,
    pub indicator: SortIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    pub ticket: Ticket,
    /// Description cut to a short preview, `-` when empty.
    pub description_preview: String,
    /// `7/10`, or `N/A/10` without a priority.
    pub priority_label: String,
}

impl ListRow {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            description_preview: preview(&ticket.description),
            priority_label: format!(
                "{}/10",
                ticket
                    .priority
                    .map(|p| p.value().to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            ),
            ticket,
        }
    }
}

fn preview(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "-".to_string();
    }
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(DESCRIPTION_PREVIEW).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// A page number or a gap in the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListViewModel {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<ListRow>,
    /// 1-based page shown.
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    /// 1-based index of the first row shown, 0 when empty.
    pub first: usize,
    pub last: usize,
    pub pager: Vec<PageLink>,
}

impl ListViewModel {
    /// `Showing 21-40 of 57 tickets`
    pub fn footer(&self) -> String {
        format!("Showing {}-{} of {} tickets", self.first, self.last, self.total)
    }
}

/// Build one page of the list. `tickets` is already filtered and sorted;
/// out-of-range pages are clamped.
pub fn compute_list_view_model(
    tickets: &[Ticket],
    sort: Option<SortSpec>,
    page: usize,
) -> ListViewModel {
    let total = tickets.len();
    let total_pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(total);

    ListViewModel {
        headers: SortField::ALL
            .iter()
            .map(|field| ColumnHeader {
                field: *field,
                title: field.title(),
                indicator: SortIndicator::for_field(sort, *field),
            })
            .collect(),
        rows: tickets[start..end].iter().cloned().map(ListRow::new).collect(),
        page,
        total_pages,
        total,
        first: if total == 0 { 0 } else { start + 1 },
        last: end,
        pager: pager(page, total_pages),
    }
}

/// First, last and neighbours of the current page, with gaps marked.
fn pager(current: usize, total_pages: usize) -> Vec<PageLink> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let mut links = Vec::new();
    for page in 1..=total_pages {
        if page == 1 || page == total_pages || page.abs_diff(current) <= 1 {
            links.push(PageLink::Page(page));
        } else if page.abs_diff(current) == 2 {
            links.push(PageLink::Ellipsis);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn tickets(n: usize) -> Vec<Ticket> {
        (1..=n)
            .map(|i| Ticket::new(i.to_string(), format!("Ticket {i}")))
            .collect()
    }

    #[test]
    fn test_pagination_and_footer() {
        let vm = compute_list_view_model(&tickets(45), None, 2);
        assert_eq!(vm.rows.len(), 20);
        assert_eq!(vm.total_pages, 3);
        assert_eq!(vm.footer(), "Showing 21-40 of 45 tickets");

        let last = compute_list_view_model(&tickets(45), None, 99);
        assert_eq!(last.page, 3);
        assert_eq!(last.rows.len(), 5);
    }

    #[test]
    fn test_empty_list() {
        let vm = compute_list_view_model(&[], None, 1);
        assert!(vm.rows.is_empty());
        assert_eq!(vm.footer(), "Showing 0-0 of 0 tickets");
        assert!(vm.pager.is_empty());
    }

    #[test]
    fn test_pager_ellipses() {
        assert_eq!(
            pager(5, 10),
            vec![
                PageLink::Page(1),
                PageLink::Ellipsis,
                PageLink::Page(4),
                PageLink::Page(5),
                PageLink::Page(6),
                PageLink::Ellipsis,
                PageLink::Page(10),
            ]
        );
    }

    #[test]
    fn test_sort_indicators() {
        let vm = compute_list_view_model(&[], Some(SortSpec::desc(SortField::Priority)), 1);
        let indicator = |field| {
            vm.headers
                .iter()
                .find(|h| h.field == field)
                .map(|h| h.indicator.symbol())
        };
        assert_eq!(indicator(SortField::Priority), Some("↓"));
        assert_eq!(indicator(SortField::Subject), Some("⇅"));
    }

    #[test]
    fn test_row_labels() {
        let mut ticket = Ticket::new("1", "x");
        ticket.description = "a".repeat(40);
        ticket.priority = Some(Priority::new(7).unwrap());
        let row = ListRow::new(ticket);
        assert_eq!(row.description_preview, format!("{}...", "a".repeat(30)));
        assert_eq!(row.priority_label, "7/10");
        assert_eq!(ListRow::new(Ticket::new("2", "y")).priority_label, "N/A/10");
        assert_eq!(ListRow::new(Ticket::new("2", "y")).description_preview, "-");
    }
}
