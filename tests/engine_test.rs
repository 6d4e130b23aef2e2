//! Filter, sort and group engine: scenario checks plus properties over
//! generated ticket lists.

mod common;

use jiff::tz::TimeZone;
use proptest::prelude::*;

use common::mock_data::{TicketBuilder, mock_project};
use ticketdesk::model::{PersonRef, Ticket};
use ticketdesk::query::{
    FilterContext, FilterSet, GroupKey, GroupMode, GroupRefs, Scope, SortDirection, SortField,
    SortSpec, ViewControls, build_view, filter_and_sort, group_tickets,
};
use ticketdesk::types::{Priority, TicketStatus};

fn context() -> FilterContext {
    FilterContext::new(Some("u1".to_string()), TimeZone::UTC)
}

fn no_refs() -> GroupRefs<'static> {
    GroupRefs {
        projects: &[],
        categories: &[],
    }
}

fn ids(tickets: &[Ticket]) -> Vec<&str> {
    tickets.iter().map(|t| t.id.as_str()).collect()
}

#[test]
fn test_open_status_and_priority_filter() {
    let tickets = vec![
        TicketBuilder::new("a").status(TicketStatus::Open).priority(7).build(),
        TicketBuilder::new("b").status(TicketStatus::Open).priority(3).build(),
        TicketBuilder::new("c").status(TicketStatus::Closed).priority(7).build(),
    ];
    let controls = ViewControls {
        filters: FilterSet {
            status: Some(TicketStatus::Open),
            priority: Some(Priority::new(7).unwrap()),
            ..Default::default()
        },
        ..Default::default()
    };

    let visible = filter_and_sort(&tickets, &controls, &context());
    assert_eq!(ids(&visible), vec!["a"]);
}

#[test]
fn test_text_query_matches_assignee_name() {
    let mut other = TicketBuilder::new("b").assignee("u2", "Ajay Sharma").build();
    other.reporter = Some(PersonRef {
        name: Some("Priya Nair".to_string()),
        ..Default::default()
    });
    let tickets = vec![
        TicketBuilder::new("a").assignee("u1", "Sarah Chen").build(),
        other,
    ];
    let controls = ViewControls {
        text: "chen".to_string(),
        ..Default::default()
    };

    let visible = filter_and_sort(&tickets, &controls, &context());
    assert_eq!(ids(&visible), vec!["a"]);
}

#[test]
fn test_my_scope_uses_current_user() {
    let tickets = vec![
        TicketBuilder::new("a").assignee("u1", "Sarah Chen").build(),
        TicketBuilder::new("b").assignee("u2", "Ajay Sharma").build(),
        TicketBuilder::new("c").build(),
    ];
    let controls = ViewControls {
        scope: Scope::My,
        ..Default::default()
    };
    assert_eq!(ids(&filter_and_sort(&tickets, &controls, &context())), vec!["a"]);

    let anonymous = FilterContext::new(None, TimeZone::UTC);
    assert!(filter_and_sort(&tickets, &controls, &anonymous).is_empty());
}

#[test]
fn test_date_range_is_inclusive() {
    let tickets = vec![
        TicketBuilder::new("a").created("2024-03-01T00:00:00Z").build(),
        TicketBuilder::new("b").created("2024-03-31T23:59:59Z").build(),
        TicketBuilder::new("c").created("2024-04-01T00:00:00Z").build(),
    ];
    let controls = ViewControls {
        filters: FilterSet {
            date_from: Some(jiff::civil::date(2024, 3, 1)),
            date_to: Some(jiff::civil::date(2024, 3, 31)),
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(
        ids(&filter_and_sort(&tickets, &controls, &context())),
        vec!["a", "b"]
    );
}

#[test]
fn test_project_grouping_boundary() {
    let projects = vec![mock_project("p1", "Alpha")];
    let tickets = vec![
        TicketBuilder::new("1").project("p1", "Alpha").build(),
        TicketBuilder::new("2").project("p9", "Legacy").build(),
        TicketBuilder::new("3").build(),
    ];
    let groups = group_tickets(
        &tickets,
        GroupMode::Project,
        GroupRefs {
            projects: &projects,
            categories: &[],
        },
    );

    let titles: Vec<&str> = groups.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Legacy", "No Project"]);
    assert_eq!(groups[2].key, GroupKey::NoProject);
    assert_eq!(ids(&groups[2].tickets), vec!["3"]);
}

#[test]
fn test_status_grouping_always_has_four_columns() {
    let groups = group_tickets(&[], GroupMode::Status, no_refs());
    let keys: Vec<_> = groups.iter().map(|g| g.key.clone()).collect();
    assert_eq!(
        keys,
        TicketStatus::ALL.iter().map(|s| GroupKey::Status(*s)).collect::<Vec<_>>()
    );
}

#[test]
fn test_missing_priority_sorts_last_both_ways() {
    let tickets = vec![
        TicketBuilder::new("a").build(),
        TicketBuilder::new("b").priority(2).build(),
        TicketBuilder::new("c").priority(9).build(),
    ];
    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let controls = ViewControls {
            sort: Some(SortSpec::new(SortField::Priority, direction)),
            ..Default::default()
        };
        let sorted = filter_and_sort(&tickets, &controls, &context());
        assert_eq!(sorted.last().unwrap().id.as_str(), "a");
    }
}

fn arb_status() -> impl Strategy<Value = TicketStatus> {
    prop_oneof![
        Just(TicketStatus::Open),
        Just(TicketStatus::InProgress),
        Just(TicketStatus::Resolved),
        Just(TicketStatus::Closed),
    ]
}

fn arb_ticket() -> impl Strategy<Value = (TicketStatus, u8, Option<&'static str>)> {
    (
        arb_status(),
        0u8..=10,
        prop_oneof![Just(None), Just(Some("p1")), Just(Some("p2"))],
    )
}

fn arb_tickets() -> impl Strategy<Value = Vec<Ticket>> {
    prop::collection::vec(arb_ticket(), 0..30).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (status, priority, project))| {
                let builder = TicketBuilder::new(&format!("{i:03}"))
                    .status(status)
                    .priority(priority);
                match project {
                    Some(id) => builder.project(id, id).build(),
                    None => builder.build(),
                }
            })
            .collect()
    })
}

fn arb_filters() -> impl Strategy<Value = FilterSet> {
    (prop::option::of(arb_status()), prop::option::of(0u8..=10)).prop_map(|(status, priority)| {
        FilterSet {
            status,
            priority: priority.map(|p| Priority::new(p).unwrap()),
            ..Default::default()
        }
    })
}

proptest! {
    #[test]
    fn prop_filtered_view_is_subset(tickets in arb_tickets(), filters in arb_filters()) {
        let controls = ViewControls { filters, ..Default::default() };
        let visible = filter_and_sort(&tickets, &controls, &context());
        prop_assert!(visible.len() <= tickets.len());
        for ticket in &visible {
            prop_assert!(tickets.contains(ticket));
        }
    }

    #[test]
    fn prop_filters_combine_with_and(tickets in arb_tickets(), filters in arb_filters()) {
        let both = filter_and_sort(
            &tickets,
            &ViewControls { filters: filters.clone(), ..Default::default() },
            &context(),
        );
        let status_only = filter_and_sort(
            &tickets,
            &ViewControls {
                filters: FilterSet { status: filters.status, ..Default::default() },
                ..Default::default()
            },
            &context(),
        );
        let priority_only = filter_and_sort(
            &tickets,
            &ViewControls {
                filters: FilterSet { priority: filters.priority, ..Default::default() },
                ..Default::default()
            },
            &context(),
        );
        for ticket in &tickets {
            let expected = status_only.contains(ticket) && priority_only.contains(ticket);
            prop_assert_eq!(both.contains(ticket), expected);
        }
    }

    #[test]
    fn prop_empty_controls_are_identity(tickets in arb_tickets()) {
        let visible = filter_and_sort(&tickets, &ViewControls::default(), &context());
        prop_assert_eq!(visible, tickets);
    }

    #[test]
    fn prop_desc_reverses_asc_for_distinct_keys(tickets in arb_tickets()) {
        // Ticket numbers are unique, so the order is strict.
        let asc = filter_and_sort(
            &tickets,
            &ViewControls { sort: Some(SortSpec::asc(SortField::TicketNo)), ..Default::default() },
            &context(),
        );
        let mut desc = filter_and_sort(
            &tickets,
            &ViewControls { sort: Some(SortSpec::desc(SortField::TicketNo)), ..Default::default() },
            &context(),
        );
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }

    #[test]
    fn prop_grouping_partitions_tickets(tickets in arb_tickets(), by_project in any::<bool>()) {
        let mode = if by_project { GroupMode::Project } else { GroupMode::Status };
        let groups = group_tickets(&tickets, mode, no_refs());
        let total: usize = groups.iter().map(|g| g.tickets.len()).sum();
        prop_assert_eq!(total, tickets.len());

        // Grouping the flattened result again gives the same buckets.
        let flattened: Vec<Ticket> = groups.iter().flat_map(|g| g.tickets.clone()).collect();
        let regrouped = group_tickets(&flattened, mode, no_refs());
        prop_assert_eq!(regrouped, groups);
    }

    #[test]
    fn prop_build_view_groups_only_visible(tickets in arb_tickets(), filters in arb_filters()) {
        let controls = ViewControls { filters, ..Default::default() };
        let visible = filter_and_sort(&tickets, &controls, &context());
        let groups = build_view(&tickets, &controls, &context(), no_refs());
        let total: usize = groups.iter().map(|g| g.tickets.len()).sum();
        prop_assert_eq!(total, visible.len());
    }
}
