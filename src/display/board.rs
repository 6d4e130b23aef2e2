use owo_colors::OwoColorize;

use crate::board::{BoardViewModel, EmptyState};

use super::{format_severity_colored, truncate};

const CARD_WIDTH: usize = 48;

/// Render the board as stacked columns, one card per line.
pub fn render_board(vm: &BoardViewModel) -> String {
    let mut out = String::new();

    if let Some(error) = &vm.error {
        out.push_str(&format!("{} {error}\n\n", "error:".red().bold()));
    }

    match vm.empty_state {
        Some(EmptyState::Loading) => return format!("{out}Loading tickets..."),
        Some(EmptyState::NoTickets) => out.push_str(&format!("{}\n\n", "No tickets yet.".dimmed())),
        Some(EmptyState::NoMatches) => out.push_str(&format!(
            "{}\n\n",
            format!("No tickets match '{}'.", vm.search_query).dimmed()
        )),
        None => {}
    }

    for column in &vm.columns {
        let header = format!("{} ({})", column.title, column.ticket_count);
        out.push_str(&format!("{}\n", header.bold().underline()));

        if column.cards.is_empty() {
            out.push_str(&format!("  {}\n", "-".dimmed()));
        }
        for card in &column.cards {
            let t = &card.ticket;
            let marker = if card.is_selected { ">" } else { " " };
            let mut line = format!(
                "{marker} {} {}  P{}  {}",
                format!("{:8}", t.display_no()).cyan(),
                truncate(&t.subject, CARD_WIDTH),
                t.priority.map(|p| p.value().to_string()).unwrap_or_else(|| "-".to_string()),
                format_severity_colored(t.severity),
            );
            if let Some(assignee) = &t.assignee {
                line.push_str(&format!("  @{}", assignee.display_name()));
            }
            if t.escalated {
                line.push_str(&format!("  {}", "escalated".red()));
            }
            if card.is_pending {
                line.push_str(&format!("  {}", "(saving)".dimmed()));
            }
            out.push_str(&line);
            out.push('\n');
        }
        if column.hidden_below > 0 {
            out.push_str(&format!(
                "  {}\n",
                format!("... {} more", column.hidden_below).dimmed()
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "{}",
        format!(
            "{} of {} tickets shown",
            vm.total_filtered_tickets, vm.total_all_tickets
        )
        .dimmed()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardState, compute_board_view_model};
    use crate::model::Ticket;

    #[test]
    fn test_board_lists_columns_and_cards() {
        let state = BoardState {
            tickets: vec![Ticket::new("1", "Replace toner")],
            ..Default::default()
        };
        let out = render_board(&compute_board_view_model(&state, 0));
        assert!(out.contains("Open (1)"));
        assert!(out.contains("In Progress (0)"));
        assert!(out.contains("Replace toner"));
        assert!(out.contains("1 of 1 tickets shown"));
    }
}
