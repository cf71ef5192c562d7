//! Output formatting for the ballotbox commands
//!
//! Everything here is pure: flows hand over polls and sessions, these
//! functions turn them into tables (human) or JSON (scripts).

use ballotbox_core::shell::{nav_links, shows_logout};
use ballotbox_core::types::{Poll, Session};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

// ============================================================================
// Formatters
// ============================================================================

/// One row per option, grouped by poll
pub fn format_poll_table(polls: &[Poll], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(polls).unwrap_or_else(|_| "[]".to_string());
    }

    if polls.is_empty() {
        return "No polls found.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers = ["Poll", "Question", "Option ID", "Option", "Votes", "Share"];
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for poll in polls {
        let total = poll.total_votes();
        let leader = poll.leader().map(|o| o.id.as_str());

        if poll.options.is_empty() {
            table.add_row(Row::from(vec![
                poll.id.as_str(),
                &truncate(&poll.question, 40),
                "-",
                "-",
                "0",
                "-",
            ]));
            continue;
        }

        for (i, option) in poll.options.iter().enumerate() {
            // Poll id and question only on the first row of each group
            let (id, question) = if i == 0 {
                (poll.id.clone(), truncate(&poll.question, 40))
            } else {
                (String::new(), String::new())
            };

            let mut name = Cell::new(truncate(&option.name, 30));
            if !no_color && total > 0 && leader == Some(option.id.as_str()) {
                name = name.fg(Color::Green);
            }

            table.add_row(Row::from(vec![
                Cell::new(id),
                Cell::new(question),
                Cell::new(&option.id),
                name,
                Cell::new(option.votes),
                Cell::new(vote_share(option.votes, total)),
            ]));
        }
    }

    table.to_string()
}

/// Who is logged in and what they can reach
pub fn format_session(session: &Session, json: bool) -> String {
    if json {
        let value = serde_json::json!({
            "authenticated": session.is_authenticated(),
            "role": session.effective_role().map(|r| r.as_str()),
            "routes": nav_links(session).iter().map(|r| r.path()).collect::<Vec<_>>(),
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    let mut lines = vec![];
    if session.is_authenticated() {
        lines.push("Logged in:  yes".to_string());
        lines.push(format!(
            "Role:       {}",
            session
                .effective_role()
                .map(|r| r.as_str())
                .unwrap_or("none")
        ));
    } else {
        lines.push("Logged in:  no".to_string());
    }

    let links = nav_links(session)
        .iter()
        .map(|r| format!("{} ({})", r.title(), r.path()))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("Pages:      {}", links));
    if shows_logout(session) {
        lines.push("            run `ballotbox logout` to end the session".to_string());
    }

    lines.join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

fn vote_share(votes: u64, total: u64) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", votes as f64 * 100.0 / total as f64)
}

/// Cut to at most `max` characters, ending in an ellipsis when shortened
fn truncate(s: &str, max: usize) -> String {
    if s.char_indices().nth(max).is_none() {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .nth(max.saturating_sub(1))
        .map_or(s.len(), |(i, _)| i);
    format!("{}…", &s[..cut])
}

// ============================================================================
// Tests
// ============================================================================
