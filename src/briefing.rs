//! Briefing and preview rendering.

use crate::calendar::{Attendee, RelevantEvent};
use crate::contacts::ContactStore;
use crate::web_search::SearchHit;

/// Search results gathered for one attendee.
#[derive(Debug, Clone)]
pub struct Research {
    pub attendee: Attendee,
    pub hits: Vec<SearchHit>,
}

pub fn generate_briefing(relevant: &RelevantEvent, contacts: &dyn ContactStore, research: &[Research]) -> String {
    let mut lines = Vec::new();

    lines.push(format!("📋 Meeting Briefing: {}", relevant.summary()));
    if let Some(location) = relevant.event.location() {
        lines.push(format!("📍 {}", location));
    }
    lines.push(format!(
        "⏰ {} on {}",
        relevant.start.format("%I:%M %p"),
        relevant.start.format("%b %d")
    ));

    lines.push(String::new());
    lines.push("👥 Attendees:".to_string());
    for attendee in &relevant.attendees {
        lines.push(attendee_line(attendee, contacts));
    }

    let research: Vec<_> = research.iter().filter(|r| !r.hits.is_empty()).collect();
    if !research.is_empty() {
        lines.push(String::new());
        lines.push("🔎 Research:".to_string());
        for entry in research {
            lines.push(format!("• {}", entry.attendee.display_name()));
            for hit in &entry.hits {
                lines.push(format!("    {} - {}", hit.title, hit.url));
            }
        }
    }

    lines.join("\n")
}

fn attendee_line(attendee: &Attendee, contacts: &dyn ContactStore) -> String {
    let name = attendee.display_name();
    match contacts.lookup(&attendee.email) {
        Some(contact) => {
            let company = contact.company.as_deref().unwrap_or(attendee.domain());
            let title = contact.title.as_deref().unwrap_or("");
            format!("• {} ({}) - {} @ {}", name, attendee.email, title, company)
        }
        None => format!("• {} ({}) - {}", name, attendee.email, attendee.domain()),
    }
}

/// One line of the `--check` listing.
pub fn preview_line(relevant: &RelevantEvent) -> String {
    format!(
        "  {} - {} ({} attendees)",
        relevant.start.format("%b %d %I:%M %p"),
        relevant.summary(),
        relevant.attendees.len()
    )
}

/// Query used to research an attendee: the display name plus the company
/// when the CRM knows one, else the email domain.
pub fn research_query(attendee: &Attendee, contacts: &dyn ContactStore) -> String {
    let company = contacts
        .lookup(&attendee.email)
        .and_then(|c| c.company)
        .unwrap_or_else(|| attendee.domain().to_string());
    format!("{} {}", attendee.display_name(), company).trim().to_string()
}
