//! Attendee extraction for meetprep calendar module.
//
// Attendee lines vary a lot between calendar providers: the display name may
// sit in the key parameters or inline in the value.

use crate::calendar::calendar_types::{Attendee, Event, Property};
use once_cell::sync::Lazy;
use regex::Regex;

const ATTENDEE_PREFIX: &str = "ATTENDEE";

static MAILTO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)mailto:(\S+)").expect("valid mailto pattern"));
static COMMON_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CN=([^;:]+)").expect("valid CN pattern"));

/// Extract attendees in order of appearance. Lines without a `mailto:`
/// address are skipped; duplicates are kept.
pub fn extract_attendees(event: &Event) -> Vec<Attendee> {
    event.properties().iter().filter(|p| is_attendee(p)).filter_map(parse_attendee).collect()
}

fn is_attendee(property: &Property) -> bool {
    property
        .name
        .get(..ATTENDEE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ATTENDEE_PREFIX))
}

fn parse_attendee(property: &Property) -> Option<Attendee> {
    let email = MAILTO_RE.captures(&property.value)?.get(1)?.as_str().to_lowercase();

    let combined = format!("{}:{}", property.params.as_deref().unwrap_or(""), property.value);
    let name = COMMON_NAME_RE
        .captures(&combined)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_matches('"').trim().to_string())
        .filter(|name| !name.is_empty());

    Some(Attendee { email, name })
}
