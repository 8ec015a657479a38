//! ICS import logic for meetprep calendar module.
//
// This module turns raw calendar text into flat event blocks.

use crate::calendar::calendar_types::{Event, Property};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// Split calendar text into events, one per `BEGIN:VEVENT`/`END:VEVENT` block.
///
/// Blocks do not nest: a second begin marker silently drops the open block,
/// and a block still open at end of input is never emitted.
pub fn tokenize(text: &str) -> Vec<Event> {
    let mut events = Vec::new();
    let mut current: Option<Event> = None;

    for line in text.lines() {
        let line = line.trim();

        if line.eq_ignore_ascii_case(BEGIN_EVENT) {
            current = Some(Event::new());
        } else if line.eq_ignore_ascii_case(END_EVENT) {
            if let Some(event) = current.take() {
                events.push(event);
            }
        } else if let Some(event) = current.as_mut() {
            if let Some(property) = parse_property(line) {
                event.push(property);
            }
        }
    }

    if current.is_some() {
        log::debug!("Discarding unterminated event block at end of input");
    }

    events
}

/// Parse a `NAME;PARAMS:VALUE` line. Only the first `:` separates, the value
/// may contain more of them.
fn parse_property(line: &str) -> Option<Property> {
    let (key, value) = line.split_once(':')?;
    let property = match key.split_once(';') {
        Some((name, params)) => Property::new(name, value).with_params(params),
        None => Property::new(key, value),
    };
    Some(property)
}

// Start of a line that must stay on its own even when indented
static LINE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(?i:BEGIN|END):|[A-Z][A-Z0-9-]*[;:])").expect("valid line start pattern"));

/// A line starting with one space or tab continues the previous line, unless
/// its trimmed text is a block marker or an uppercase `NAME:`/`NAME;` property.
fn is_continuation(line: &str) -> bool {
    match line.strip_prefix([' ', '\t']) {
        Some(rest) => !LINE_START.is_match(rest.trim_start()),
        None => false,
    }
}

/// Join folded content lines: the line break and the single leading space or
/// tab of each continuation are removed.
pub fn unfold(text: &str) -> Cow<'_, str> {
    if !text.contains("\n ") && !text.contains("\n\t") {
        return Cow::Borrowed(text);
    }

    let mut unfolded = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if unfolded.ends_with('\n') && is_continuation(line) {
            unfolded.pop();
            if unfolded.ends_with('\r') {
                unfolded.pop();
            }
            unfolded.push_str(&line[1..]);
        } else {
            unfolded.push_str(line);
        }
    }
    Cow::Owned(unfolded)
}

/// Unfold then tokenize. Used for feeds fetched from a calendar source.
pub fn parse_calendar(text: &str) -> Vec<Event> {
    tokenize(&unfold(text))
}
