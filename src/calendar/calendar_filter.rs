//! Upcoming-meeting selection.
//
// Keeps timed, future events with more than one identifiable attendee,
// ordered by start time.

use crate::calendar::calendar_attendees::extract_attendees;
use crate::calendar::calendar_time::decode;
use crate::calendar::calendar_types::{Event, RelevantEvent};
use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};

/// Filter and sort events for briefing.
///
/// Predicates, in order: the start decodes, the start is not before
/// `reference_now`, the start is not all-day, and there are at least two
/// attendees. The sort is stable, so equal starts keep input order.
pub fn filter_upcoming(events: &[Event], reference_now: NaiveDateTime) -> Vec<RelevantEvent> {
    let mut upcoming: Vec<RelevantEvent> =
        events.iter().filter_map(|event| relevant(event, reference_now)).collect();
    upcoming.sort_by_key(|relevant| relevant.start);
    upcoming
}

fn relevant(event: &Event, reference_now: NaiveDateTime) -> Option<RelevantEvent> {
    let uid = event.uid().unwrap_or("<no uid>");

    let Some(raw) = event.start_raw() else {
        debug!("Skipping event {}: no start time", uid);
        return None;
    };
    let start = match decode(raw) {
        Ok(start) => start,
        Err(e) => {
            warn!("Skipping event {}: {}", uid, e);
            return None;
        }
    };

    if start.instant() < reference_now {
        debug!("Skipping event {}: already started", uid);
        return None;
    }
    if start.is_all_day() {
        debug!("Skipping event {}: all-day", uid);
        return None;
    }

    let attendees = extract_attendees(event);
    if attendees.len() <= 1 {
        debug!("Skipping event {}: {} attendee(s)", uid, attendees.len());
        return None;
    }

    Some(RelevantEvent { start: start.instant(), event: event.clone(), attendees })
}

/// Relevant events starting within `[now + lead, now + lead + span]`.
pub fn within_window<'a>(
    upcoming: &'a [RelevantEvent],
    now: NaiveDateTime,
    lead: Duration,
    span: Duration,
) -> impl Iterator<Item = &'a RelevantEvent> + 'a {
    let window_start = now + lead;
    let window_end = window_start + span;
    upcoming.iter().filter(move |relevant| relevant.start >= window_start && relevant.start <= window_end)
}
