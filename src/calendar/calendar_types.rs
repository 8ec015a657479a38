//! Type definitions for the meetprep calendar module.
//
// This module contains the parsed event model shared by the tokenizer,
// the time decoder, the attendee extractor and the upcoming-event filter.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub const START_PROPERTY: &str = "DTSTART";
pub const UID_PROPERTY: &str = "UID";
pub const SUMMARY_PROPERTY: &str = "SUMMARY";
pub const LOCATION_PROPERTY: &str = "LOCATION";

/// A single content line of an event block.
///
/// `name` is the property key with any parameter annotations removed,
/// `params` keeps the raw annotation text (e.g. `CN=Jane Doe;ROLE=CHAIR`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub params: Option<String>,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), params: None, value: value.into() }
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// One `BEGIN:VEVENT` .. `END:VEVENT` block.
///
/// Properties are kept in source order and repeated names are never
/// collapsed, since every attendee is its own `ATTENDEE` line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    properties: Vec<Property>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Single-valued view of a property: the last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.iter().rev().find(|p| p.is(name)).map(|p| p.value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties.iter().filter(move |p| p.is(name))
    }

    pub fn uid(&self) -> Option<&str> {
        self.get(UID_PROPERTY)
    }

    pub fn summary(&self) -> Option<&str> {
        self.get(SUMMARY_PROPERTY)
    }

    pub fn location(&self) -> Option<&str> {
        self.get(LOCATION_PROPERTY).filter(|l| !l.trim().is_empty())
    }

    pub fn start_raw(&self) -> Option<&str> {
        self.get(START_PROPERTY)
    }
}

impl FromIterator<Property> for Event {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        Self { properties: iter.into_iter().collect() }
    }
}

/// Decoded start of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStart {
    Timed(NaiveDateTime),
    /// Date-only encoding, no time of day.
    AllDay(NaiveDate),
}

impl EventStart {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventStart::AllDay(_))
    }

    /// Point used for ordering; all-day starts sort at midnight.
    pub fn instant(&self) -> NaiveDateTime {
        match self {
            EventStart::Timed(dt) => *dt,
            EventStart::AllDay(date) => date.and_time(NaiveTime::MIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attendee {
    /// Always lowercase.
    pub email: String,
    pub name: Option<String>,
}

impl Attendee {
    /// Display name, falling back to the local part of the address.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    pub fn domain(&self) -> &str {
        self.email.split_once('@').map(|(_, domain)| domain).unwrap_or("")
    }
}

/// An event that passed every upcoming-meeting predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantEvent {
    pub start: NaiveDateTime,
    pub event: Event,
    pub attendees: Vec<Attendee>,
}

impl RelevantEvent {
    pub fn summary(&self) -> &str {
        self.event.summary().unwrap_or("Meeting")
    }
}
