mod calendar_attendees;
mod calendar_filter;
mod calendar_import;
mod calendar_source;
mod calendar_time;
mod calendar_types;

pub use calendar_attendees::*;
pub use calendar_filter::*;
pub use calendar_import::*;
pub use calendar_source::*;
pub use calendar_time::*;
pub use calendar_types::*;

/// Custom error type for calendar operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("No calendar sources configured")]
    NoSources,
    #[error("Invalid calendar source '{0}': {1}")]
    InvalidSource(String, String),
    #[error("Failed to fetch {0}: {1}")]
    FetchFailed(String, String),
}
