use crate::lesson::RecurrenceRule;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

mod local_store;
mod store_manager;
#[cfg(test)]
mod store_tests;

pub use local_store::{GrantPolicy, LocalEventStore};
pub use store_manager::EventStoreManager;

/// Custom error type for event store operations
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("The app doesn't have permission to Calendar in Settings.")]
    Denied,
    #[error("This device doesn't allow access to Calendar.")]
    Restricted,
    #[error("The app has write-only access to Calendar in Settings. Please grant it full access so the app can fetch and delete your events.")]
    Upgrade,
    #[error("An unknown error occurred.")]
    Unknown,
    #[error("No writable calendar is available for new events")]
    NoWritableCalendar,
    #[error("Failed to save event: {0}")]
    SaveFailed(String),
    #[error("Failed to delete event '{event}': {reason}")]
    DeleteFailed { event: String, reason: String },
    #[error("Calendar store operation failed: {0}")]
    Storage(String),
}

/// The authorization status for the app, mirroring the platform calendar
/// permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    WriteOnly,
    FullAccess,
}

impl AuthorizationStatus {
    pub fn allows_writing(self) -> bool {
        matches!(self, AuthorizationStatus::WriteOnly | AuthorizationStatus::FullAccess)
    }

    pub fn is_full_access(self) -> bool {
        self == AuthorizationStatus::FullAccess
    }

    pub fn as_text(self) -> &'static str {
        match self {
            AuthorizationStatus::NotDetermined => "not determined",
            AuthorizationStatus::Restricted => "restricted",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::WriteOnly => "write-only",
            AuthorizationStatus::FullAccess => "full access",
        }
    }
}

/// The scope of calendar access an app can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    WriteOnly,
    Full,
}

/// Which occurrences a save or removal applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSpan {
    ThisEvent,
    FutureEvents,
}

/// A half-open time window used when fetching events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// The window from the given instant to one month out, the fetch range
    /// used for the upcoming-events list.
    pub fn month_ahead(from: NaiveDateTime) -> Self {
        DateRange { start: from, end: crate::lesson::one_month_out(from) }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// A calendar event as the store holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub calendar: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

impl Event {
    pub fn display(&self) -> String {
        let mut output = format!(
            "{} - {} ({} to {})",
            self.title,
            self.start.format("%Y-%m-%d"),
            self.start.format("%-I:%M %p"),
            self.end.format("%-I:%M %p")
        );
        if let Some(rule) = &self.recurrence {
            output.push_str(&format!(
                "\n   Repeats {:?} x{}",
                rule.frequency,
                match rule.end {
                    crate::lesson::RecurrenceEnd::AfterOccurrences(count) => count,
                }
            ));
        }
        output.push_str(&format!("\n   Calendar: {}  Id: {}", self.calendar, self.id));
        output
    }
}

/// The calendar store seam the booking flows talk to.
///
/// The contract follows the platform store: fetching while unauthorized
/// yields an empty list rather than an error, and batch removal is
/// all-or-nothing.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn authorization_status(&self) -> AuthorizationStatus;

    /// Asks the user for calendar access. Returns whether the requested
    /// level was granted; a platform-side refusal is an error.
    async fn request_access(&self, level: AccessLevel) -> Result<bool, EventStoreError>;

    /// Builds a new event in the given calendar, or the default calendar
    /// when none is named.
    async fn create_event(
        &self,
        title: &str,
        calendar: Option<&str>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        recurrence: Option<RecurrenceRule>,
    ) -> Result<Event, EventStoreError>;

    async fn save_event(&self, event: Event, span: EventSpan) -> Result<(), EventStoreError>;

    /// Events within the range, ascending by start time. Empty unless the
    /// app holds full access; callers check the status first.
    async fn fetch_events(&self, range: DateRange) -> Vec<Event>;

    /// Removes the given events as one batch. On any failure the staged
    /// removals are discarded and nothing commits.
    async fn remove_events(&self, ids: &[String]) -> Result<(), EventStoreError>;
}
