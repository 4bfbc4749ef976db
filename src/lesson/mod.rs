use chrono::Weekday;
use serde::{Deserialize, Serialize};

mod lesson_catalog;
mod lesson_dates;
mod lesson_recurrence;

pub use lesson_catalog::{load_catalog, validate_lesson, CatalogError};
pub use lesson_dates::{end_date_time, one_month_out};
pub use lesson_recurrence::{RecurrenceEnd, RecurrenceFrequency, RecurrenceRule};

/// Custom error type for lesson operations
#[derive(Debug, thiserror::Error)]
pub enum LessonError {
    #[error("Lesson '{0}' is not a recurring lesson")]
    NotRecurring(String),
}

/// Specifies whether a lesson is a recurring event or a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LessonKind {
    Single = 1,
    Recurring = 2,
}

impl TryFrom<u8> for LessonKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LessonKind::Single),
            2 => Ok(LessonKind::Recurring),
            other => Err(format!("invalid lesson type code: {}", other)),
        }
    }
}

impl From<LessonKind> for u8 {
    fn from(kind: LessonKind) -> u8 {
        kind as u8
    }
}

/// A day on which a lesson occurs. Ordinals follow the calendar store
/// convention: Sunday is 1 and Saturday is 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LessonDay {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

impl LessonDay {
    pub const ALL: [LessonDay; 7] = [
        LessonDay::Sunday,
        LessonDay::Monday,
        LessonDay::Tuesday,
        LessonDay::Wednesday,
        LessonDay::Thursday,
        LessonDay::Friday,
        LessonDay::Saturday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LessonDay::Sunday => "Sunday",
            LessonDay::Monday => "Monday",
            LessonDay::Tuesday => "Tuesday",
            LessonDay::Wednesday => "Wednesday",
            LessonDay::Thursday => "Thursday",
            LessonDay::Friday => "Friday",
            LessonDay::Saturday => "Saturday",
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The weekday as chrono sees it.
    pub fn weekday(self) -> Weekday {
        match self {
            LessonDay::Sunday => Weekday::Sun,
            LessonDay::Monday => Weekday::Mon,
            LessonDay::Tuesday => Weekday::Tue,
            LessonDay::Wednesday => Weekday::Wed,
            LessonDay::Thursday => Weekday::Thu,
            LessonDay::Friday => Weekday::Fri,
            LessonDay::Saturday => Weekday::Sat,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => LessonDay::Sunday,
            Weekday::Mon => LessonDay::Monday,
            Weekday::Tue => LessonDay::Tuesday,
            Weekday::Wed => LessonDay::Wednesday,
            Weekday::Thu => LessonDay::Thursday,
            Weekday::Fri => LessonDay::Friday,
            Weekday::Sat => LessonDay::Saturday,
        }
    }
}

impl TryFrom<u8> for LessonDay {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LessonDay::Sunday),
            2 => Ok(LessonDay::Monday),
            3 => Ok(LessonDay::Tuesday),
            4 => Ok(LessonDay::Wednesday),
            5 => Ok(LessonDay::Thursday),
            6 => Ok(LessonDay::Friday),
            7 => Ok(LessonDay::Saturday),
            other => Err(format!("invalid weekday ordinal: {}", other)),
        }
    }
}

impl From<LessonDay> for u8 {
    fn from(day: LessonDay) -> u8 {
        day as u8
    }
}

/// The lesson recurrence frequency as coded in the catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LessonRecurrence {
    Weekly = 1,
    Monthly = 2,
}

impl TryFrom<u8> for LessonRecurrence {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LessonRecurrence::Weekly),
            2 => Ok(LessonRecurrence::Monthly),
            other => Err(format!("invalid recurrence code: {}", other)),
        }
    }
}

impl From<LessonRecurrence> for u8 {
    fn from(recurrence: LessonRecurrence) -> u8 {
        recurrence as u8
    }
}

/// Provides information about a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Specifies whether the lesson is a recurring event or a single event.
    #[serde(rename = "type")]
    pub kind: LessonKind,
    pub name: String,

    /// Specifies the days on which the lesson occurs.
    pub days: Vec<LessonDay>,

    /// Specifies the time at which the lesson starts, in seconds since
    /// midnight.
    pub start_at: u32,

    /// Specifies the lesson recurrence frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeats: Option<LessonRecurrence>,

    /// Specifies the lesson recurrence interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,

    /// Specifies how often the lesson occurs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_count: Option<u32>,
}

impl Lesson {
    pub fn title(&self) -> String {
        format!("Swim {}", self.name)
    }

    pub fn booking_label(&self) -> String {
        format!("Book {}", self.title())
    }

    pub fn days_as_text(&self) -> String {
        self.days.iter().map(|day| day.name()).collect::<Vec<_>>().join(" and ")
    }
}

// Lesson identity is its name, which is unique within the catalog.
impl PartialEq for Lesson {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Lesson {}

impl Lesson {
    /// A one-off drop-in lesson matching the bundled catalog.
    pub fn dropin_mock() -> Self {
        Lesson {
            kind: LessonKind::Single,
            name: "205".to_string(),
            days: vec![LessonDay::Monday],
            start_at: 43_200,
            repeats: None,
            interval: None,
            occurrence_count: None,
        }
    }

    /// A weekly repeating lesson matching the bundled catalog.
    pub fn repeating_mock() -> Self {
        Lesson {
            kind: LessonKind::Recurring,
            name: "105".to_string(),
            days: vec![LessonDay::Friday],
            start_at: 39_900,
            repeats: Some(LessonRecurrence::Weekly),
            interval: Some(1),
            occurrence_count: Some(8),
        }
    }
}
