//! Recurrence rule construction for repeating lessons.

use crate::lesson::{Lesson, LessonDay, LessonError, LessonKind, LessonRecurrence};
use serde::{Deserialize, Serialize};

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Weekly,
    Monthly,
}

impl LessonRecurrence {
    pub fn frequency(self) -> RecurrenceFrequency {
        match self {
            LessonRecurrence::Weekly => RecurrenceFrequency::Weekly,
            LessonRecurrence::Monthly => RecurrenceFrequency::Monthly,
        }
    }
}

/// Specifies when a recurring event series ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceEnd {
    AfterOccurrences(u32),
}

/// A recurrence rule ready to attach to a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    pub days_of_week: Vec<LessonDay>,
    pub end: RecurrenceEnd,
}

impl Lesson {
    /// Builds the recurrence rule for a repeating lesson.
    ///
    /// Only recurring lessons carry recurrence fields; calling this on a
    /// drop-in lesson is a caller bug and yields a typed error.
    pub fn recurrence_rule(&self) -> Result<RecurrenceRule, LessonError> {
        if self.kind != LessonKind::Recurring {
            return Err(LessonError::NotRecurring(self.name.clone()));
        }
        let (repeats, interval, occurrence_count) =
            match (self.repeats, self.interval, self.occurrence_count) {
                (Some(repeats), Some(interval), Some(count)) => (repeats, interval, count),
                _ => return Err(LessonError::NotRecurring(self.name.clone())),
            };

        Ok(RecurrenceRule {
            frequency: repeats.frequency(),
            interval,
            days_of_week: self.days.clone(),
            end: RecurrenceEnd::AfterOccurrences(occurrence_count),
        })
    }

    pub fn occurrence_count_as_text(&self) -> String {
        match self.occurrence_count {
            Some(count) => format!("No. of lessons: {}", count),
            None => String::new(),
        }
    }
}
