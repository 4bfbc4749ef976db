//! Date computation for lesson bookings.
//
// Lessons store their start time as seconds since midnight; everything here
// is local wall-clock time with no timezone conversion.

use crate::lesson::{Lesson, LessonKind};
use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};

// Every lesson is a fixed thirty-minute slot.
const LESSON_MINUTES: i64 = 30;

impl Lesson {
    /// The lesson's start time of day. Seconds are dropped: the catalog
    /// stores whole minutes.
    pub fn start_time(&self) -> NaiveTime {
        let hour = self.start_at / 3600;
        let minute = (self.start_at % 3600) / 60;
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
    }

    pub fn start_time_as_text(&self) -> String {
        self.start_time().format("%-I:%M %p").to_string()
    }

    pub fn time_range_as_text(&self) -> String {
        let start = self.start_time();
        let end = start + Duration::minutes(LESSON_MINUTES);
        format!("{} to {}", start.format("%-I:%M %p"), end.format("%-I:%M %p"))
    }

    /// The date and time at which the booked lesson begins.
    ///
    /// A drop-in lesson starts on the reference date itself. A recurring
    /// lesson starts on the next scheduled day: the reference day counts
    /// only while its start time is still ahead of the reference instant,
    /// otherwise the search moves forward, wrapping across the week.
    pub fn start_date_time(&self, reference: NaiveDateTime) -> NaiveDateTime {
        match self.kind {
            LessonKind::Single => reference.date().and_time(self.start_time()),
            LessonKind::Recurring => {
                self.next_scheduled_date(reference).and_time(self.start_time())
            }
        }
    }

    fn next_scheduled_date(&self, reference: NaiveDateTime) -> NaiveDate {
        let today = reference.date();
        if self.occurs_on(today) && reference.time() < self.start_time() {
            return today;
        }
        for offset in 1..=7 {
            if let Some(candidate) = today.checked_add_days(Days::new(offset)) {
                if self.occurs_on(candidate) {
                    return candidate;
                }
            }
        }
        // An empty day set never reaches a scheduled day; fall back to the
        // reference day like the single-lesson path.
        today
    }

    fn occurs_on(&self, date: NaiveDate) -> bool {
        self.days.iter().any(|day| day.weekday() == date.weekday())
    }
}

/// Thirty minutes after the given start, the end of any lesson slot.
pub fn end_date_time(start: NaiveDateTime) -> NaiveDateTime {
    start + Duration::minutes(LESSON_MINUTES)
}

/// A month past the given instant. Bounds the upcoming-events fetch window.
pub fn one_month_out(from: NaiveDateTime) -> NaiveDateTime {
    from.checked_add_months(Months::new(1)).unwrap_or(from)
}
