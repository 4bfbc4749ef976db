//! The lesson query model.
//
// Holds the loaded catalog and the user's selected date, and republishes
// the filtered lesson lists whenever the date changes. Published state goes
// through watch channels so the presentation layer can subscribe instead of
// polling.

use crate::lesson::{Lesson, LessonDay, LessonKind};
use chrono::{Datelike, NaiveDate};
use log::debug;
use tokio::sync::watch;

pub struct LessonModel {
    lessons: Vec<Lesson>,
    selected_date: NaiveDate,
    pending_selection: Option<Lesson>,
    dropin_tx: watch::Sender<Vec<Lesson>>,
    repeating_tx: watch::Sender<Vec<Lesson>>,
}

impl LessonModel {
    pub fn new(catalog: Vec<Lesson>, date: NaiveDate) -> Self {
        let model = LessonModel {
            lessons: catalog,
            selected_date: date,
            pending_selection: None,
            dropin_tx: watch::Sender::new(Vec::new()),
            repeating_tx: watch::Sender::new(Vec::new()),
        };
        model.repeating_tx.send_replace(model.lessons_of_kind(LessonKind::Recurring));
        model.dropin_tx.send_replace(model.selected_day_lessons());
        model
    }

    /// Filter the catalog for the specified lesson kind, in catalog order.
    pub fn lessons_of_kind(&self, kind: LessonKind) -> Vec<Lesson> {
        self.lessons.iter().filter(|lesson| lesson.kind == kind).cloned().collect()
    }

    /// The drop-in lessons scheduled on the specified day. An empty result
    /// just means nothing is offered that day.
    pub fn single_lessons_for_day(&self, day: LessonDay) -> Vec<Lesson> {
        self.lessons
            .iter()
            .filter(|lesson| lesson.kind == LessonKind::Single && lesson.days.contains(&day))
            .cloned()
            .collect()
    }

    fn selected_day_lessons(&self) -> Vec<Lesson> {
        let day = LessonDay::from_weekday(self.selected_date.weekday());
        self.single_lessons_for_day(day)
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// The user picked a new date. Republish the lesson slots for that day
    /// and drop any selection made against the old list.
    pub fn set_selected_date(&mut self, date: NaiveDate) {
        debug!("Selected date changed to {}", date);
        self.selected_date = date;
        self.pending_selection = None;
        self.dropin_tx.send_replace(self.selected_day_lessons());
    }

    /// The currently published drop-in lessons for the selected date.
    pub fn dropin_lessons(&self) -> Vec<Lesson> {
        self.dropin_tx.borrow().clone()
    }

    pub fn repeating_lessons(&self) -> Vec<Lesson> {
        self.repeating_tx.borrow().clone()
    }

    pub fn subscribe_dropin(&self) -> watch::Receiver<Vec<Lesson>> {
        self.dropin_tx.subscribe()
    }

    pub fn subscribe_repeating(&self) -> watch::Receiver<Vec<Lesson>> {
        self.repeating_tx.subscribe()
    }

    /// Marks the named lesson as the pending booking selection.
    pub fn select(&mut self, name: &str) -> Option<Lesson> {
        let found = self.lessons.iter().find(|lesson| lesson.name == name).cloned();
        self.pending_selection = found.clone();
        found
    }

    pub fn pending_selection(&self) -> Option<&Lesson> {
        self.pending_selection.as_ref()
    }

    /// Dismissing the booking dialog clears the pending selection.
    pub fn clear_selection(&mut self) {
        self.pending_selection = None;
    }
}
