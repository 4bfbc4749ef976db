//! The data model fronting the calendar store.
//
// Publishes the fetched events and the current authorization status, and
// owns the verify/request flows for both access levels.

use crate::event_store::{
    AccessLevel, AuthorizationStatus, DateRange, Event, EventSpan, EventStore, EventStoreError,
};
use crate::lesson::{end_date_time, Lesson, LessonKind};
use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::watch;

pub struct EventStoreManager {
    store: Arc<dyn EventStore>,
    events_tx: watch::Sender<Vec<Event>>,
    status_tx: watch::Sender<AuthorizationStatus>,
}

impl EventStoreManager {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        EventStoreManager {
            store,
            events_tx: watch::Sender::new(Vec::new()),
            status_tx: watch::Sender::new(AuthorizationStatus::NotDetermined),
        }
    }

    /// Contains fetched events when the app holds a full-access
    /// authorization status.
    pub fn events(&self) -> Vec<Event> {
        self.events_tx.borrow().clone()
    }

    pub fn authorization_status(&self) -> AuthorizationStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe_events(&self) -> watch::Receiver<Vec<Event>> {
        self.events_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<AuthorizationStatus> {
        self.status_tx.subscribe()
    }

    pub fn is_write_only_or_full_access(&self) -> bool {
        self.authorization_status().allows_writing()
    }

    /// Verifies full access, prompting if the status is not determined
    /// yet, then fetches the upcoming events.
    pub async fn setup_full_access(&self, now: NaiveDateTime) -> Result<()> {
        let granted = self.verify_full_access().await?;
        self.publish_status().await;
        if granted {
            self.refresh_events(now).await;
        }
        Ok(())
    }

    /// Verifies write-only access, prompting if the status is not
    /// determined yet. Full access also qualifies.
    pub async fn setup_write_only(&self) -> Result<()> {
        self.verify_write_only().await?;
        self.publish_status().await;
        Ok(())
    }

    async fn verify_full_access(&self) -> Result<bool, EventStoreError> {
        match self.store.authorization_status().await {
            AuthorizationStatus::NotDetermined => {
                self.store.request_access(AccessLevel::Full).await
            }
            AuthorizationStatus::Restricted => Err(EventStoreError::Restricted),
            AuthorizationStatus::Denied => Err(EventStoreError::Denied),
            AuthorizationStatus::FullAccess => Ok(true),
            AuthorizationStatus::WriteOnly => Err(EventStoreError::Upgrade),
        }
    }

    async fn verify_write_only(&self) -> Result<bool, EventStoreError> {
        match self.store.authorization_status().await {
            AuthorizationStatus::NotDetermined => {
                self.store.request_access(AccessLevel::WriteOnly).await
            }
            AuthorizationStatus::Restricted => Err(EventStoreError::Restricted),
            AuthorizationStatus::Denied => Err(EventStoreError::Denied),
            AuthorizationStatus::FullAccess | AuthorizationStatus::WriteOnly => Ok(true),
        }
    }

    async fn publish_status(&self) {
        let status = self.store.authorization_status().await;
        self.status_tx.send_replace(status);
    }

    /// Fetches all events occurring within a month and republishes them.
    pub async fn refresh_events(&self, now: NaiveDateTime) {
        let latest = self.store.fetch_events(DateRange::month_ahead(now)).await;
        debug!("Fetched {} upcoming event(s)", latest.len());
        self.events_tx.send_replace(latest);
    }

    /// Creates an event from the lesson details and saves it with all its
    /// occurrences to the calendar.
    pub async fn book_lesson(
        &self,
        lesson: &Lesson,
        reference: NaiveDateTime,
        calendar: Option<&str>,
    ) -> Result<Event> {
        let start = lesson.start_date_time(reference);
        let end = end_date_time(start);
        let recurrence = match lesson.kind {
            LessonKind::Recurring => Some(lesson.recurrence_rule()?),
            LessonKind::Single => None,
        };

        info!("Booking {} at {}", lesson.title(), start);
        let event =
            self.store.create_event(&lesson.title(), calendar, start, end, recurrence).await?;
        self.store.save_event(event.clone(), EventSpan::FutureEvents).await?;
        Ok(event)
    }

    /// Removes a batch of events, then republishes the upcoming list.
    pub async fn remove_events(&self, ids: &[String], now: NaiveDateTime) -> Result<()> {
        self.store.remove_events(ids).await?;
        self.refresh_events(now).await;
        Ok(())
    }
}
