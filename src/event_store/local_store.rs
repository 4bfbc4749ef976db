//! A JSON-file-backed calendar store.
//
// Stands in for the platform calendar service: it simulates the Settings
// grant through a configurable policy and keeps events in a dot-directory
// under the user's home, one pretty-printed JSON file, rewritten on commit.

use crate::event_store::{
    AccessLevel, AuthorizationStatus, DateRange, Event, EventSpan, EventStore, EventStoreError,
};
use crate::lesson::RecurrenceRule;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

const STATE_DIR: &str = ".poolbook";
const EVENTS_FILE: &str = "events.json";
// Maximum allowed size for the events file to prevent DoS via a crafted
// state directory (10MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const MAX_EVENT_COUNT: usize = 10_000;

/// How the simulated Settings respond when the app asks for calendar
/// access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantPolicy {
    AlwaysFull,
    AlwaysWriteOnly,
    Deny,
    Restricted,
}

impl Default for GrantPolicy {
    fn default() -> Self {
        GrantPolicy::AlwaysFull
    }
}

struct StoreState {
    status: AuthorizationStatus,
    events: HashMap<String, Event>,
}

pub struct LocalEventStore {
    state_dir: PathBuf,
    policy: GrantPolicy,
    default_calendar: Option<String>,
    inner: Mutex<StoreState>,
}

impl LocalEventStore {
    pub fn new(policy: GrantPolicy, default_calendar: Option<String>) -> Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Self::with_state_dir(home_dir.join(STATE_DIR), policy, default_calendar)
    }

    /// Builds a store rooted at an explicit directory. Tests point this at
    /// a temporary directory.
    pub fn with_state_dir(
        state_dir: PathBuf,
        policy: GrantPolicy,
        default_calendar: Option<String>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&state_dir)
            .with_context(|| format!("Failed to create state directory {}", state_dir.display()))?;

        let events = match load_events(&state_dir.join(EVENTS_FILE)) {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to load saved events, starting empty: {}", e);
                HashMap::new()
            }
        };

        let status = if policy == GrantPolicy::Restricted {
            AuthorizationStatus::Restricted
        } else {
            AuthorizationStatus::NotDetermined
        };

        Ok(Self {
            state_dir,
            policy,
            default_calendar,
            inner: Mutex::new(StoreState { status, events }),
        })
    }

    fn events_path(&self) -> PathBuf {
        self.state_dir.join(EVENTS_FILE)
    }

    fn grant(&self, level: AccessLevel) -> AuthorizationStatus {
        match (self.policy, level) {
            (GrantPolicy::AlwaysFull, AccessLevel::Full) => AuthorizationStatus::FullAccess,
            (GrantPolicy::AlwaysFull, AccessLevel::WriteOnly) => AuthorizationStatus::WriteOnly,
            (GrantPolicy::AlwaysWriteOnly, _) => AuthorizationStatus::WriteOnly,
            (GrantPolicy::Deny, _) => AuthorizationStatus::Denied,
            (GrantPolicy::Restricted, _) => AuthorizationStatus::Restricted,
        }
    }
}

#[async_trait]
impl EventStore for LocalEventStore {
    async fn authorization_status(&self) -> AuthorizationStatus {
        self.inner.lock().await.status
    }

    async fn request_access(&self, level: AccessLevel) -> Result<bool, EventStoreError> {
        let mut inner = self.inner.lock().await;
        match inner.status {
            AuthorizationStatus::NotDetermined => {
                let granted = self.grant(level);
                inner.status = granted;
                info!("Calendar access prompt resolved to: {}", granted.as_text());
                match level {
                    AccessLevel::Full => Ok(granted.is_full_access()),
                    AccessLevel::WriteOnly => Ok(granted.allows_writing()),
                }
            }
            AuthorizationStatus::Restricted => Err(EventStoreError::Restricted),
            current => {
                // Settings already decided; no second prompt.
                match level {
                    AccessLevel::Full => Ok(current.is_full_access()),
                    AccessLevel::WriteOnly => Ok(current.allows_writing()),
                }
            }
        }
    }

    async fn create_event(
        &self,
        title: &str,
        calendar: Option<&str>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        recurrence: Option<RecurrenceRule>,
    ) -> Result<Event, EventStoreError> {
        let calendar = calendar
            .map(str::to_string)
            .or_else(|| self.default_calendar.clone())
            .ok_or(EventStoreError::NoWritableCalendar)?;

        Ok(Event {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            calendar,
            start,
            end,
            recurrence,
        })
    }

    async fn save_event(&self, event: Event, span: EventSpan) -> Result<(), EventStoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.status.allows_writing() {
            return Err(EventStoreError::SaveFailed(
                "write access to the calendar store has not been granted".to_string(),
            ));
        }
        if inner.events.len() >= MAX_EVENT_COUNT {
            return Err(EventStoreError::SaveFailed("the calendar store is full".to_string()));
        }

        debug!("Saving event '{}' with span {:?}", event.title, span);
        let mut staged = inner.events.clone();
        staged.insert(event.id.clone(), event);
        write_events(&self.events_path(), &staged)
            .map_err(|e| EventStoreError::Storage(e.to_string()))?;
        inner.events = staged;
        Ok(())
    }

    async fn fetch_events(&self, range: DateRange) -> Vec<Event> {
        let inner = self.inner.lock().await;
        if !inner.status.is_full_access() {
            return Vec::new();
        }
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|event| range.contains(event.start))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        events
    }

    async fn remove_events(&self, ids: &[String]) -> Result<(), EventStoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.status.is_full_access() {
            return Err(EventStoreError::Storage(
                "full access is required to delete events".to_string(),
            ));
        }

        // Stage the whole batch before committing anything; a failure
        // mid-batch discards the staged removals.
        let mut staged = inner.events.clone();
        for id in ids {
            if staged.remove(id).is_none() {
                error!("Removal batch failed at event {}", id);
                return Err(EventStoreError::DeleteFailed {
                    event: id.clone(),
                    reason: "event not found".to_string(),
                });
            }
        }

        write_events(&self.events_path(), &staged)
            .map_err(|e| EventStoreError::Storage(e.to_string()))?;
        inner.events = staged;
        info!("Removed {} event(s)", ids.len());
        Ok(())
    }
}

fn load_events(path: &Path) -> Result<HashMap<String, Event>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(anyhow!("Events file exceeds size limits"));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let events: Vec<Event> =
        serde_json::from_reader(reader).map_err(|e| anyhow!("Failed to parse events: {}", e))?;
    if events.len() > MAX_EVENT_COUNT {
        return Err(anyhow!("Too many events in file (maximum {})", MAX_EVENT_COUNT));
    }

    Ok(events.into_iter().map(|event| (event.id.clone(), event)).collect())
}

fn write_events(path: &Path, events: &HashMap<String, Event>) -> Result<()> {
    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    let writer = BufWriter::new(file);

    let mut sorted: Vec<&Event> = events.values().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    serde_json::to_writer_pretty(writer, &sorted)?;
    Ok(())
}
