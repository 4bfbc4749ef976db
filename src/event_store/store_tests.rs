use crate::event_store::*;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn store(dir: &TempDir, policy: GrantPolicy) -> LocalEventStore {
    LocalEventStore::with_state_dir(
        dir.path().to_path_buf(),
        policy,
        Some("Personal".to_string()),
    )
    .unwrap()
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
}

async fn saved_event(store: &LocalEventStore, title: &str, hour: u32) -> Event {
    let start = at(2024, 1, 10, hour);
    let event = store
        .create_event(title, None, start, start + chrono::Duration::minutes(30), None)
        .await
        .unwrap();
    store.save_event(event.clone(), EventSpan::FutureEvents).await.unwrap();
    event
}

#[tokio::test]
async fn full_grant_policy_grants_the_requested_level() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysFull);

    assert_eq!(store.authorization_status().await, AuthorizationStatus::NotDetermined);
    assert!(store.request_access(AccessLevel::Full).await.unwrap());
    assert_eq!(store.authorization_status().await, AuthorizationStatus::FullAccess);
}

#[tokio::test]
async fn write_only_grant_refuses_a_full_access_request() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysWriteOnly);

    assert!(!store.request_access(AccessLevel::Full).await.unwrap());
    assert_eq!(store.authorization_status().await, AuthorizationStatus::WriteOnly);

    // The prompt already resolved; a later write-only request just reports
    // the standing grant.
    assert!(store.request_access(AccessLevel::WriteOnly).await.unwrap());
}

#[tokio::test]
async fn deny_policy_settles_on_denied() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::Deny);

    assert!(!store.request_access(AccessLevel::WriteOnly).await.unwrap());
    assert_eq!(store.authorization_status().await, AuthorizationStatus::Denied);
}

#[tokio::test]
async fn restricted_policy_is_visible_without_a_prompt() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::Restricted);

    assert_eq!(store.authorization_status().await, AuthorizationStatus::Restricted);
    assert!(matches!(
        store.request_access(AccessLevel::Full).await,
        Err(EventStoreError::Restricted)
    ));
}

#[tokio::test]
async fn saving_requires_a_write_grant() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysFull);
    let start = at(2024, 1, 10, 12);
    let event = store
        .create_event("Swim 205", None, start, start + chrono::Duration::minutes(30), None)
        .await
        .unwrap();

    let result = store.save_event(event, EventSpan::FutureEvents).await;
    assert!(matches!(result, Err(EventStoreError::SaveFailed(_))));
}

#[tokio::test]
async fn create_without_any_calendar_fails() {
    let dir = TempDir::new().unwrap();
    let store =
        LocalEventStore::with_state_dir(dir.path().to_path_buf(), GrantPolicy::AlwaysFull, None)
            .unwrap();
    let start = at(2024, 1, 10, 12);

    let result = store.create_event("Swim 205", None, start, start, None).await;
    assert!(matches!(result, Err(EventStoreError::NoWritableCalendar)));
}

#[tokio::test]
async fn fetch_returns_saved_events_in_ascending_order() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysFull);
    store.request_access(AccessLevel::Full).await.unwrap();

    let late = saved_event(&store, "Swim 302", 15).await;
    let early = saved_event(&store, "Swim 205", 9).await;

    let events = store.fetch_events(DateRange::month_ahead(at(2024, 1, 1, 0))).await;
    assert_eq!(events, vec![early, late]);
}

#[tokio::test]
async fn fetch_is_empty_without_full_access() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysWriteOnly);
    store.request_access(AccessLevel::WriteOnly).await.unwrap();
    saved_event(&store, "Swim 205", 12).await;

    // Write-only callers get an empty list, never an authorization error.
    assert!(store.fetch_events(DateRange::month_ahead(at(2024, 1, 1, 0))).await.is_empty());
}

#[tokio::test]
async fn fetch_excludes_events_outside_the_range() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysFull);
    store.request_access(AccessLevel::Full).await.unwrap();
    saved_event(&store, "Swim 205", 12).await;

    let range = DateRange::month_ahead(at(2024, 3, 1, 0));
    assert!(store.fetch_events(range).await.is_empty());
}

#[tokio::test]
async fn batch_removal_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysFull);
    store.request_access(AccessLevel::Full).await.unwrap();

    let first = saved_event(&store, "Swim 205", 9).await;
    let second = saved_event(&store, "Swim 206", 12).await;
    let third = saved_event(&store, "Swim 302", 15).await;

    let ids = vec![first.id.clone(), "no-such-event".to_string(), third.id.clone()];
    let err = store.remove_events(&ids).await.unwrap_err();

    match err {
        EventStoreError::DeleteFailed { event, .. } => assert_eq!(event, "no-such-event"),
        other => panic!("unexpected error: {:?}", other),
    }

    // Nothing committed: all three events survive the failed batch.
    let events = store.fetch_events(DateRange::month_ahead(at(2024, 1, 1, 0))).await;
    assert_eq!(events, vec![first, second, third]);
}

#[tokio::test]
async fn successful_batch_removal_commits_every_event() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir, GrantPolicy::AlwaysFull);
    store.request_access(AccessLevel::Full).await.unwrap();

    let first = saved_event(&store, "Swim 205", 9).await;
    let second = saved_event(&store, "Swim 206", 12).await;

    store.remove_events(&[first.id, second.id]).await.unwrap();
    assert!(store.fetch_events(DateRange::month_ahead(at(2024, 1, 1, 0))).await.is_empty());
}

#[tokio::test]
async fn events_survive_a_store_restart() {
    let dir = TempDir::new().unwrap();
    let saved = {
        let store = store(&dir, GrantPolicy::AlwaysFull);
        store.request_access(AccessLevel::Full).await.unwrap();
        saved_event(&store, "Swim 205", 12).await
    };

    let reopened = store(&dir, GrantPolicy::AlwaysFull);
    reopened.request_access(AccessLevel::Full).await.unwrap();
    let events = reopened.fetch_events(DateRange::month_ahead(at(2024, 1, 1, 0))).await;
    assert_eq!(events, vec![saved]);
}

#[tokio::test]
async fn corrupt_events_file_starts_an_empty_store() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("events.json"), "{ garbage").unwrap();

    let store = store(&dir, GrantPolicy::AlwaysFull);
    store.request_access(AccessLevel::Full).await.unwrap();
    assert!(store.fetch_events(DateRange::month_ahead(at(2024, 1, 1, 0))).await.is_empty());
}

#[tokio::test]
async fn manager_verify_flows_map_status_to_errors() {
    let dir = TempDir::new().unwrap();
    let manager = EventStoreManager::new(Arc::new(store(&dir, GrantPolicy::Deny)));

    // The first setup prompts; the user declining is not an error, just an
    // ungranted status.
    manager.setup_full_access(at(2024, 1, 1, 0)).await.unwrap();
    assert_eq!(manager.authorization_status(), AuthorizationStatus::Denied);
    assert!(manager.events().is_empty());

    // Once Settings settled on denied, a later verify surfaces the typed
    // error.
    let err = manager.setup_full_access(at(2024, 1, 1, 0)).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<EventStoreError>(), Some(EventStoreError::Denied)));
}

#[tokio::test]
async fn manager_full_access_over_a_write_only_grant_asks_for_an_upgrade() {
    let dir = TempDir::new().unwrap();
    let manager = EventStoreManager::new(Arc::new(store(&dir, GrantPolicy::AlwaysWriteOnly)));

    manager.setup_write_only().await.unwrap();
    assert_eq!(manager.authorization_status(), AuthorizationStatus::WriteOnly);
    assert!(manager.is_write_only_or_full_access());

    let err = manager.setup_full_access(at(2024, 1, 1, 0)).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<EventStoreError>(), Some(EventStoreError::Upgrade)));
}

#[test]
fn month_ahead_range_spans_one_month() {
    let from = at(2024, 1, 15, 8);
    let range = DateRange::month_ahead(from);

    assert_eq!(range.end, at(2024, 2, 15, 8));
    assert!(range.contains(from));
    assert!(range.contains(at(2024, 2, 1, 0)));
    assert!(!range.contains(range.end));
    assert!(!range.contains(at(2023, 12, 31, 23)));
}
