use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::sync::Arc;
use tempfile::TempDir;

use poolbook::event_store::{
    AuthorizationStatus, EventStoreManager, GrantPolicy, LocalEventStore,
};
use poolbook::lesson::{
    Lesson, LessonDay, LessonKind, RecurrenceEnd, RecurrenceFrequency,
};
use poolbook::model::LessonModel;

fn manager_with(dir: &TempDir, policy: GrantPolicy) -> EventStoreManager {
    let store = LocalEventStore::with_state_dir(
        dir.path().to_path_buf(),
        policy,
        Some("Personal".to_string()),
    )
    .unwrap();
    EventStoreManager::new(Arc::new(store))
}

fn catalog() -> Vec<Lesson> {
    vec![Lesson::dropin_mock(), Lesson::repeating_mock()]
}

// 2024-01-01 was a Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn monday_morning() -> NaiveDateTime {
    monday().and_hms_opt(9, 0, 0).unwrap()
}

#[tokio::test]
async fn booking_a_dropin_lesson_lands_on_the_picked_monday() -> Result<()> {
    let dir = TempDir::new()?;
    let manager = manager_with(&dir, GrantPolicy::AlwaysFull);
    manager.setup_full_access(monday_morning()).await?;
    assert_eq!(manager.authorization_status(), AuthorizationStatus::FullAccess);

    let mut model = LessonModel::new(catalog(), monday());
    let lesson = model.select("205").expect("205 is in the catalog");
    assert_eq!(lesson.kind, LessonKind::Single);

    let event = manager.book_lesson(&lesson, monday_morning(), None).await?;
    model.clear_selection();

    assert_eq!(event.title, "Swim 205");
    assert_eq!(event.start, monday().and_hms_opt(12, 0, 0).unwrap());
    assert_eq!(event.end, monday().and_hms_opt(12, 30, 0).unwrap());
    assert_eq!(event.calendar, "Personal");
    assert!(event.recurrence.is_none());

    manager.refresh_events(monday_morning()).await;
    assert_eq!(manager.events(), vec![event]);
    Ok(())
}

#[tokio::test]
async fn booking_a_repeating_lesson_attaches_its_recurrence_rule() -> Result<()> {
    let dir = TempDir::new()?;
    let manager = manager_with(&dir, GrantPolicy::AlwaysFull);
    manager.setup_full_access(monday_morning()).await?;

    let event = manager
        .book_lesson(&Lesson::repeating_mock(), monday_morning(), Some("Swim Club"))
        .await?;

    // The next Friday after Monday the 1st is January 5th.
    assert_eq!(event.start, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(11, 5, 0).unwrap());
    assert_eq!(event.start.weekday(), Weekday::Fri);
    assert_eq!(event.calendar, "Swim Club");

    let rule = event.recurrence.expect("repeating lessons carry a rule");
    assert_eq!(rule.frequency, RecurrenceFrequency::Weekly);
    assert_eq!(rule.interval, 1);
    assert_eq!(rule.days_of_week, vec![LessonDay::Friday]);
    assert_eq!(rule.end, RecurrenceEnd::AfterOccurrences(8));
    Ok(())
}

#[tokio::test]
async fn write_only_access_can_book_but_not_list() -> Result<()> {
    let dir = TempDir::new()?;
    let manager = manager_with(&dir, GrantPolicy::AlwaysWriteOnly);
    manager.setup_write_only().await?;
    assert_eq!(manager.authorization_status(), AuthorizationStatus::WriteOnly);
    assert!(manager.is_write_only_or_full_access());

    manager.book_lesson(&Lesson::dropin_mock(), monday_morning(), None).await?;

    manager.refresh_events(monday_morning()).await;
    assert!(manager.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn booking_without_any_grant_fails_and_saves_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let manager = manager_with(&dir, GrantPolicy::AlwaysFull);

    let result = manager.book_lesson(&Lesson::dropin_mock(), monday_morning(), None).await;
    assert!(result.is_err());

    // Grant access afterwards: the failed booking must not have left an
    // event behind.
    manager.setup_full_access(monday_morning()).await?;
    assert!(manager.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_batch_deletion_keeps_the_published_list_intact() -> Result<()> {
    let dir = TempDir::new()?;
    let manager = manager_with(&dir, GrantPolicy::AlwaysFull);
    manager.setup_full_access(monday_morning()).await?;

    let first = manager.book_lesson(&Lesson::dropin_mock(), monday_morning(), None).await?;
    let second = manager
        .book_lesson(&Lesson::repeating_mock(), monday_morning(), None)
        .await?;
    manager.refresh_events(monday_morning()).await;
    assert_eq!(manager.events().len(), 2);

    let ids = vec![first.id.clone(), "bogus".to_string(), second.id.clone()];
    let err = manager.remove_events(&ids, monday_morning()).await.unwrap_err();
    assert!(err.to_string().contains("bogus"));
    assert_eq!(manager.events().len(), 2);

    manager.remove_events(&[first.id, second.id], monday_morning()).await?;
    assert!(manager.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn restricted_device_surfaces_a_typed_message() -> Result<()> {
    let dir = TempDir::new()?;
    let manager = manager_with(&dir, GrantPolicy::Restricted);

    let err = manager.setup_full_access(monday_morning()).await.unwrap_err();
    assert!(err.to_string().contains("doesn't allow access"));
    Ok(())
}
