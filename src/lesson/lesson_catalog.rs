//! Loading and validation of the bundled lesson catalog.

use crate::lesson::{Lesson, LessonKind};
use log::{error, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Maximum allowed size for the catalog file before parsing (1MB)
const MAX_CATALOG_SIZE: u64 = 1024 * 1024;

const SECONDS_PER_DAY: u32 = 86_400;

/// Custom error type for catalog loading
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Catalog file exceeds size limits")]
    TooLarge,
}

/// Loads the lesson catalog from the given path.
///
/// A missing or malformed file degrades to an empty catalog rather than
/// failing startup. Entries that parse but violate the lesson invariants
/// are dropped with a warning.
pub fn load_catalog(path: &Path) -> Vec<Lesson> {
    match read_catalog(path) {
        Ok(lessons) => {
            let mut seen_names: HashSet<String> = HashSet::new();
            lessons
                .into_iter()
                .filter(|lesson| {
                    if let Err(reason) = validate_lesson(lesson) {
                        warn!("Dropping catalog entry '{}': {}", lesson.name, reason);
                        return false;
                    }
                    if !seen_names.insert(lesson.name.clone()) {
                        warn!("Dropping catalog entry '{}': duplicate name", lesson.name);
                        return false;
                    }
                    true
                })
                .collect()
        }
        Err(e) => {
            error!("Failed to load lesson catalog from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn read_catalog(path: &Path) -> Result<Vec<Lesson>, CatalogError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_CATALOG_SIZE {
        return Err(CatalogError::TooLarge);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lessons: Vec<Lesson> = serde_json::from_reader(reader)?;
    Ok(lessons)
}

/// Checks a single catalog entry against the lesson invariants.
pub fn validate_lesson(lesson: &Lesson) -> Result<(), String> {
    if lesson.name.trim().is_empty() {
        return Err("lesson name is empty".to_string());
    }
    if lesson.days.is_empty() {
        return Err("lesson has no scheduled days".to_string());
    }
    if lesson.start_at >= SECONDS_PER_DAY {
        return Err(format!("start time {} is past midnight", lesson.start_at));
    }
    match lesson.kind {
        LessonKind::Single => {
            if lesson.repeats.is_some()
                || lesson.interval.is_some()
                || lesson.occurrence_count.is_some()
            {
                return Err("single lesson carries recurrence fields".to_string());
            }
        }
        LessonKind::Recurring => {
            if lesson.repeats.is_none() {
                return Err("recurring lesson is missing its frequency".to_string());
            }
            match lesson.interval {
                None => return Err("recurring lesson is missing its interval".to_string()),
                Some(0) => return Err("recurrence interval must be positive".to_string()),
                Some(_) => {}
            }
            match lesson.occurrence_count {
                None => {
                    return Err("recurring lesson is missing its occurrence count".to_string())
                }
                Some(0) => return Err("occurrence count must be positive".to_string()),
                Some(_) => {}
            }
        }
    }
    Ok(())
}
