pub mod config;
pub mod event_store;
pub mod lesson;
pub mod model;
pub mod validation;

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

// Re-export commonly used types
pub use config::Config;
pub use event_store::{EventStore, EventStoreManager, LocalEventStore};
pub use lesson::Lesson;
pub use model::LessonModel;
