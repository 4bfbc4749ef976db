use anyhow::Result;
use chrono::{Datelike, Local, NaiveDateTime, NaiveTime};
use env_logger::Env;
use log::{error, info, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

use poolbook::config::Config;
use poolbook::event_store::{EventStoreManager, LocalEventStore};
use poolbook::lesson::{load_catalog, Lesson, LessonDay, LessonKind};
use poolbook::model::LessonModel;
use poolbook::validation;

/// Command line arguments structure
#[derive(Debug)]
struct CommandArgs {
    command: String,
    args: Vec<String>,
    flags: std::collections::HashMap<String, Option<String>>,
}

impl CommandArgs {
    fn parse(input: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;

        for c in input.chars() {
            match c {
                '"' => {
                    in_quotes = !in_quotes;
                    if !in_quotes && !current.is_empty() {
                        parts.push(current.clone());
                        current.clear();
                    }
                }
                ' ' if !in_quotes => {
                    if !current.is_empty() {
                        parts.push(current.clone());
                        current.clear();
                    }
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            parts.push(current);
        }

        if parts.is_empty() {
            return Err(anyhow::anyhow!("No command provided"));
        }

        let command = parts.remove(0);
        let mut args = Vec::new();
        let mut flags = std::collections::HashMap::new();
        let mut i = 0;

        while i < parts.len() {
            if parts[i].starts_with("--") {
                let flag = parts[i].clone();
                if i + 1 < parts.len() && !parts[i + 1].starts_with("--") {
                    flags.insert(flag, Some(parts[i + 1].clone()));
                    i += 1;
                } else {
                    flags.insert(flag, None);
                }
            } else {
                args.push(parts[i].clone());
            }
            i += 1;
        }

        Ok(CommandArgs { command, args, flags })
    }
}

struct App {
    model: LessonModel,
    manager: EventStoreManager,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with custom format
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    info!("Starting Poolbook Terminal");

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Falling back to default config: {}", e);
        Config::default()
    });

    let catalog = load_catalog(&config.catalog_path());
    if catalog.is_empty() {
        warn!("Lesson catalog is empty; booking commands will have nothing to offer");
    }

    let store = LocalEventStore::new(
        config.access.grant_policy,
        config.calendar.default_calendar.clone(),
    )?;
    let mut app = App {
        model: LessonModel::new(catalog, Local::now().date_naive()),
        manager: EventStoreManager::new(Arc::new(store)),
    };

    let mut rl = DefaultEditor::new()?;
    println!("Welcome to Poolbook! Type 'help' for commands.");

    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(err) = app.process_command(&line).await {
                    error!("Failed to process command: {:?}", err);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

impl App {
    async fn process_command(&mut self, command: &str) -> Result<()> {
        let args = CommandArgs::parse(command)?;

        match args.command.as_str() {
            "lessons" => {
                self.print_lessons();
                Ok(())
            }
            "dropin" => {
                self.print_dropins();
                Ok(())
            }
            "repeating" => {
                self.print_repeating();
                Ok(())
            }
            "date" => {
                if args.args.len() != 1 {
                    println!("Usage: date <YYYY-MM-DD>");
                    return Ok(());
                }
                self.pick_date(&args.args[0]);
                Ok(())
            }
            "select" => {
                if args.args.len() != 1 {
                    println!("Usage: select <lesson-name>");
                    return Ok(());
                }
                self.select_lesson(&args.args[0]);
                Ok(())
            }
            "cancel" => {
                self.model.clear_selection();
                println!("Selection cleared.");
                Ok(())
            }
            "book" => self.book(args).await,
            "auth" => self.authorize(args).await,
            "status" => {
                println!(
                    "Calendar access: {}",
                    self.manager.authorization_status().as_text()
                );
                Ok(())
            }
            "events" => self.list_events().await,
            "refresh" => {
                self.manager.refresh_events(now()).await;
                println!("Fetched {} upcoming event(s).", self.manager.events().len());
                Ok(())
            }
            "delete" => self.delete_events(args).await,
            "help" => {
                println!("Available commands:");
                println!("  lessons - Show the whole lesson catalog");
                println!("  dropin - Show drop-in lessons for the selected date");
                println!("  repeating - Show repeating lessons");
                println!("  date <YYYY-MM-DD> - Pick a booking date (today through one month out)");
                println!("  select <name> - Select a lesson to book");
                println!("  cancel - Clear the pending selection");
                println!("  book [name] [--calendar <name>] - Book the selected lesson");
                println!("  auth <full|write-only> - Request calendar access");
                println!("  status - Show the current calendar access level");
                println!("  events - List upcoming events (needs full access)");
                println!("  refresh - Re-fetch upcoming events");
                println!("  delete <event-id>... - Delete upcoming events by id (prefixes work)");
                println!("  help - Show this help");
                println!("  exit - Exit the application");
                Ok(())
            }
            "exit" => {
                std::process::exit(0);
            }
            _ => {
                println!("Unknown command. Type 'help' for available commands.");
                Ok(())
            }
        }
    }

    fn print_lessons(&self) {
        self.print_dropins();
        self.print_repeating();
    }

    fn print_dropins(&self) {
        let day = LessonDay::from_weekday(self.model.selected_date().weekday());
        println!("Drop-in lessons on {} ({}):", self.model.selected_date(), day.name());
        let lessons = self.model.dropin_lessons();
        if lessons.is_empty() {
            println!("  No drop-in lessons on this day.");
        }
        for lesson in lessons {
            println!("  - {} ({})", lesson.title(), lesson.time_range_as_text());
        }
    }

    fn print_repeating(&self) {
        println!("Repeating lessons:");
        for lesson in self.model.repeating_lessons() {
            println!(
                "  - {} on {} at {} ({})",
                lesson.title(),
                lesson.days_as_text(),
                lesson.start_time_as_text(),
                lesson.occurrence_count_as_text()
            );
        }
    }

    fn pick_date(&mut self, input: &str) {
        match validation::parse_picked_date(input, Local::now().date_naive()) {
            Ok(date) => {
                self.model.set_selected_date(date);
                self.print_dropins();
            }
            Err(message) => println!("{}", message),
        }
    }

    fn select_lesson(&mut self, name: &str) {
        match self.model.select(name) {
            Some(lesson) => println!("{} starting at {}", lesson.booking_label(), lesson.start_time_as_text()),
            None => println!("No lesson named '{}' in the catalog.", name),
        }
    }

    async fn book(&mut self, args: CommandArgs) -> Result<()> {
        let lesson: Option<Lesson> = match args.args.first() {
            Some(name) => self.model.select(name),
            None => self.model.pending_selection().cloned(),
        };
        let Some(lesson) = lesson else {
            println!("Nothing selected. Usage: book [name] [--calendar <name>]");
            return Ok(());
        };

        if !self.manager.is_write_only_or_full_access() {
            println!("Calendar access has not been granted. Run 'auth write-only' or 'auth full' first.");
            return Ok(());
        }

        if lesson.kind == LessonKind::Single {
            let day = LessonDay::from_weekday(self.model.selected_date().weekday());
            if !lesson.days.contains(&day) {
                println!(
                    "{} is not offered on {}. It runs on {}.",
                    lesson.title(),
                    day.name(),
                    lesson.days_as_text()
                );
                return Ok(());
            }
        }

        let reference = match lesson.kind {
            LessonKind::Single => self.model.selected_date().and_time(NaiveTime::MIN),
            LessonKind::Recurring => now(),
        };
        let calendar = args.flags.get("--calendar").and_then(|v| v.as_deref());

        let result = self.manager.book_lesson(&lesson, reference, calendar).await;
        // Win or lose, the booking attempt consumes the selection.
        self.model.clear_selection();
        match result {
            Ok(event) => {
                println!(
                    "Booked {} on {} ({} to {}).",
                    event.title,
                    event.start.format("%Y-%m-%d"),
                    event.start.format("%-I:%M %p"),
                    event.end.format("%-I:%M %p")
                );
                if self.manager.authorization_status().is_full_access() {
                    self.manager.refresh_events(now()).await;
                }
            }
            Err(e) => println!("Booking failed: {}", e),
        }
        Ok(())
    }

    async fn authorize(&mut self, args: CommandArgs) -> Result<()> {
        let level = args.args.first().map(String::as_str).unwrap_or("");
        let result = match level {
            "full" => self.manager.setup_full_access(now()).await,
            "write-only" => self.manager.setup_write_only().await,
            _ => {
                println!("Usage: auth <full|write-only>");
                return Ok(());
            }
        };

        match result {
            Ok(()) => println!(
                "Calendar access: {}",
                self.manager.authorization_status().as_text()
            ),
            Err(e) => println!("{}", e),
        }
        Ok(())
    }

    async fn list_events(&mut self) -> Result<()> {
        if !self.manager.authorization_status().is_full_access() {
            println!("Upcoming events need full calendar access. Run 'auth full' first.");
            return Ok(());
        }
        self.manager.refresh_events(now()).await;
        let events = self.manager.events();
        if events.is_empty() {
            println!("No upcoming events in the next month.");
            return Ok(());
        }
        println!("Upcoming events:");
        for event in events {
            println!("  {}", event.display());
        }
        Ok(())
    }

    async fn delete_events(&mut self, args: CommandArgs) -> Result<()> {
        if args.args.is_empty() {
            println!("Usage: delete <event-id>...");
            return Ok(());
        }
        if !self.manager.authorization_status().is_full_access() {
            println!("Deleting events needs full calendar access. Run 'auth full' first.");
            return Ok(());
        }

        let known = self.manager.events();
        let mut ids = Vec::new();
        for arg in &args.args {
            let matches: Vec<&str> = known
                .iter()
                .filter(|event| event.id.starts_with(arg.as_str()))
                .map(|event| event.id.as_str())
                .collect();
            match matches.as_slice() {
                [id] => ids.push((*id).to_string()),
                [] => ids.push(arg.clone()),
                _ => {
                    println!("Event id '{}' is ambiguous; give more characters.", arg);
                    return Ok(());
                }
            }
        }

        match self.manager.remove_events(&ids, now()).await {
            Ok(()) => println!("Deleted {} event(s).", ids.len()),
            Err(e) => println!("{}", e),
        }
        Ok(())
    }
}
