//! Scraper for the activity calendar of the main retreat site.

pub mod crawler;
pub mod parser;

pub use crawler::CalendarSource;
pub use parser::EventParser;
