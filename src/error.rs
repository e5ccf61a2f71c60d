use thiserror::Error;

/// Errors raised by the import pipeline.
///
/// Only a calendar fetch failure escapes a run; every other variant is
/// caught per record and written to the run summary.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to fetch calendar from {url} (HTTP {status})")]
    Fetch { url: String, status: u16 },

    #[error("Calendar at {url} returned an empty page")]
    EmptyCalendar { url: String },

    #[error("Failed to download image from {url} (HTTP {status})")]
    Download { url: String, status: u16 },

    #[error("Image {url} returned an empty body")]
    EmptyImage { url: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Date parse error: {0}")]
    DateParse(#[from] DateParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Unable to parse date range \"{0}\"")]
    Unrecognized(String),

    #[error("Unsupported month \"{month}\" in date range \"{raw}\"")]
    UnknownMonth { month: String, raw: String },

    #[error("Invalid calendar date in date range \"{0}\"")]
    InvalidDate(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record {0} not found")]
    NotFound(i64),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OfferError {
    #[error("Location ({lat}, {lng}) is outside the supported area")]
    OutOfArea { lat: f64, lng: f64 },
}

pub type Result<T> = std::result::Result<T, ImportError>;
