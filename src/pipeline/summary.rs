use crate::types::Event;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub id: i64,
    pub hash_id: String,
    pub original_event_id: u32,
    pub start_date: NaiveDate,
    pub name: String,
}

impl From<&Event> for EventInfo {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            hash_id: event.hash_id.clone(),
            original_event_id: event.original_event_id,
            start_date: event.start_date,
            name: event.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipInfo {
    pub original_event_id: u32,
    pub start_date: NaiveDate,
    pub reason: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub original_event_id: u32,
    pub name: String,
    pub reason: String,
}

/// Outcome of one scraped record, as passed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ImportProgress {
    Created(EventInfo),
    Updated(EventInfo),
    Skipped(SkipInfo),
    Error(ErrorInfo),
}

impl ImportProgress {
    pub fn kind(&self) -> &'static str {
        match self {
            ImportProgress::Created(_) => "created",
            ImportProgress::Updated(_) => "updated",
            ImportProgress::Skipped(_) => "skipped",
            ImportProgress::Error(_) => "error",
        }
    }
}

/// One line per outcome, as printed by the CLI.
impl fmt::Display for ImportProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportProgress::Created(info) => write!(
                f,
                "+ created {} #{} ({}) {} {}",
                info.hash_id, info.id, info.original_event_id, info.start_date, info.name
            ),
            ImportProgress::Updated(info) => write!(
                f,
                "~ updated {} #{} ({}) {} {}",
                info.hash_id, info.id, info.original_event_id, info.start_date, info.name
            ),
            ImportProgress::Skipped(info) => write!(
                f,
                "- skipped ({}) {} {}: {}",
                info.original_event_id,
                info.start_date,
                info.name.as_deref().unwrap_or(""),
                info.reason
            ),
            ImportProgress::Error(info) => write!(
                f,
                "! error ({}) {}: {}",
                info.original_event_id, info.name, info.reason
            ),
        }
    }
}

/// Outcomes of an import run, each list kept in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRunSummary {
    created: Vec<EventInfo>,
    updated: Vec<EventInfo>,
    skipped: Vec<SkipInfo>,
    errors: Vec<ErrorInfo>,
}

impl ImportRunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&mut self, event: &Event) -> ImportProgress {
        let info = EventInfo::from(event);
        self.created.push(info.clone());
        ImportProgress::Created(info)
    }

    pub fn record_updated(&mut self, event: &Event) -> ImportProgress {
        let info = EventInfo::from(event);
        self.updated.push(info.clone());
        ImportProgress::Updated(info)
    }

    pub fn record_skipped(
        &mut self,
        original_event_id: u32,
        start_date: NaiveDate,
        reason: &str,
        name: Option<&str>,
    ) -> ImportProgress {
        let info = SkipInfo {
            original_event_id,
            start_date,
            reason: reason.to_string(),
            name: name.map(str::to_string),
        };
        self.skipped.push(info.clone());
        ImportProgress::Skipped(info)
    }

    pub fn record_error(
        &mut self,
        original_event_id: u32,
        name: &str,
        reason: impl fmt::Display,
    ) -> ImportProgress {
        let info = ErrorInfo {
            original_event_id,
            name: name.to_string(),
            reason: reason.to_string(),
        };
        self.errors.push(info.clone());
        ImportProgress::Error(info)
    }

    pub fn created(&self) -> &[EventInfo] {
        &self.created
    }

    pub fn updated(&self) -> &[EventInfo] {
        &self.updated
    }

    pub fn skipped(&self) -> &[SkipInfo] {
        &self.skipped
    }

    pub fn errors(&self) -> &[ErrorInfo] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.skipped.len() + self.errors.len()
    }
}

impl fmt::Display for ImportRunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} errors",
            self.created.len(),
            self.updated.len(),
            self.skipped.len(),
            self.errors.len()
        )
    }
}
