use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One calendar card as scraped from the upstream site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedEvent {
    pub image_path: String,
    /// Free-text French date range, e.g. "27 au 29 octobre 2023"
    pub date: String,
    pub name: String,
    pub original_event_id: u32,
    /// Free-text category label, e.g. "Rencontre en résidentiel"
    pub type_label: String,
    pub map_link: String,
    pub location_name: String,
}

/// A parsed date range. `days` is never below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub days: u32,
}

const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

impl DateRange {
    pub fn new(start_date: NaiveDate, days: u32) -> Self {
        Self {
            start_date,
            days: days.max(1),
        }
    }

    /// Last day of the range, inclusive.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Duration::days(i64::from(self.days) - 1)
    }
}

/// Renders the range the way the upstream calendar writes it.
impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start_date;
        let end = self.end_date();
        let start_month = FRENCH_MONTHS[start.month0() as usize];
        let end_month = FRENCH_MONTHS[end.month0() as usize];
        if start == end {
            write!(f, "{} {}", start.day(), start_month)
        } else if start.month() == end.month() && start.year() == end.year() {
            write!(f, "{} au {} {}", start.day(), end.day(), end_month)
        } else {
            write!(f, "{} {} au {} {}", start.day(), start_month, end.day(), end_month)
        }
    }
}

/// Location extracted from a Google Maps link. Extraction misses are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleMapsLocation {
    pub original_url: String,
    pub resolved_url: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Retreat,
    Seminar,
    SilentRetreat,
}

impl Category {
    /// Map the upstream free-text label onto a canonical category.
    pub fn from_label(label: &str) -> Self {
        let value = label.to_lowercase();
        if value.contains("silence") {
            Category::SilentRetreat
        } else if value.contains("résidentiel") || value.contains("residentiel") {
            Category::Retreat
        } else {
            Category::Seminar
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Retreat => "retreat",
            Category::Seminar => "seminar",
            Category::SilentRetreat => "silent-retreat",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "retreat" => Some(Category::Retreat),
            "seminar" => Some(Category::Seminar),
            "silent-retreat" => Some(Category::SilentRetreat),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an imported event: the upstream id plus its start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub original_event_id: u32,
    pub start_date: NaiveDate,
}

/// Mutable attributes written by an import upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub name: String,
    pub category: Category,
    pub days: u32,
    pub image_id: i64,
    pub location_name: String,
    pub location_address: String,
    pub original_link: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub hash_id: String,
    pub original_event_id: u32,
    pub start_date: NaiveDate,
    pub name: String,
    pub category: Category,
    pub days: u32,
    pub image_id: i64,
    pub location_name: String,
    pub location_address: String,
    pub original_link: String,
    pub latitude: f64,
    pub longitude: f64,
    pub private: bool,
}

impl Event {
    pub fn key(&self) -> EventKey {
        EventKey {
            original_event_id: self.original_event_id,
            start_date: self.start_date,
        }
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.days)
    }

    /// Day after the last event day; offer owner tokens expire here.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Duration::days(i64::from(self.days))
    }

    /// Public listing only shows events starting at least two days out.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        !self.private && self.start_date >= today + Duration::days(2)
    }

    pub fn apply(&mut self, data: EventData) {
        self.name = data.name;
        self.category = data.category;
        self.days = data.days;
        self.image_id = data.image_id;
        self.location_name = data.location_name;
        self.location_address = data.location_address;
        self.original_link = data.original_link;
        self.latitude = data.latitude;
        self.longitude = data.longitude;
    }
}

/// A stored picture, deduplicated by the CRC32 of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub name: String,
    pub crc32: u32,
}
