use super::fold_accents;
use crate::error::DateParseError;
use crate::types::DateRange;
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

// "<fromDay>[er] [fromMonth] au <toDay> <toMonth> [year]", matched on folded lowercase text
static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)[a-z]*\s*([a-z]+)?\s*au\s*(\d+)[a-z]*\s*([a-z]+)(?:\s*(\d{4}))?")
        .expect("date range pattern is valid")
});

/// Parses the calendar's free-text French date ranges.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateRangeParser;

impl DateRangeParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw`, defaulting a missing year to the current local year.
    pub fn parse(&self, raw: &str) -> Result<DateRange, DateParseError> {
        self.parse_with_year(raw, Local::now().year())
    }

    pub fn parse_with_year(
        &self,
        raw: &str,
        default_year: i32,
    ) -> Result<DateRange, DateParseError> {
        let normalized = fold_accents(&raw.trim().to_lowercase());
        let caps = DATE_RANGE_RE
            .captures(&normalized)
            .ok_or_else(|| DateParseError::Unrecognized(raw.to_string()))?;

        let from_day = parse_number(caps.get(1).map(|m| m.as_str()), raw)?;
        let to_day = parse_number(caps.get(3).map(|m| m.as_str()), raw)?;
        let to_month_name = caps.get(4).map(|m| m.as_str()).unwrap_or_default();
        // "27 au 29 octobre": both ends share the closing month
        let from_month_name = caps.get(2).map(|m| m.as_str()).unwrap_or(to_month_name);

        let from_month = month_number(from_month_name, raw)?;
        let to_month = month_number(to_month_name, raw)?;

        let year = match caps.get(5) {
            Some(m) => m
                .as_str()
                .parse::<i32>()
                .map_err(|_| DateParseError::Unrecognized(raw.to_string()))?,
            None => default_year,
        };

        // An end earlier in the calendar than the start belongs to the next year,
        // so "29 février" is checked against that year rather than the start's.
        let end_year = if (to_month, to_day) < (from_month, from_day) {
            year + 1
        } else {
            year
        };
        let start = NaiveDate::from_ymd_opt(year, from_month, from_day)
            .ok_or_else(|| DateParseError::InvalidDate(raw.to_string()))?;
        let end = NaiveDate::from_ymd_opt(end_year, to_month, to_day)
            .ok_or_else(|| DateParseError::InvalidDate(raw.to_string()))?;

        let days = (end - start).num_days() + 1;
        let days = u32::try_from(days.max(1)).unwrap_or(u32::MAX);

        Ok(DateRange::new(start, days))
    }
}

fn parse_number(value: Option<&str>, raw: &str) -> Result<u32, DateParseError> {
    value
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| DateParseError::Unrecognized(raw.to_string()))
}

fn month_number(name: &str, raw: &str) -> Result<u32, DateParseError> {
    let month = match name {
        "janvier" => 1,
        "fevrier" => 2,
        "mars" => 3,
        "avril" => 4,
        "mai" => 5,
        "juin" => 6,
        "juillet" => 7,
        "aout" => 8,
        "septembre" => 9,
        "octobre" => 10,
        "novembre" => 11,
        "decembre" => 12,
        _ => {
            return Err(DateParseError::UnknownMonth {
                month: name.to_string(),
                raw: raw.to_string(),
            })
        }
    };
    Ok(month)
}
