/// Upstream site and calendar constants shared across the importer.

// Main site hosting the activity calendar and event pictures
pub const DEFAULT_MAIN_SITE: &str = "https://eveilspirituel.net";
pub const CALENDAR_PATH: &str = "/calendrier-activites.asp";

// Category filter posted to the calendar page (retreats, seminars, silent retreats)
pub const CALENDAR_FORM_BODY: &str = "etypes=15&etypes=8&etypes=17";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const CALENDAR_CACHE_KEY: &str = "es-calendar-source";
pub const CALENDAR_CACHE_TTL_SECS: u64 = 60 * 60 * 24;

pub const CALENDAR_TIMEOUT_SECS: u64 = 30;
pub const IMAGE_TIMEOUT_SECS: u64 = 15;
pub const REDIRECT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_IMAGE_NAME: &str = "imported.jpg";

// Skip reasons surfaced in the run summary
pub const SKIP_FILTERED_OUT: &str = "Filtered out";
pub const SKIP_MISSING_COORDINATES: &str = "Missing coordinates";

/// Build the absolute calendar URL for a main site base.
pub fn calendar_url(main_site: &str) -> String {
    format!("{}{}", normalize_main_site(main_site), CALENDAR_PATH)
}

/// Trim trailing slashes, falling back to the default site when blank.
pub fn normalize_main_site(main_site: &str) -> String {
    let trimmed = main_site.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_MAIN_SITE.to_string()
    } else {
        trimmed.to_string()
    }
}
