use crate::app::ports::{CachePort, HttpClientPort};
use crate::constants::{
    calendar_url, CALENDAR_CACHE_KEY, CALENDAR_CACHE_TTL_SECS, CALENDAR_FORM_BODY,
};
use crate::error::{ImportError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Fetches the raw calendar page, remembering it for a day.
pub struct CalendarSource {
    http: Arc<dyn HttpClientPort>,
    cache: Arc<dyn CachePort>,
    url: String,
    timeout: Duration,
}

impl CalendarSource {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        cache: Arc<dyn CachePort>,
        main_site: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            cache,
            url: calendar_url(main_site),
            timeout,
        }
    }

    /// Return the cached calendar body, or POST the category filter and cache the result.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_calendar(&self) -> Result<String> {
        match self.cache.get(CALENDAR_CACHE_KEY).await {
            Ok(Some(html)) => {
                debug!("Using cached calendar ({} bytes)", html.len());
                return Ok(html);
            }
            Ok(None) => {}
            Err(e) => warn!("Calendar cache unreadable, fetching instead: {}", e),
        }

        let resp = self
            .http
            .post_form(&self.url, CALENDAR_FORM_BODY, self.timeout)
            .await
            .map_err(|message| ImportError::Transport {
                url: self.url.clone(),
                message,
            })?;

        if !resp.is_success() {
            return Err(ImportError::Fetch {
                url: self.url.clone(),
                status: resp.status,
            });
        }

        let html = resp.text();
        if html.trim().is_empty() {
            return Err(ImportError::EmptyCalendar {
                url: self.url.clone(),
            });
        }
        info!("Fetched calendar ({} bytes)", html.len());

        if let Err(e) = self
            .cache
            .put(
                CALENDAR_CACHE_KEY,
                &html,
                Duration::from_secs(CALENDAR_CACHE_TTL_SECS),
            )
            .await
        {
            warn!("Failed to cache calendar: {}", e);
        }

        Ok(html)
    }
}
