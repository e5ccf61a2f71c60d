use crate::app::ports::{CachePort, HttpClientPort};
use crate::config::Config;
use crate::constants::{SKIP_FILTERED_OUT, SKIP_MISSING_COORDINATES};
use crate::error::{ImportError, Result};
use crate::gateway::ImageStore;
use crate::metrics::{IMPORT_DURATION_SECONDS, IMPORT_RECORDS_TOTAL, IMPORT_RUNS_TOTAL};
use crate::parser::DateRangeParser;
use crate::pipeline::images::{ImageResolver, ImageStorage};
use crate::pipeline::maps::MapLinkResolver;
use crate::pipeline::summary::{ImportProgress, ImportRunSummary};
use crate::scrapers::{CalendarSource, EventParser};
use crate::storage::Storage;
use crate::types::{Category, Event, EventData, EventKey, ScrapedEvent};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Imports the upstream calendar into storage, one scraped card at a time.
pub struct EventImporter {
    calendar: CalendarSource,
    parser: EventParser,
    dates: DateRangeParser,
    maps: MapLinkResolver,
    images: ImageResolver,
    storage: Arc<dyn Storage>,
}

impl EventImporter {
    pub fn new(
        calendar: CalendarSource,
        parser: EventParser,
        dates: DateRangeParser,
        maps: MapLinkResolver,
        images: ImageResolver,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            calendar,
            parser,
            dates,
            maps,
            images,
            storage,
        }
    }

    /// Wire every collaborator from configuration.
    pub fn from_config(
        config: &Config,
        http: Arc<dyn HttpClientPort>,
        cache: Arc<dyn CachePort>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let main_site = &config.main_site.base_url;
        let calendar = CalendarSource::new(
            http.clone(),
            cache,
            main_site,
            config.http.calendar_timeout(),
        );
        let images = ImageResolver::new(
            http.clone(),
            ImageStorage::new(
                storage.clone(),
                ImageStore::new(&config.storage.image_dir),
            ),
            main_site,
            config.http.image_timeout(),
        );
        let maps = MapLinkResolver::new(http, config.http.redirect_timeout());

        Self::new(
            calendar,
            EventParser::new(),
            DateRangeParser::new(),
            maps,
            images,
            storage,
        )
    }

    pub async fn import(&self, filter: Option<&[String]>) -> Result<ImportRunSummary> {
        self.import_with_progress(filter, |_| {}).await
    }

    /// Run one import. `on_progress` is called once per record, in scraped order.
    ///
    /// Only a calendar fetch failure is returned as an error; record failures
    /// land in the summary.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4()))]
    pub async fn import_with_progress<F>(
        &self,
        filter: Option<&[String]>,
        mut on_progress: F,
    ) -> Result<ImportRunSummary>
    where
        F: FnMut(&ImportProgress) + Send,
    {
        let started = Instant::now();
        counter!(IMPORT_RUNS_TOTAL).increment(1);

        let filters = normalize_filters(filter);
        if !filters.is_empty() {
            info!("Import restricted to {:?}", filters);
        }

        let html = self.calendar.fetch_calendar().await?;
        let scraped_events = self.parser.parse(&html);
        info!("Importing {} events from main site", scraped_events.len());

        let mut summary = ImportRunSummary::new();
        for scraped in &scraped_events {
            let progress = self.import_one(scraped, &filters, &mut summary).await;
            counter!(IMPORT_RECORDS_TOTAL, "outcome" => progress.kind()).increment(1);
            on_progress(&progress);
        }

        histogram!(IMPORT_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        info!("Import finished: {}", summary);
        Ok(summary)
    }

    async fn import_one(
        &self,
        scraped: &ScrapedEvent,
        filters: &[String],
        summary: &mut ImportRunSummary,
    ) -> ImportProgress {
        let id = scraped.original_event_id;
        let name = scraped.name.as_str();

        let range = match self.dates.parse(&scraped.date) {
            Ok(range) => range,
            Err(e) => {
                warn!("Event {} has an unparseable date: {}", id, e);
                return summary.record_error(id, name, e);
            }
        };

        let key = EventKey {
            original_event_id: id,
            start_date: range.start_date,
        };
        let existing = match self.storage.find_event_by_key(&key).await {
            Ok(existing) => existing,
            Err(e) => return summary.record_error(id, name, ImportError::from(e)),
        };

        if !filters.is_empty() && !matches_filter(filters, existing.as_ref()) {
            debug!("Event {} filtered out", id);
            return summary.record_skipped(id, range.start_date, SKIP_FILTERED_OUT, Some(name));
        }

        let image = match self.images.resolve(&scraped.image_path).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Event {} image failed: {}", id, e);
                return summary.record_error(id, name, e);
            }
        };

        let category = Category::from_label(&scraped.type_label);
        let location = self.maps.parse(&scraped.map_link).await;

        // Keep previously stored coordinates when the link no longer yields any
        let latitude = location
            .latitude
            .or_else(|| existing.as_ref().map(|e| e.latitude));
        let longitude = location
            .longitude
            .or_else(|| existing.as_ref().map(|e| e.longitude));
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            warn!(
                "Event {} has no coordinates in {}",
                id, location.resolved_url
            );
            return summary.record_skipped(
                id,
                range.start_date,
                SKIP_MISSING_COORDINATES,
                Some(name),
            );
        };

        let data = EventData {
            name: scraped.name.clone(),
            category,
            days: range.days,
            image_id: image.id,
            location_name: scraped.location_name.clone(),
            location_address: location
                .address
                .or_else(|| existing.as_ref().map(|e| e.location_address.clone()))
                .unwrap_or_default(),
            original_link: scraped.map_link.clone(),
            latitude,
            longitude,
        };

        match existing {
            Some(event) => match self.storage.update_event(event.id, data).await {
                Ok(updated) => summary.record_updated(&updated),
                Err(e) => summary.record_error(id, name, ImportError::from(e)),
            },
            None => match self.storage.create_event(key, data).await {
                Ok(created) => {
                    info!("Created event {} ({})", created.id, created.name);
                    summary.record_created(&created)
                }
                Err(e) => summary.record_error(id, name, ImportError::from(e)),
            },
        }
    }
}

/// `None` and lists of blank entries both mean "no filter".
fn normalize_filters(filter: Option<&[String]>) -> Vec<String> {
    filter
        .unwrap_or_default()
        .iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// A filter targets stored events only, by numeric id or hash id.
fn matches_filter(filters: &[String], event: Option<&Event>) -> bool {
    let Some(event) = event else {
        return false;
    };
    let id = event.id.to_string();
    filters
        .iter()
        .any(|f| *f == id || (!event.hash_id.is_empty() && *f == event.hash_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: i64, hash_id: &str) -> Event {
        Event {
            id,
            hash_id: hash_id.to_string(),
            original_event_id: 1,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            name: "x".to_string(),
            category: Category::Seminar,
            days: 1,
            image_id: 1,
            location_name: String::new(),
            location_address: String::new(),
            original_link: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            private: false,
        }
    }

    #[test]
    fn blank_filters_mean_no_filter() {
        assert!(normalize_filters(None).is_empty());
        let blanks = vec![" ".to_string(), String::new()];
        assert!(normalize_filters(Some(&blanks)).is_empty());
        let ids = vec![" 12 ".to_string()];
        assert_eq!(normalize_filters(Some(&ids)), vec!["12".to_string()]);
    }

    #[test]
    fn filter_matches_id_or_hash() {
        let e = event(12, "abc123");
        assert!(matches_filter(&["12".to_string()], Some(&e)));
        assert!(matches_filter(&["abc123".to_string()], Some(&e)));
        assert!(!matches_filter(&["13".to_string()], Some(&e)));
        assert!(!matches_filter(&["abc123".to_string()], None));
    }
}
