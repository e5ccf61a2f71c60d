#![allow(dead_code)]

use async_trait::async_trait;
use retreat_carpool::app::ports::{CachePort, HttpClientPort, HttpResponse};
use retreat_carpool::constants::{calendar_url, CALENDAR_CACHE_KEY};
use retreat_carpool::gateway::ImageStore;
use retreat_carpool::infra::InMemoryCache;
use retreat_carpool::parser::DateRangeParser;
use retreat_carpool::pipeline::{EventImporter, ImageResolver, ImageStorage, MapLinkResolver};
use retreat_carpool::scrapers::{CalendarSource, EventParser};
use retreat_carpool::storage::{InMemoryStorage, Storage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const MAIN_SITE: &str = "https://site.test";

pub const MAP_WITH_PIN: &str = "https://www.google.com/maps/place/Le+Bois+Joli,+44540+Riaill%C3%A9/@47.5,-1.3,17z/data=!3m1!4b1!8m2!3d47.51!4d-1.29";
pub const MAP_WITHOUT_COORDINATES: &str = "https://maps.example/somewhere";

/// Canned HTTP responses keyed by URL. Unknown URLs fail like a dead host.
#[derive(Default)]
pub struct FakeHttp {
    routes: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl FakeHttp {
    pub fn respond(&self, url: &str, status: u16, body: &[u8]) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            HttpResponse {
                status,
                bytes: body.to_vec(),
                location: None,
            },
        );
    }

    pub fn redirect(&self, url: &str, location: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            HttpResponse {
                status: 302,
                bytes: Vec::new(),
                location: Some(location.to_string()),
            },
        );
    }

    pub fn calls_to(&self, method: &str, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, u)| *m == method && u == url)
            .count()
    }

    fn answer(&self, method: &'static str, url: &str) -> Result<HttpResponse, String> {
        self.calls.lock().unwrap().push((method, url.to_string()));
        self.routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| format!("connection refused: {url}"))
    }
}

#[async_trait]
impl HttpClientPort for FakeHttp {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, String> {
        self.answer("GET", url)
    }

    async fn post_form(
        &self,
        url: &str,
        _body: &str,
        _timeout: Duration,
    ) -> Result<HttpResponse, String> {
        self.answer("POST", url)
    }

    async fn get_without_redirect(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<HttpResponse, String> {
        self.answer("HEAD", url)
    }
}

/// One calendar card as the upstream site renders it.
pub struct Card<'a> {
    pub id: u32,
    pub name: &'a str,
    pub date: &'a str,
    pub image: &'a str,
    pub label: &'a str,
    pub map: &'a str,
}

impl<'a> Card<'a> {
    pub fn new(id: u32, name: &'a str) -> Self {
        Self {
            id,
            name,
            date: "27 au 29 octobre 2030",
            image: "/img/client/activites/unir-salomon.jpg",
            label: "Rencontre en résidentiel",
            map: MAP_WITH_PIN,
        }
    }

    pub fn date(mut self, date: &'a str) -> Self {
        self.date = date;
        self
    }

    pub fn image(mut self, image: &'a str) -> Self {
        self.image = image;
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn map(mut self, map: &'a str) -> Self {
        self.map = map;
        self
    }

    fn render(&self) -> String {
        format!(
            r#"<div class="element-item">
                <img src="{}">
                <span class="date">{}</span>
                <h5><a href="activite.asp?id={}">{}</a></h5>
                <ul>
                    <li><span>Tout public</span></li>
                    <li><span>{}</span></li>
                    <li><a href="{}">Riaillé</a></li>
                </ul>
            </div>"#,
            self.image, self.date, self.id, self.name, self.label, self.map
        )
    }
}

pub fn calendar_html(cards: &[Card<'_>]) -> String {
    let body: String = cards.iter().map(Card::render).collect();
    format!("<html><body><div class=\"grid\">{body}</div></body></html>")
}

pub fn image_url(path: &str) -> String {
    format!("{MAIN_SITE}{path}")
}

/// Importer wired to fakes, in-memory storage and a temporary image directory.
pub struct Harness {
    pub http: Arc<FakeHttp>,
    pub cache: Arc<InMemoryCache>,
    pub storage: Arc<InMemoryStorage>,
    pub dir: TempDir,
    pub importer: EventImporter,
}

impl Harness {
    pub fn new() -> Self {
        let storage = Arc::new(InMemoryStorage::default());
        Self::with_storage(storage.clone(), storage)
    }

    /// `storage` backs the importer; `in_memory` is kept for direct inspection.
    pub fn with_storage(in_memory: Arc<InMemoryStorage>, storage: Arc<dyn Storage>) -> Self {
        let http = Arc::new(FakeHttp::default());
        let cache = Arc::new(InMemoryCache::new());
        let dir = tempfile::tempdir().unwrap();

        http.respond(
            &image_url("/img/client/activites/unir-salomon.jpg"),
            200,
            b"salomon-jpeg-bytes",
        );

        let importer = build_importer(http.clone(), cache.clone(), storage, &dir);

        Self {
            http,
            cache,
            storage: in_memory,
            dir,
            importer,
        }
    }

    /// Serve a new calendar and drop the cached copy.
    pub async fn set_calendar(&self, cards: &[Card<'_>]) {
        self.http
            .respond(&calendar_url(MAIN_SITE), 200, calendar_html(cards).as_bytes());
        self.cache.forget(CALENDAR_CACHE_KEY).await.unwrap();
    }

    pub fn image_store(&self) -> ImageStore {
        ImageStore::new(self.dir.path().join("images"))
    }
}

pub fn build_importer(
    http: Arc<FakeHttp>,
    cache: Arc<InMemoryCache>,
    storage: Arc<dyn Storage>,
    dir: &TempDir,
) -> EventImporter {
    let timeout = Duration::from_secs(1);
    let images = ImageResolver::new(
        http.clone(),
        ImageStorage::new(storage.clone(), ImageStore::new(dir.path().join("images"))),
        MAIN_SITE,
        timeout,
    );
    EventImporter::new(
        CalendarSource::new(http.clone(), cache, MAIN_SITE, timeout),
        EventParser::new(),
        DateRangeParser::new(),
        MapLinkResolver::new(http, timeout),
        images,
        storage,
    )
}
