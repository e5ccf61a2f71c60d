use crate::types::ScrapedEvent;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

static CARD: Lazy<Selector> = Lazy::new(|| selector("div.element-item"));
static IMAGE: Lazy<Selector> = Lazy::new(|| selector("img"));
static DATE: Lazy<Selector> = Lazy::new(|| selector("span.date"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h5 a"));
static LABEL: Lazy<Selector> = Lazy::new(|| selector("ul span"));
static MAP_LINK: Lazy<Selector> = Lazy::new(|| selector("ul a"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Extracts event cards from the calendar page.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse every complete card, in document order. Incomplete cards are dropped.
    pub fn parse(&self, html: &str) -> Vec<ScrapedEvent> {
        let document = Html::parse_document(html);
        let mut events = Vec::new();
        let mut dropped = 0usize;

        for card in document.select(&CARD) {
            match parse_card(card) {
                Some(event) => events.push(event),
                None => dropped += 1,
            }
        }

        info!(
            "Parsed {} calendar cards ({} incomplete skipped)",
            events.len(),
            dropped
        );
        events
    }
}

fn parse_card(card: ElementRef<'_>) -> Option<ScrapedEvent> {
    let image = card.select(&IMAGE).next()?;
    let date = card.select(&DATE).next()?;
    let title = card.select(&TITLE).next()?;
    let map_link = card.select(&MAP_LINK).next()?;

    let image_path = image.value().attr("src").unwrap_or_default().trim();
    let raw_date = text_of(date);
    let name = text_of(title);
    let map_href = map_link.value().attr("href").unwrap_or_default().trim();

    if image_path.is_empty() || raw_date.is_empty() || name.is_empty() || map_href.is_empty() {
        debug!("Skipping card with empty fields: {:?}", name);
        return None;
    }

    let original_event_id = title
        .value()
        .attr("href")
        .and_then(event_id_from_href)
        .filter(|id| *id != 0);
    let Some(original_event_id) = original_event_id else {
        debug!("Skipping card without event id: {}", name);
        return None;
    };

    // The second label span carries the category, the first one is the audience
    let type_label = card.select(&LABEL).nth(1).map(text_of).unwrap_or_default();

    Some(ScrapedEvent {
        image_path: image_path.to_string(),
        date: raw_date,
        name,
        original_event_id,
        type_label,
        map_link: map_href.to_string(),
        location_name: text_of(map_link),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Leading digits after the first `=` of an href such as `activite.asp?id=368`.
fn event_id_from_href(href: &str) -> Option<u32> {
    let value = href.split('=').nth(1)?;
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
