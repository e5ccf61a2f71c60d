mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::{image_url, Card, Harness, MAP_WITHOUT_COORDINATES, MAP_WITH_PIN, MAIN_SITE};
use retreat_carpool::constants::{calendar_url, SKIP_FILTERED_OUT, SKIP_MISSING_COORDINATES};
use retreat_carpool::error::ImportError;
use retreat_carpool::offers::{OfferLocation, OwnerToken};
use retreat_carpool::pipeline::images::checksum;
use retreat_carpool::storage::Storage;
use retreat_carpool::types::Category;

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn first_run_creates_and_second_run_updates() {
    let h = Harness::new();
    h.set_calendar(&[
        Card::new(368, "Unir le ciel et la terre en soi"),
        Card::new(12, "Atelier du souffle").date("3 au 5 novembre 2030"),
    ])
    .await;

    let first = h.importer.import(None).await.unwrap();
    assert_eq!(first.created().len(), 2);
    assert!(first.updated().is_empty());
    assert!(!first.has_errors());

    let second = h.importer.import(None).await.unwrap();
    assert!(second.created().is_empty());
    assert_eq!(second.updated().len(), 2);
    assert_eq!(h.storage.event_count(), 2);

    let events = h.storage.list_events().await.unwrap();
    let event = &events[0];
    assert_eq!(event.original_event_id, 368);
    assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2030, 10, 27).unwrap());
    assert_eq!(event.days, 3);
    assert_eq!(event.category, Category::Retreat);
    assert_eq!(event.location_name, "Riaillé");
    assert_eq!(event.location_address, "Le Bois Joli, 44540 Riaillé");
    assert_eq!(event.latitude, 47.51);
    assert_eq!(event.longitude, -1.29);
    assert_eq!(event.hash_id.len(), 10);
    assert_eq!(first.created()[0].hash_id, event.hash_id);
}

#[tokio::test]
async fn same_id_on_another_date_is_a_separate_event() {
    let h = Harness::new();
    h.set_calendar(&[
        Card::new(368, "Unir"),
        Card::new(368, "Unir").date("1 au 3 mars 2031"),
    ])
    .await;

    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.created().len(), 2);
    assert_eq!(h.storage.event_count(), 2);
}

#[tokio::test]
async fn filter_never_creates_events() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(368, "Unir"), Card::new(12, "Atelier")])
        .await;

    let summary = h.importer.import(Some(&ids(&["368", "12"]))).await.unwrap();

    assert!(summary.created().is_empty());
    assert_eq!(summary.skipped().len(), 2);
    assert!(summary
        .skipped()
        .iter()
        .all(|s| s.reason == SKIP_FILTERED_OUT));
    assert_eq!(h.storage.event_count(), 0);
    // Filtered records never reach the image download
    let image = image_url("/img/client/activites/unir-salomon.jpg");
    assert_eq!(h.http.calls_to("GET", &image), 0);
}

#[tokio::test]
async fn filter_by_id_or_hash_updates_only_matches() {
    let h = Harness::new();
    h.set_calendar(&[
        Card::new(368, "Unir"),
        Card::new(12, "Atelier").date("3 au 5 novembre 2030"),
    ])
    .await;
    h.importer.import(None).await.unwrap();
    let events = h.storage.list_events().await.unwrap();
    let (first, second) = (&events[0], &events[1]);

    let by_id = h
        .importer
        .import(Some(&ids(&[first.id.to_string().as_str()])))
        .await
        .unwrap();
    assert_eq!(by_id.updated().len(), 1);
    assert_eq!(by_id.updated()[0].id, first.id);
    assert_eq!(by_id.skipped().len(), 1);

    let by_hash = h
        .importer
        .import(Some(&ids(&[second.hash_id.as_str()])))
        .await
        .unwrap();
    assert_eq!(by_hash.updated().len(), 1);
    assert_eq!(by_hash.updated()[0].id, second.id);

    // Blank entries do not count as a filter
    let blank = h.importer.import(Some(&ids(&["", "  "]))).await.unwrap();
    assert_eq!(blank.updated().len(), 2);
}

#[tokio::test]
async fn bad_record_does_not_stop_the_run() {
    let h = Harness::new();
    h.http.respond(&image_url("/img/broken.jpg"), 404, b"");
    h.set_calendar(&[
        Card::new(1, "Sans date").date("bientôt"),
        Card::new(2, "Image cassée").image("/img/broken.jpg"),
        Card::new(3, "Valide"),
    ])
    .await;

    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.errors().len(), 2);
    assert_eq!(summary.created().len(), 1);
    assert_eq!(summary.created()[0].original_event_id, 3);

    let date_error = &summary.errors()[0];
    assert_eq!(date_error.original_event_id, 1);
    assert_eq!(date_error.name, "Sans date");
    assert!(date_error.reason.contains("bientôt"));

    let image_error = &summary.errors()[1];
    assert_eq!(image_error.original_event_id, 2);
    assert!(image_error.reason.contains("HTTP 404"));
}

#[tokio::test]
async fn new_event_without_coordinates_is_skipped() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(5, "Nulle part").map(MAP_WITHOUT_COORDINATES)])
        .await;

    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.skipped().len(), 1);
    let skipped = &summary.skipped()[0];
    assert_eq!(skipped.reason, SKIP_MISSING_COORDINATES);
    assert_eq!(skipped.name.as_deref(), Some("Nulle part"));
    assert_eq!(h.storage.event_count(), 0);
}

#[tokio::test]
async fn existing_event_keeps_its_location_when_link_degrades() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(368, "Unir")]).await;
    h.importer.import(None).await.unwrap();

    h.set_calendar(&[Card::new(368, "Unir").map(MAP_WITHOUT_COORDINATES)])
        .await;
    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.updated().len(), 1);
    let event = &h.storage.list_events().await.unwrap()[0];
    assert_eq!(event.latitude, 47.51);
    assert_eq!(event.longitude, -1.29);
    assert_eq!(event.location_address, "Le Bois Joli, 44540 Riaillé");
    assert_eq!(event.original_link, MAP_WITHOUT_COORDINATES);
}

#[tokio::test]
async fn shortened_links_are_resolved_once() {
    let h = Harness::new();
    let short = "https://goo.gl/maps/UAw2vUj68sD36RVh7";
    h.http.redirect(short, MAP_WITH_PIN);
    h.set_calendar(&[Card::new(368, "Unir").map(short)]).await;

    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.created().len(), 1);
    assert_eq!(h.http.calls_to("HEAD", short), 1);
    let event = &h.storage.list_events().await.unwrap()[0];
    assert_eq!(event.latitude, 47.51);
    assert_eq!(event.original_link, short);
}

#[tokio::test]
async fn unresolvable_short_link_means_missing_coordinates() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(368, "Unir").map("https://goo.gl/maps/dead")])
        .await;

    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.skipped().len(), 1);
    assert_eq!(summary.skipped()[0].reason, SKIP_MISSING_COORDINATES);
}

#[tokio::test]
async fn identical_pictures_share_one_image() {
    let h = Harness::new();
    h.http
        .respond(&image_url("/img/copy/other-name.jpg"), 200, b"salomon-jpeg-bytes");
    h.set_calendar(&[
        Card::new(1, "Un"),
        Card::new(2, "Deux").image("/img/copy/other-name.jpg"),
    ])
    .await;

    h.importer.import(None).await.unwrap();

    assert_eq!(h.storage.image_count(), 1);
    let events = h.storage.list_events().await.unwrap();
    assert_eq!(events[0].image_id, events[1].image_id);
    let store = h.image_store();
    assert!(store.exists("unir-salomon.jpg"));
    assert!(!store.exists("other-name.jpg"));
}

#[tokio::test]
async fn same_file_name_with_other_content_gets_crc_suffix() {
    let h = Harness::new();
    h.http.respond(&image_url("/a/Photo.JPG"), 200, b"first picture");
    h.http.respond(&image_url("/b/Photo.JPG"), 200, b"second picture");
    h.set_calendar(&[
        Card::new(1, "Un").image("/a/Photo.JPG"),
        Card::new(2, "Deux").image("/b/Photo.JPG"),
    ])
    .await;

    h.importer.import(None).await.unwrap();

    assert_eq!(h.storage.image_count(), 2);
    let store = h.image_store();
    assert!(store.exists("photo.jpg"));
    assert!(store.exists(&format!("photo-{}.jpg", checksum(b"second picture"))));
}

#[tokio::test]
async fn missing_image_file_is_restored() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(368, "Unir")]).await;
    h.importer.import(None).await.unwrap();

    let store = h.image_store();
    std::fs::remove_file(store.path_of("unir-salomon.jpg")).unwrap();

    h.importer.import(None).await.unwrap();

    assert!(store.exists("unir-salomon.jpg"));
    assert_eq!(h.storage.image_count(), 1);
}

#[tokio::test]
async fn calendar_is_fetched_once_per_cache_lifetime() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(368, "Unir")]).await;

    h.importer.import(None).await.unwrap();
    h.importer.import(None).await.unwrap();

    assert_eq!(h.http.calls_to("POST", &calendar_url(MAIN_SITE)), 1);
}

#[tokio::test]
async fn calendar_failure_aborts_and_is_not_cached() {
    let h = Harness::new();
    let url = calendar_url(MAIN_SITE);
    h.http.respond(&url, 500, b"oops");

    let err = h.importer.import(None).await.unwrap_err();
    assert!(matches!(err, ImportError::Fetch { status: 500, .. }));
    assert_eq!(h.storage.event_count(), 0);

    h.http
        .respond(&url, 200, common::calendar_html(&[Card::new(368, "Unir")]).as_bytes());
    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.created().len(), 1);
    assert_eq!(h.http.calls_to("POST", &url), 2);
}

#[tokio::test]
async fn blank_calendar_aborts_and_is_not_cached() {
    let h = Harness::new();
    let url = calendar_url(MAIN_SITE);
    h.http.respond(&url, 200, b"  \n");

    let err = h.importer.import(None).await.unwrap_err();
    assert!(matches!(err, ImportError::EmptyCalendar { .. }));

    h.http
        .respond(&url, 200, common::calendar_html(&[Card::new(368, "Unir")]).as_bytes());
    let summary = h.importer.import(None).await.unwrap();

    assert_eq!(summary.created().len(), 1);
    assert_eq!(h.http.calls_to("POST", &url), 2);
}

#[tokio::test]
async fn unreachable_calendar_is_a_transport_error() {
    let h = Harness::new();

    let err = h.importer.import(None).await.unwrap_err();

    assert!(matches!(err, ImportError::Transport { .. }));
}

#[tokio::test]
async fn progress_follows_scraped_order() {
    let h = Harness::new();
    h.set_calendar(&[
        Card::new(1, "Créé"),
        Card::new(2, "Erreur").date("bientôt"),
        Card::new(3, "Sans carte").map(MAP_WITHOUT_COORDINATES),
    ])
    .await;

    let mut seen = Vec::new();
    let summary = h
        .importer
        .import_with_progress(None, |progress| seen.push(progress.kind()))
        .await
        .unwrap();

    assert_eq!(seen, vec!["created", "error", "skipped"]);
    assert_eq!(summary.total(), 3);
}

#[tokio::test]
async fn labels_map_to_categories() {
    let h = Harness::new();
    h.set_calendar(&[
        Card::new(1, "Silence").label("Retraite en silence"),
        Card::new(2, "Atelier").label("Atelier du jour").date("3 au 5 novembre 2030"),
    ])
    .await;

    h.importer.import(None).await.unwrap();

    let events = h.storage.list_events().await.unwrap();
    assert_eq!(events[0].category, Category::SilentRetreat);
    assert_eq!(events[1].category, Category::Seminar);
}

#[tokio::test]
async fn reimport_keeps_admin_privacy_flag() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(368, "Unir")]).await;
    let first = h.importer.import(None).await.unwrap();
    let id = first.created()[0].id;
    h.storage.set_private(id, true).unwrap();

    h.set_calendar(&[Card::new(368, "Unir, nouvelle édition")]).await;
    h.importer.import(None).await.unwrap();

    let event = &h.storage.list_events().await.unwrap()[0];
    assert_eq!(event.name, "Unir, nouvelle édition");
    assert!(event.private);
}

#[tokio::test]
async fn imported_event_bounds_offer_token_and_pickup() {
    let h = Harness::new();
    h.set_calendar(&[Card::new(368, "Unir")]).await;
    h.importer.import(None).await.unwrap();

    let event = &h.storage.list_events().await.unwrap()[0];
    let expires_at = OwnerToken::expiry_for(event);
    assert_eq!(
        expires_at,
        Utc.with_ymd_and_hms(2030, 10, 30, 0, 0, 0).unwrap()
    );

    let (token, record) = OwnerToken::issue(expires_at);
    let before_start = Utc.with_ymd_and_hms(2030, 10, 20, 9, 0, 0).unwrap();
    assert!(record.is_valid(Some(&token), before_start));
    assert!(!record.is_valid(Some(&token), expires_at + Duration::hours(1)));

    let pickup = OfferLocation::validate(event.latitude, event.longitude).unwrap();
    assert_eq!((pickup.lat, pickup.lng), (event.latitude, event.longitude));
}
