use crate::app::ports::HttpClientPort;
use crate::parser::map_link::{extract_address, extract_coordinates, is_shortened};
use crate::types::GoogleMapsLocation;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolves Google Maps links, following one shortener redirect by hand.
pub struct MapLinkResolver {
    http: Arc<dyn HttpClientPort>,
    timeout: Duration,
}

impl MapLinkResolver {
    pub fn new(http: Arc<dyn HttpClientPort>, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Never fails: unresolvable links and unmatched patterns give `None` fields.
    pub async fn parse(&self, url: &str) -> GoogleMapsLocation {
        let resolved = self.resolve_redirect(url).await;
        let address = extract_address(&resolved);
        let coordinates = extract_coordinates(&resolved);

        GoogleMapsLocation {
            original_url: url.to_string(),
            resolved_url: resolved,
            address,
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lng)| lng),
        }
    }

    async fn resolve_redirect(&self, url: &str) -> String {
        if !is_shortened(url) {
            return url.to_string();
        }

        match self.http.get_without_redirect(url, self.timeout).await {
            Ok(resp) => match resp
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
            {
                Some(location) => {
                    debug!("Resolved {} -> {}", url, location);
                    location
                }
                None => {
                    warn!("No redirect location for {} (HTTP {})", url, resp.status);
                    url.to_string()
                }
            },
            Err(e) => {
                warn!("Unable to resolve map link {}: {}", url, e);
                url.to_string()
            }
        }
    }
}
