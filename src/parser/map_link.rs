use once_cell::sync::Lazy;
use regex::Regex;

static PLACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"maps/place/([^/]+)").expect("place pattern is valid"));

// "!3d<lat>!4d<lng>" marks the dropped pin of a place
static PIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"3d(-?\d+\.\d+)!4d(-?\d+\.\d+)").expect("pin pattern is valid")
});

// "@<lat>,<lng>" is the viewport center
static VIEWPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").expect("viewport pattern is valid")
});

/// True for link-shortener URLs that must be resolved before extraction.
pub fn is_shortened(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|host| host.contains("goo.gl"))
            .unwrap_or(false),
        Err(_) => url.contains("goo.gl"),
    }
}

/// Human address from a `/maps/place/<address>/` segment, percent-decoded.
pub fn extract_address(url: &str) -> Option<String> {
    let caps = PLACE_RE.captures(url)?;
    let raw = caps.get(1)?.as_str().replace('+', " ");
    let decoded = urlencoding::decode_binary(raw.as_bytes());
    let address = String::from_utf8_lossy(&decoded).trim().to_string();
    if address.is_empty() {
        None
    } else {
        Some(address)
    }
}

/// Latitude/longitude, preferring the place pin over the viewport center.
pub fn extract_coordinates(url: &str) -> Option<(f64, f64)> {
    capture_pair(&PIN_RE, url).or_else(|| capture_pair(&VIEWPORT_RE, url))
}

fn capture_pair(re: &Regex, url: &str) -> Option<(f64, f64)> {
    let caps = re.captures(url)?;
    let lat = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let lng = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some((lat, lng))
}
