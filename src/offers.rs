//! Ownership and placement rules for carpool offers attached to imported events.
//!
//! The importer never creates offers. These types are the shared rules the
//! offer API applies on top of the events this crate writes.

use crate::error::OfferError;
use crate::types::Event;
use chrono::{DateTime, NaiveTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Stored half of an owner token. The plain token is only ever handed to the
/// offer's creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerTokenRecord {
    pub token_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct OwnerToken;

impl OwnerToken {
    /// Generate a fresh token. Returns the plain token and what to persist.
    pub fn issue(expires_at: DateTime<Utc>) -> (String, OwnerTokenRecord) {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        let record = OwnerTokenRecord {
            token_hash: Some(hash_token(&token)),
            expires_at: Some(expires_at),
        };
        (token, record)
    }

    /// Tokens issued for an offer stop working once its event is over.
    pub fn expiry_for(event: &Event) -> DateTime<Utc> {
        event.end_date().and_time(NaiveTime::MIN).and_utc()
    }
}

impl OwnerTokenRecord {
    /// Offers created before owner tokens existed have no hash and stay editable.
    pub fn legacy() -> Self {
        Self {
            token_hash: None,
            expires_at: None,
        }
    }

    pub fn is_valid(&self, token: Option<&str>, now: DateTime<Utc>) -> bool {
        let Some(stored) = &self.token_hash else {
            return true;
        };
        let Some(token) = token else {
            return false;
        };
        if matches!(self.expires_at, Some(expires_at) if expires_at < now) {
            return false;
        }
        constant_time_eq(stored.as_bytes(), hash_token(token).as_bytes())
    }
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Pickup point of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfferLocation {
    pub lat: f64,
    pub lng: f64,
}

impl OfferLocation {
    const LAT_RANGE: (f64, f64) = (36.0, 66.0);
    const LNG_RANGE: (f64, f64) = (-175.0, 18.0);

    /// Accepts points between Canada and Italy; bounds are inclusive.
    pub fn validate(lat: f64, lng: f64) -> Result<Self, OfferError> {
        let within = |value: f64, (min, max): (f64, f64)| value >= min && value <= max;
        if within(lat, Self::LAT_RANGE) && within(lng, Self::LNG_RANGE) {
            Ok(Self { lat, lng })
        } else {
            Err(OfferError::OutOfArea { lat, lng })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn issued_token_is_hex_and_only_hash_is_kept() {
        let (token, record) = OwnerToken::issue(now() + Duration::days(3));
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(record.token_hash.as_deref(), Some(hash_token(&token).as_str()));
        assert_ne!(record.token_hash.as_deref(), Some(token.as_str()));
    }

    #[test]
    fn token_validation_rules() {
        let (token, record) = OwnerToken::issue(now() + Duration::days(3));
        assert!(record.is_valid(Some(&token), now()));
        assert!(!record.is_valid(Some("not-the-token"), now()));
        assert!(!record.is_valid(None, now()));
        assert!(!record.is_valid(Some(&token), now() + Duration::days(4)));
    }

    #[test]
    fn tokens_expire_when_the_event_ends() {
        let event = Event {
            id: 1,
            hash_id: String::new(),
            original_event_id: 368,
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            name: "Unir".to_string(),
            category: crate::types::Category::Retreat,
            days: 3,
            image_id: 1,
            location_name: String::new(),
            location_address: String::new(),
            original_link: String::new(),
            latitude: 47.5,
            longitude: -1.3,
            private: false,
        };
        let expires_at = OwnerToken::expiry_for(&event);
        assert_eq!(expires_at, Utc.with_ymd_and_hms(2024, 6, 13, 0, 0, 0).unwrap());

        let (token, record) = OwnerToken::issue(expires_at);
        assert!(record.is_valid(Some(&token), expires_at - Duration::seconds(1)));
        assert!(!record.is_valid(Some(&token), expires_at + Duration::seconds(1)));
    }

    #[test]
    fn legacy_offers_need_no_token() {
        let record = OwnerTokenRecord::legacy();
        assert!(record.is_valid(None, now()));
        assert!(record.is_valid(Some("anything"), now()));
    }

    #[test]
    fn location_bounds() {
        assert!(OfferLocation::validate(45.5, -73.6).is_ok());
        assert!(OfferLocation::validate(36.0, 18.0).is_ok());
        assert_eq!(
            OfferLocation::validate(35.9, -73.6),
            Err(OfferError::OutOfArea {
                lat: 35.9,
                lng: -73.6
            })
        );
        assert!(OfferLocation::validate(45.5, 18.1).is_err());
        assert!(OfferLocation::validate(45.5, -175.1).is_err());
    }
}
