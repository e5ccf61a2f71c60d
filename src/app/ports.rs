use async_trait::async_trait;
use std::time::Duration;

/// Outbound HTTP used by the calendar source, image download and map link resolution.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, String>;

    async fn post_form(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, String>;

    /// GET that returns the first response as-is, without following redirects.
    async fn get_without_redirect(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, String>;
}

#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub location: Option<String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Key/value cache with per-entry time to live.
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, String>;
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), String>;
    async fn forget(&self, key: &str) -> Result<(), String>;
}
