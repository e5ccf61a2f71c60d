use crate::app::ports::{HttpClientPort, HttpResponse};
use crate::constants::FORM_CONTENT_TYPE;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("retreat_carpool/", env!("CARGO_PKG_VERSION"));

pub struct ReqwestHttp {
    client: reqwest::Client,
    no_redirect: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new() -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| e.to_string())?;
        let no_redirect = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self { client, no_redirect })
    }

    async fn read(resp: reqwest::Response) -> Result<HttpResponse, String> {
        let status = resp.status().as_u16();
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let bytes = resp.bytes().await.map_err(|e| e.to_string())?.to_vec();
        Ok(HttpResponse {
            status,
            bytes,
            location,
        })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, String> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::read(resp).await
    }

    async fn post_form(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, String> {
        debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body.to_string())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::read(resp).await
    }

    async fn get_without_redirect(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, String> {
        debug!("GET {} (redirects disabled)", url);
        let resp = self
            .no_redirect
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        // Only the headers matter here; skip downloading the redirect body
        Ok(HttpResponse {
            status: resp.status().as_u16(),
            bytes: Vec::new(),
            location: resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}
