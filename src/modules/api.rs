use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, HeaderName, HeaderValue, ORIGIN, REFERER};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::notifications::{Notification, NotificationId, NotificationList, UnreadSummary};
use crate::config::Config;
use crate::error::FetchFailure;

/// The four backend calls the widget depends on.
///
/// Implementations never panic on bad input from the wire; every problem is
/// reported as a [`FetchFailure`].
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn fetch_unread(&self) -> Result<UnreadSummary, FetchFailure>;
    async fn fetch_all(&self) -> Result<Vec<Notification>, FetchFailure>;
    async fn mark_read(&self, id: NotificationId) -> Result<(), FetchFailure>;
    async fn mark_all_read(&self) -> Result<(), FetchFailure>;
}

pub struct HttpNotificationApi {
    client: Client,
    jar: Arc<Jar>,
    root: String,
    csrf_cookie_name: String,
    csrf_header: HeaderName,
    /// Sent on POSTs; the backend's CSRF check rejects HTTPS writes without them.
    referer: HeaderValue,
    origin: HeaderValue,
}

impl HttpNotificationApi {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        if !config.session_cookie.is_empty() {
            jar.add_cookie_str(&format!("{}={}; Path=/", config.session_cookie_name, config.session_cookie), &base);
        }
        if !config.csrf_token.is_empty() {
            jar.add_cookie_str(&format!("{}={}; Path=/", config.csrf_cookie_name, config.csrf_token), &base);
        }

        let client = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(concat!("notibell/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            jar,
            root: format!("{}api/notifications/", base),
            csrf_cookie_name: config.csrf_cookie_name.clone(),
            csrf_header: HeaderName::from_bytes(config.csrf_header.as_bytes())?,
            referer: HeaderValue::from_str(base.as_str())?,
            origin: HeaderValue::from_str(&base.origin().ascii_serialization())?,
        })
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}{}", self.root, suffix)
    }

    /// Current anti-forgery token for `url`, read from the cookie jar so a
    /// token rotated by the server is picked up on the next request.
    fn csrf_token(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        cookie_value(header.to_str().ok()?, &self.csrf_cookie_name)
    }

    async fn get_json<T: DeserializeOwned>(&self, suffix: &str) -> Result<T, FetchFailure> {
        let url = self.endpoint(suffix);
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Http { status, path: suffix_path(suffix) });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|source| FetchFailure::MalformedResponse { path: suffix_path(suffix), source })
    }

    async fn post(&self, suffix: &str) -> Result<(), FetchFailure> {
        let url = self.endpoint(suffix);
        let mut request = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(REFERER, self.referer.clone())
            .header(ORIGIN, self.origin.clone());
        match self.csrf_token(&url).and_then(|t| HeaderValue::from_str(&t).ok()) {
            Some(token) => request = request.header(self.csrf_header.clone(), token),
            None => tracing::warn!(%url, cookie = %self.csrf_cookie_name, "no anti-forgery cookie; sending without token"),
        }

        tracing::debug!(%url, "POST");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Http { status, path: suffix_path(suffix) });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch_unread(&self) -> Result<UnreadSummary, FetchFailure> {
        self.get_json("unread/").await
    }

    async fn fetch_all(&self) -> Result<Vec<Notification>, FetchFailure> {
        let list: NotificationList = self.get_json("").await?;
        Ok(list.notifications)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), FetchFailure> {
        self.post(&format!("{id}/read/")).await
    }

    async fn mark_all_read(&self) -> Result<(), FetchFailure> {
        self.post("mark-all-read/").await
    }
}

fn suffix_path(suffix: &str) -> String {
    format!("/api/notifications/{suffix}")
}

/// Pulls `name` out of a `Cookie:` header value (`a=1; b=2`).
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
