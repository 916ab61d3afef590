//! Rate-limited, cached HTTP fetch of listing details.
//!
//! Every outbound request passes the shared [`RateGate`] first. Responses are
//! memoized in the [`TtlCache`] with the auth-presence flag in the key so
//! authenticated and anonymous results never mix. Retry policy: up to 3
//! attempts with exponential backoff on rate-limit, server, and network
//! failures; 401 short-circuits because a rejected credential will not become
//! valid by retrying.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::cache::TtlCache;
use crate::rate::RateGate;

const FETCH_ATTEMPTS: u32 = 3;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Production listing-details API base.
pub const DEFAULT_API_BASE: &str = "https://apis.roblox.com/game-passes/v1";

/// Outcome of a single upstream attempt, before the retry loop degrades it
/// to `Option` for callers.
#[derive(Debug)]
enum FetchOutcome {
    Found(Value),
    NotFound,
    Transient(String),
}

/// HTTP client for the listing-details endpoint, wired to the process-wide
/// cache and rate gate.
pub struct ListingClient {
    http: reqwest::Client,
    base_url: String,
    credential: Option<String>,
    cache: Arc<TtlCache>,
    gate: Arc<RateGate>,
}

impl ListingClient {
    pub fn new(
        base_url: &str,
        credential: Option<String>,
        cache: Arc<TtlCache>,
        gate: Arc<RateGate>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            cache,
            gate,
        })
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn cache_handle(&self) -> Arc<TtlCache> {
        Arc::clone(&self.cache)
    }

    fn details_url(&self, id: &str) -> String {
        format!("{}/game-passes/{id}/details", self.base_url)
    }

    /// Fetch raw listing details, authenticated when `authed` and a
    /// credential is configured. Returns `None` when the listing cannot be
    /// resolved; callers treat that as "not found", never as an error.
    pub async fn fetch_details(&self, id: &str, authed: bool, force: bool) -> Option<Value> {
        let cookie = if authed {
            self.credential.as_deref()
        } else {
            None
        };
        let key = TtlCache::key("details", cookie.is_some(), id);
        if let Some(hit) = self.cache.get(&key, force) {
            crate::metrics::record_cache_hit();
            return Some(hit);
        }
        crate::metrics::record_cache_miss();

        let url = self.details_url(id);
        let data = self.get_json(&url, cookie, force).await?;
        self.cache.set(key, data.clone());
        Some(data)
    }

    /// Composed lookup: authenticated first, anonymous fallback when no
    /// usable price results. The resolved `(price, details)` pair is cached
    /// under its own key so repeat calls skip both upstream attempts.
    pub async fn get_price_any(&self, id: &str, force: bool) -> (Option<i64>, Option<Value>) {
        let key = format!("price_any::{id}");
        if let Some(hit) = self.cache.get(&key, force) {
            crate::metrics::record_cache_hit();
            return decode_price_pair(&hit);
        }

        let (mut price, mut details) = self.price_via_details(id, true, force).await;
        if price.is_none() {
            (price, details) = self.price_via_details(id, false, force).await;
        }
        self.cache
            .set(key, json!({"price": price, "details": details}));
        (price, details)
    }

    async fn price_via_details(
        &self,
        id: &str,
        authed: bool,
        force: bool,
    ) -> (Option<i64>, Option<Value>) {
        match self.fetch_details(id, authed, force).await {
            Some(data) => {
                let price = extract_price(&data);
                (price, Some(data))
            }
            None => (None, None),
        }
    }

    /// Cached JSON GET with the retry/backoff policy.
    async fn get_json(&self, url: &str, cookie: Option<&str>, force: bool) -> Option<Value> {
        let key = TtlCache::key("httpjson", cookie.is_some(), url);
        if let Some(hit) = self.cache.get(&key, force) {
            return Some(hit);
        }

        for attempt in 0..FETCH_ATTEMPTS {
            self.gate.acquire().await;
            match self.attempt_get(url, cookie).await {
                FetchOutcome::Found(data) => {
                    crate::metrics::record_fetch_attempt("found");
                    self.cache.set(key, data.clone());
                    return Some(data);
                }
                FetchOutcome::NotFound => {
                    crate::metrics::record_fetch_attempt("unauthorized");
                    return None;
                }
                FetchOutcome::Transient(reason) => {
                    crate::metrics::record_fetch_attempt("transient");
                    tracing::warn!(url, attempt, %reason, authed = cookie.is_some(), "fetch attempt failed");
                    backoff(attempt).await;
                }
            }
        }
        None
    }

    async fn attempt_get(&self, url: &str, cookie: Option<&str>) -> FetchOutcome {
        let mut request = self.http.get(url);
        if let Some(credential) = cookie {
            request = request.header(
                reqwest::header::COOKIE,
                format!(".ROBLOSECURITY={credential}"),
            );
        }
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return FetchOutcome::Transient(format!("network: {e}")),
        };
        match response.status() {
            StatusCode::OK => match response.json::<Value>().await {
                Ok(data) => FetchOutcome::Found(data),
                Err(e) => FetchOutcome::Transient(format!("bad body: {e}")),
            },
            StatusCode::UNAUTHORIZED => FetchOutcome::NotFound,
            status => FetchOutcome::Transient(format!("status {status}")),
        }
    }
}

async fn backoff(attempt: u32) {
    let seconds = 0.25 * f64::from(1u32 << attempt);
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}

/// Price from `priceInformation.defaultPriceInRobux`, falling back to the
/// top-level `price` key.
fn extract_price(data: &Value) -> Option<i64> {
    let raw = data
        .pointer("/priceInformation/defaultPriceInRobux")
        .filter(|v| !v.is_null())
        .or_else(|| data.get("price"))?;
    raw.as_f64().map(|p| p.round() as i64)
}

fn decode_price_pair(cached: &Value) -> (Option<i64>, Option<Value>) {
    let price = cached.get("price").and_then(Value::as_i64);
    let details = cached
        .get("details")
        .filter(|d| !d.is_null())
        .cloned();
    (price, details)
}
