//! gpscan — marketplace gamepass price scanner.
//!
//! Resolves listing IDs from free-form text, fetches pricing and ownership
//! details from the platform API through a rate-limited caching fetch layer,
//! derives display figures (post-fee payout, owner handle, regional-pricing
//! status), and packs rendered cards into capacity-bounded message chunks
//! for webhook delivery.
//!
//! # Pipeline
//!
//! text → [`extract`] → IDs → [`rate`] + [`cache`]-backed [`fetch`] →
//! [`derive`] → [`layout`] cards → [`deliver`] chunks

pub mod cache;
pub mod config;
pub mod deliver;
pub mod derive;
pub mod extract;
pub mod fetch;
pub mod health;
pub mod layout;
pub mod metrics;
pub mod rate;
pub mod scan;

use std::sync::Arc;

use eyre::Result;

use crate::cache::TtlCache;
use crate::config::{Config, RenderKind};
use crate::fetch::ListingClient;
use crate::layout::{ComponentsV2, LegacyEmbeds, RenderBackend};
use crate::rate::RateGate;

/// Wire the cache, rate gate, and HTTP client from a resolved config.
pub fn build_client(config: &Config) -> Result<Arc<ListingClient>> {
    let cache = Arc::new(TtlCache::new(config.cache_ttl_seconds));
    let gate = Arc::new(RateGate::new(config.api_rps, config.api_burst));
    Ok(Arc::new(ListingClient::new(
        &config.api_base_url,
        config.credential.clone(),
        cache,
        gate,
    )?))
}

/// Render backend selected by configuration.
pub fn render_backend(kind: RenderKind) -> Box<dyn RenderBackend> {
    match kind {
        RenderKind::Components => Box::new(ComponentsV2),
        RenderKind::Embeds => Box::new(LegacyEmbeds),
    }
}
