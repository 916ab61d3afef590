//! Scan orchestration: single lookups and bounded-concurrency batches.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::fetch::ListingClient;
use crate::layout::{self, Component};
use crate::{derive, metrics};

/// In-flight lookup ceiling for batch scans. Keeps a burst of IDs from
/// stampeding the rate gate and the upstream service.
pub const MAX_CONCURRENT_SCANS: usize = 6;

/// One resolved listing: the card to render plus the price that feeds the
/// batch summary.
pub struct ScanOutcome {
    pub card: Component,
    pub price: Option<i64>,
}

/// Scan a single listing ID. A force-refresh purges every cache entry
/// referencing the ID before fetching.
pub async fn scan_one(client: &ListingClient, id: &str, force: bool) -> ScanOutcome {
    let start = Instant::now();
    if force {
        client.cache().invalidate_containing(id);
    }
    let (price, details) = client.get_price_any(id, force).await;
    let found = price.is_some() || details.is_some();
    metrics::record_scan(found, start.elapsed().as_millis() as u64);
    if !found {
        return ScanOutcome {
            card: layout::not_found_card(id),
            price: None,
        };
    }
    let owner = derive::owner(details.as_ref());
    let regional = derive::regional_pricing(details.as_ref());
    ScanOutcome {
        card: layout::listing_card(id, price, owner.as_deref(), regional),
        price,
    }
}

/// Scan a batch of listing IDs concurrently and build one card per ID plus a
/// trailing summary card.
///
/// Lookups run under a counting semaphore and may complete out of order;
/// results are reassembled in input order. A failure in one item degrades
/// that item's card without aborting its siblings.
pub async fn scan_many(
    client: &Arc<ListingClient>,
    ids: &[String],
    force: bool,
) -> Vec<Component> {
    if ids.is_empty() {
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_SCANS));
    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
        let client = Arc::clone(client);
        let semaphore = Arc::clone(&semaphore);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            scan_one(&client, &id, force).await
        }));
    }

    let mut cards = Vec::with_capacity(ids.len() + 1);
    let mut total_price: i64 = 0;
    let mut with_price = 0usize;
    for (handle, id) in handles.into_iter().zip(ids) {
        match handle.await {
            Ok(outcome) => {
                if let Some(price) = outcome.price {
                    with_price += 1;
                    total_price += price;
                }
                cards.push(outcome.card);
            }
            Err(e) => {
                tracing::warn!(listing_id = %id, error = %e, "scan task failed");
                cards.push(layout::degraded_card(id));
            }
        }
    }
    cards.push(layout::summary_card(total_price, ids.len(), with_price));
    cards
}
