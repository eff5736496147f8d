//! Pyth Hermes REST client
//!
//! Fetches latest prices and the binary update payload from a Hermes
//! endpoint. Prices are decoded exactly from mantissa and exponent; no
//! float round-trip between the feed and the resolution rule.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use super::{feeds, OracleError, PriceFeed, PriceQuote};
use crate::types::FeedId;

pub const DEFAULT_HERMES_ENDPOINT: &str = "https://hermes.pyth.network";

/// REST client for a Pyth Hermes endpoint.
pub struct HermesClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestPriceResponse {
    binary: BinaryData,
    #[serde(default)]
    parsed: Vec<ParsedUpdate>,
}

#[derive(Debug, Deserialize)]
struct BinaryData {
    #[serde(default)]
    data: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ParsedUpdate {
    id: String,
    price: ParsedPrice,
}

#[derive(Debug, Deserialize)]
struct ParsedPrice {
    price: String,
    conf: String,
    expo: i32,
    publish_time: i64,
}

/// Exact `mantissa * 10^expo` as a Decimal.
fn decode_fixed_point(mantissa: &str, expo: i32) -> Result<Decimal, OracleError> {
    let mantissa: i128 = mantissa
        .parse()
        .map_err(|_| OracleError::Malformed(format!("bad price mantissa {mantissa:?}")))?;
    if expo <= 0 {
        Decimal::try_from_i128_with_scale(mantissa, expo.unsigned_abs())
            .map_err(|e| OracleError::Malformed(format!("price out of range: {e}")))
    } else {
        let scaled = mantissa
            .checked_mul(10i128.checked_pow(expo as u32).ok_or_else(|| {
                OracleError::Malformed(format!("price exponent out of range: {expo}"))
            })?)
            .ok_or_else(|| OracleError::Malformed("price out of range".to_string()))?;
        Decimal::try_from_i128_with_scale(scaled, 0)
            .map_err(|e| OracleError::Malformed(format!("price out of range: {e}")))
    }
}

impl HermesClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn latest_updates(
        &self,
        feed_ids: &[FeedId],
    ) -> Result<LatestPriceResponse, OracleError> {
        let mut url = format!("{}/v2/updates/price/latest", self.base_url);
        let query: Vec<String> = feed_ids.iter().map(|id| format!("ids[]={id}")).collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(OracleError::Malformed(format!(
                "hermes returned {status}: {detail}"
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PriceFeed for HermesClient {
    async fn latest_prices(
        &self,
        feed_ids: &[FeedId],
    ) -> Result<HashMap<String, PriceQuote>, OracleError> {
        let response = self.latest_updates(feed_ids).await?;

        let mut prices = HashMap::new();
        for update in response.parsed {
            let feed_id = FeedId::from_hex(&update.id);
            let Some(symbol) = feeds::feed_id_to_symbol(&feed_id) else {
                warn!(feed = %feed_id, "price update for unknown feed, skipping");
                continue;
            };
            let price = decode_fixed_point(&update.price.price, update.price.expo)?;
            let confidence = decode_fixed_point(&update.price.conf, update.price.expo)?;
            prices.insert(
                symbol.to_string(),
                PriceQuote {
                    symbol: symbol.to_string(),
                    feed_id,
                    price,
                    confidence,
                    publish_time: update.price.publish_time,
                },
            );
        }
        Ok(prices)
    }

    async fn price_update_data(&self, feed_ids: &[FeedId]) -> Result<Vec<Vec<u8>>, OracleError> {
        let response = self.latest_updates(feed_ids).await?;
        response
            .binary
            .data
            .iter()
            .map(|chunk| {
                hex::decode(chunk.trim_start_matches("0x"))
                    .map_err(|e| OracleError::Malformed(format!("bad update payload: {e}")))
            })
            .collect()
    }
}
