//! Known price feeds
//!
//! The feed ids the deployed markets reference, mapped to display symbols.

use crate::types::FeedId;

pub const BTC_USD: &str = "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43";
pub const ETH_USD: &str = "ff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace";
// APT feed stands in for MOVE until a native feed ships.
pub const MOVE_USD: &str = "03ae4db29ed4ae33d323568895aa00337e658e348b37509f5372ae51f0af00d5";
pub const SOL_USD: &str = "ef0d8b6fda2ceba41da15d4095d1da392a0d2f8ed0c6c7bc0f4cfac8c280b56d";

/// (symbol, feed id hex) for every supported feed.
pub const KNOWN_FEEDS: [(&str, &str); 4] = [
    ("BTC_USD", BTC_USD),
    ("ETH_USD", ETH_USD),
    ("MOVE_USD", MOVE_USD),
    ("SOL_USD", SOL_USD),
];

/// All supported feed ids, for whole-registry fetches.
pub fn all_feed_ids() -> Vec<FeedId> {
    KNOWN_FEEDS
        .iter()
        .map(|(_, hex)| FeedId::from_hex(hex))
        .collect()
}

/// Display symbol for a feed id, tolerant of the 0x prefix and case.
pub fn feed_id_to_symbol(feed_id: &FeedId) -> Option<&'static str> {
    KNOWN_FEEDS
        .iter()
        .find(|(_, hex)| FeedId::from_hex(hex) == *feed_id)
        .map(|(symbol, _)| *symbol)
}

/// Feed id for a display symbol.
pub fn symbol_to_feed_id(symbol: &str) -> Option<FeedId> {
    KNOWN_FEEDS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, hex)| FeedId::from_hex(hex))
}
