//! Display helpers shared by the feed and token routes.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::models::{FeedSnapshot, Pool};

const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Dollar amount with a B/M/K suffix, precision shrinking as the value grows.
pub fn prettify_number(num: f64) -> String {
    if num >= 1_000_000_000.0 {
        format!("${:.2}B", num / 1_000_000_000.0)
    } else if num >= 1_000_000.0 {
        format!("${:.2}M", num / 1_000_000.0)
    } else if num >= 100_000.0 {
        format!("${:.0}K", num / 1000.0)
    } else if num >= 10_000.0 {
        format!("${:.1}K", num / 1000.0)
    } else if num >= 1000.0 {
        format!("${:.2}K", num / 1000.0)
    } else if num >= 100.0 {
        format!("${:.0}", num)
    } else if num >= 10.0 {
        format!("${:.1}", num)
    } else {
        format!("${:.2}", num)
    }
}

/// Shortens an address to its first and last `chars` characters.
pub fn format_address(address: &str, chars: usize) -> String {
    let count = address.chars().count();
    if count <= chars * 2 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(count - chars).collect();
    format!("{}...{}", head, tail)
}

pub fn total_transactions(pool: &Pool) -> u64 {
    pool.base_asset
        .stats_24h
        .as_ref()
        .map(|s| s.num_buys + s.num_sells)
        .unwrap_or(0)
}

pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLinks {
    pub dexscreener: String,
    pub jupiter: String,
    pub axiom: String,
    pub solscan: String,
    pub x_search: String,
}

/// External explorer and trading links. Bonded tokens chart by pool address.
pub fn token_links(token_id: &str, pool_id: Option<&str>, bonded: bool) -> TokenLinks {
    let chart_id = match pool_id {
        Some(pool) if bonded => pool,
        _ => token_id,
    };
    TokenLinks {
        dexscreener: format!("https://dexscreener.com/solana/{}", chart_id),
        jupiter: format!("https://jup.ag/swap/{}-{}", SOL_MINT, token_id),
        axiom: format!("https://axiom.trade/t/{}/@fairly", token_id),
        solscan: format!("https://solscan.io/token/{}", token_id),
        x_search: format!("https://x.com/search?q={}", token_id),
    }
}

/// A token counts as bonded once it shows up in the graduated bucket, carries
/// a graduation time, or its curve is full.
pub fn is_token_bonded(pool: Option<&Pool>, snapshot: Option<&FeedSnapshot>, token_id: &str) -> bool {
    let Some(pool) = pool else {
        return false;
    };
    if snapshot.map_or(false, |s| s.is_graduated(token_id)) {
        return true;
    }
    let graduated = [&pool.base_asset.graduated_at, &pool.graduated_at]
        .into_iter()
        .flatten()
        .any(|at| !at.is_empty());
    graduated || pool.bonding_curve >= 100.0
}
