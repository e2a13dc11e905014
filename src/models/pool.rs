use serde::{Deserialize, Deserializer, Serialize};

/// Treats an explicit JSON `null` the same as a missing field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FirstPool {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    #[serde(default, deserialize_with = "null_default")]
    pub mint_authority_disabled: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub freeze_authority_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats24h {
    #[serde(default, deserialize_with = "null_default")]
    pub price_change: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub holder_change: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub liquidity_change: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub buy_volume: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub sell_volume: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub buy_organic_volume: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub sell_organic_volume: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub num_buys: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub num_sells: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub num_traders: u64,
}

/// Token-level metadata and market metrics, as reported by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BaseAsset {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub symbol: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub decimals: u8,
    #[serde(default, deserialize_with = "null_default")]
    pub dev: String,
    #[serde(default, deserialize_with = "null_default")]
    pub circ_supply: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_supply: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub token_program: String,
    #[serde(default, deserialize_with = "null_default")]
    pub launchpad: String,
    #[serde(default, deserialize_with = "null_default")]
    pub partner_config: String,
    #[serde(default)]
    pub first_pool: Option<FirstPool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub graduated_at: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub holder_count: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub audit: Audit,
    #[serde(default, deserialize_with = "null_default")]
    pub organic_score: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub organic_score_label: String,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub fdv: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub mcap: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub usd_price: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub price_block_id: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub liquidity: f64,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, rename = "stats24h")]
    pub stats_24h: Option<TokenStats24h>,
}

/// A liquidity pool record. Only `id` is mandatory so partially populated
/// stream events still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub chain: String,
    #[serde(default, deserialize_with = "null_default")]
    pub dex: String,
    #[serde(default, rename = "type", deserialize_with = "null_default")]
    pub pool_type: String,
    #[serde(default, deserialize_with = "null_default")]
    pub quote_asset: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub graduated_at: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub liquidity: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub bonding_curve: f64,
    #[serde(default, rename = "volume24h", deserialize_with = "null_default")]
    pub volume_24h: f64,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub base_asset: BaseAsset,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PoolResponse {
    #[serde(default, deserialize_with = "null_default")]
    pub pools: Vec<Pool>,
    #[serde(default, deserialize_with = "null_default")]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_aggregator_pool() {
        let pool: Pool = serde_json::from_str(
            r#"{
                "id": "pool1",
                "chain": "solana",
                "dex": "met-dbc",
                "type": "dbc",
                "quoteAsset": "So11111111111111111111111111111111111111112",
                "createdAt": "2025-06-01T12:00:00Z",
                "liquidity": 1234.5,
                "bondingCurve": 42.5,
                "volume24h": 999.0,
                "updatedAt": "2025-06-01T12:05:00Z",
                "baseAsset": {
                    "id": "mint1",
                    "name": "Fairly",
                    "symbol": "FAIR",
                    "icon": null,
                    "mcap": 50000,
                    "firstPool": { "id": "pool1", "createdAt": "2025-06-01T11:59:00Z" },
                    "stats24h": { "numBuys": 10, "numSells": 3, "priceChange": null },
                    "twitter": "https://x.com/fairly"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(pool.pool_type, "dbc");
        assert_eq!(pool.bonding_curve, 42.5);
        assert_eq!(pool.volume_24h, 999.0);
        assert_eq!(pool.base_asset.mcap, 50000.0);
        assert!(pool.base_asset.icon.is_none());
        let stats = pool.base_asset.stats_24h.as_ref().unwrap();
        assert_eq!(stats.num_buys, 10);
        assert_eq!(stats.price_change, 0.0);
        assert_eq!(pool.base_asset.twitter.as_deref(), Some("https://x.com/fairly"));
    }

    #[test]
    fn test_decode_minimal_pool() {
        let pool: Pool = serde_json::from_str(r#"{"id":"p","bondingCurve":null}"#).unwrap();
        assert_eq!(pool.id, "p");
        assert_eq!(pool.bonding_curve, 0.0);
        assert_eq!(pool.base_asset, BaseAsset::default());
    }
}
