use serde::{Deserialize, Serialize};
use super::pool::{Pool, SocialLinks};

/// Which list a token is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    New,
    Soon,
    Bonded,
}

/// Display record for a token, carrying the pool it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenWithPool {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap: f64,
    pub volume: f64,
    pub progress: f64,
    pub category: Category,
    pub image: Option<String>,
    pub created_at: Option<String>,
    pub pool: Pool,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

pub fn map_pool_to_token(pool: &Pool, category: Category) -> TokenWithPool {
    let asset = &pool.base_asset;
    let created_at = asset
        .first_pool
        .as_ref()
        .and_then(|fp| non_empty(&fp.created_at))
        .or_else(|| non_empty(&asset.created_at))
        .or_else(|| pool.created_at.clone());

    TokenWithPool {
        id: pool.id.clone(),
        name: if asset.name.is_empty() { "Unknown".to_string() } else { asset.name.clone() },
        symbol: if asset.symbol.is_empty() { "???".to_string() } else { asset.symbol.clone() },
        market_cap: asset.mcap,
        volume: pool.volume_24h,
        progress: match category {
            Category::Bonded => 100.0,
            _ => pool.bonding_curve,
        },
        category,
        image: non_empty(&asset.icon),
        created_at,
        pool: pool.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    New,
    Update,
    Graduated,
}

/// One typed event pushed by the vendor stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedUpdate {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    pub pool: Pool,
}

/// The three live lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub recent: Vec<TokenWithPool>,
    pub about_to_graduate: Vec<TokenWithPool>,
    pub graduated: Vec<TokenWithPool>,
}

impl FeedSnapshot {
    pub fn len(&self) -> usize {
        self.recent.len() + self.about_to_graduate.len() + self.graduated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_graduated(&self, token_id: &str) -> bool {
        self.graduated
            .iter()
            .any(|t| t.pool.base_asset.id == token_id || t.id == token_id)
    }
}

/// Raw pools returned by the aggregator's initial listing call.
#[derive(Debug, Clone, Default)]
pub struct InitialPools {
    pub recent: Vec<Pool>,
    pub about_to_graduate: Vec<Pool>,
    pub graduated: Vec<Pool>,
}

/// A token launched through this app, as stored in the `fairlytokens` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FairlyToken {
    pub token_id: String,
    pub creator_id: String,
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
}

/// A stored token projected into the same shape as a feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyToken {
    #[serde(flatten)]
    pub token: TokenWithPool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub links: SocialLinks,
}

impl MyToken {
    /// Tokens created here are assumed bonded; market metrics are unknown and
    /// left at zero.
    pub fn from_row(row: FairlyToken, now: &str) -> Self {
        let mut pool = Pool {
            id: format!("pool_{}", row.token_id),
            bonding_curve: 100.0,
            created_at: Some(now.to_string()),
            ..Pool::default()
        };
        pool.base_asset.id = row.token_id.clone();
        pool.base_asset.name = row.name.clone();
        pool.base_asset.symbol = row.symbol.clone();
        pool.base_asset.icon = row.image.clone();

        Self {
            token: TokenWithPool {
                id: row.token_id,
                name: row.name,
                symbol: row.symbol,
                market_cap: 0.0,
                volume: 0.0,
                progress: 100.0,
                category: Category::Bonded,
                image: row.image,
                created_at: Some(now.to_string()),
                pool,
            },
            description: row.description,
            links: SocialLinks {
                twitter: row.twitter,
                telegram: row.telegram,
                website: row.website,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pool::FirstPool;

    fn pool(id: &str) -> Pool {
        let mut pool = Pool {
            id: id.to_string(),
            bonding_curve: 63.0,
            volume_24h: 12.0,
            created_at: Some("2025-06-01T00:00:00Z".to_string()),
            ..Pool::default()
        };
        pool.base_asset.mcap = 4200.0;
        pool
    }

    #[test]
    fn test_map_pool_defaults() {
        let token = map_pool_to_token(&pool("p1"), Category::New);
        assert_eq!(token.name, "Unknown");
        assert_eq!(token.symbol, "???");
        assert_eq!(token.progress, 63.0);
        assert_eq!(token.market_cap, 4200.0);
        assert_eq!(token.volume, 12.0);
        assert_eq!(token.image, None);
        assert_eq!(token.created_at.as_deref(), Some("2025-06-01T00:00:00Z"));
    }

    #[test]
    fn test_map_pool_bonded_progress_and_first_pool_time() {
        let mut p = pool("p1");
        p.base_asset.first_pool = Some(FirstPool {
            id: "p0".to_string(),
            created_at: Some("2025-05-01T00:00:00Z".to_string()),
        });
        let token = map_pool_to_token(&p, Category::Bonded);
        assert_eq!(token.progress, 100.0);
        assert_eq!(token.created_at.as_deref(), Some("2025-05-01T00:00:00Z"));
    }

    #[test]
    fn test_feed_update_wire_format() {
        let update: FeedUpdate =
            serde_json::from_str(r#"{"type":"graduated","pool":{"id":"abc"}}"#).unwrap();
        assert_eq!(update.kind, UpdateKind::Graduated);
        assert_eq!(update.pool.id, "abc");
    }

    #[test]
    fn test_my_token_projection() {
        let row = FairlyToken {
            token_id: "mint1".to_string(),
            creator_id: "wallet1".to_string(),
            name: "Fairly".to_string(),
            symbol: "FAIR".to_string(),
            description: Some("desc".to_string()),
            image: None,
            website: Some("https://fairly.best".to_string()),
            twitter: None,
            telegram: None,
        };
        let token = MyToken::from_row(row, "2025-06-01T00:00:00Z");
        assert_eq!(token.token.pool.id, "pool_mint1");
        assert_eq!(token.token.category, Category::Bonded);
        assert_eq!(token.token.pool.bonding_curve, 100.0);

        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["id"], "mint1");
        assert_eq!(json["website"], "https://fairly.best");
        assert_eq!(json["description"], "desc");
        assert!(json.get("twitter").is_none());
    }
}
