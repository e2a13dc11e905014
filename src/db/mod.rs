//! Read access to the launchpad's own token records.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::Result;
use crate::models::{FairlyToken, MyToken};

const MY_TOKENS_QUERY: &str =
    "SELECT * FROM fairlytokens WHERE creator_id = $1 ORDER BY token_id DESC";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Tokens created by `wallet`, newest id first.
    async fn my_tokens(&self, wallet: &str) -> Result<Vec<MyToken>>;
}

#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!("Connected to database with up to {} connections", max_connections);
        Ok(Self { pool })
    }

    pub async fn tokens_by_creator(&self, wallet: &str) -> Result<Vec<FairlyToken>> {
        let rows = sqlx::query_as::<_, FairlyToken>(MY_TOKENS_QUERY)
            .bind(wallet)
            .fetch_all(&self.pool)
            .await?;
        debug!("Found {} tokens for creator {}", rows.len(), wallet);
        Ok(rows)
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    async fn my_tokens(&self, wallet: &str) -> Result<Vec<MyToken>> {
        let now = Utc::now().to_rfc3339();
        Ok(self
            .tokens_by_creator(wallet)
            .await?
            .into_iter()
            .map(|row| MyToken::from_row(row, &now))
            .collect())
    }
}
