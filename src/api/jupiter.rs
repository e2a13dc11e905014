use async_trait::async_trait;
use log::{error, info};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::JupiterConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::{InitialPools, Pool, PoolResponse};
use crate::utils::cache::Cache;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TIMEFRAME: &str = "24h";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketQuery {
    timeframe: String,
    partner_configs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GemsRequest {
    recent: BucketQuery,
    graduated: BucketQuery,
    about_to_graduate: BucketQuery,
}

#[derive(Debug, Deserialize, Default)]
struct GemsBucket {
    #[serde(default)]
    pools: Option<Vec<Pool>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GemsResponse {
    #[serde(default)]
    recent: Option<GemsBucket>,
    #[serde(default)]
    about_to_graduate: Option<GemsBucket>,
    #[serde(default)]
    graduated: Option<GemsBucket>,
}

fn bucket_pools(bucket: Option<GemsBucket>) -> Vec<Pool> {
    bucket.and_then(|b| b.pools).unwrap_or_default()
}

/// Client for the aggregator's pool endpoints.
#[derive(Debug, Clone)]
pub struct JupiterClient {
    client: Client,
    pools_url: String,
    gems_url: String,
    partner_configs: Vec<String>,
    pool_cache: Cache<Option<Pool>>,
}

impl JupiterClient {
    pub fn new(config: &JupiterConfig, partner_configs: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            pools_url: config.pools_url.clone(),
            gems_url: config.gems_url.clone(),
            partner_configs,
            pool_cache: Cache::new(config.cache_ttl_secs),
        })
    }

    async fn request_pool(&self, token_id: &str) -> Result<Option<Pool>> {
        let response = self
            .client
            .get(&self.pools_url)
            .query(&[("assetIds", token_id)])
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let data: PoolResponse = response.json().await.map_err(|e| {
                    Error::ApiInvalidFormat(format!("Failed to parse pool response: {}", e))
                })?;
                Ok(data.pools.into_iter().next())
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(Error::ApiError(format!("HTTP error! status: {}", status))),
        }
    }

    /// Looks up the pool for a token. Failures are logged and reported as no pool.
    pub async fn fetch_pool_data(&self, token_id: &str) -> Option<Pool> {
        if let Some(cached) = self.pool_cache.get(token_id).await {
            return cached;
        }

        match self.request_pool(token_id).await {
            Ok(pool) => {
                self.pool_cache.set(token_id.to_string(), pool.clone()).await;
                pool
            }
            Err(e) => {
                metrics::API_ERRORS.inc();
                error!("Failed to fetch pool data for {}: {}", token_id, e);
                None
            }
        }
    }

    async fn request_initial_pools(&self) -> Result<InitialPools> {
        let query = BucketQuery {
            timeframe: TIMEFRAME.to_string(),
            partner_configs: self.partner_configs.clone(),
        };
        let body = GemsRequest {
            recent: query.clone(),
            graduated: query.clone(),
            about_to_graduate: query,
        };

        let response = self.client.post(&self.gems_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!("HTTP error! status: {}", response.status())));
        }

        let data: GemsResponse = response.json().await.map_err(|e| {
            Error::ApiInvalidFormat(format!("Failed to parse pools listing: {}", e))
        })?;
        Ok(InitialPools {
            recent: bucket_pools(data.recent),
            about_to_graduate: bucket_pools(data.about_to_graduate),
            graduated: bucket_pools(data.graduated),
        })
    }

    /// Fetches the three initial lists. Failures degrade to empty lists.
    pub async fn fetch_initial_pools(&self) -> InitialPools {
        match self.request_initial_pools().await {
            Ok(pools) => {
                info!(
                    "Fetched initial pools: {} recent, {} about to graduate, {} graduated",
                    pools.recent.len(),
                    pools.about_to_graduate.len(),
                    pools.graduated.len()
                );
                pools
            }
            Err(e) => {
                metrics::API_ERRORS.inc();
                error!("Failed to fetch initial pools data: {}", e);
                InitialPools::default()
            }
        }
    }
}

/// Source of pool lookups for the HTTP routes.
#[async_trait]
pub trait PoolSource: Send + Sync {
    async fn fetch_pool_data(&self, token_id: &str) -> Option<Pool>;
}

#[async_trait]
impl PoolSource for JupiterClient {
    async fn fetch_pool_data(&self, token_id: &str) -> Option<Pool> {
        JupiterClient::fetch_pool_data(self, token_id).await
    }
}
