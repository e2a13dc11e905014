#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use launchpad_service::api::{MetadataUploader, PoolSource, UploadRequest, UploadResponse};
use launchpad_service::config::Config;
use launchpad_service::feed::FeedStore;
use launchpad_service::models::{FeedUpdate, Pool, UpdateKind};
use launchpad_service::rewards::{AmmFees, BondingCurveFees, RewardAggregator};
use launchpad_service::solana::cp_amm::{CpAmmPool, CpAmmPosition};
use launchpad_service::solana::layout::U256;
use launchpad_service::solana::{Pubkey, TransactionSubmitter};
use launchpad_service::web::AppState;
use launchpad_service::{Error, Result};

pub const WSOL: &str = "So11111111111111111111111111111111111111112";
pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

// Helper to create a default test config
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.feed.partner_configs = vec!["PartnerCfg".to_string()];
    config.feed.priority_token = Some("PriorityMint".to_string());
    config.server.port = 18080;
    config
}

pub fn make_pool(id: &str, mint: &str, created_at: &str, bonding_curve: f64) -> Pool {
    let mut pool = Pool {
        id: id.to_string(),
        bonding_curve,
        created_at: Some(created_at.to_string()),
        ..Pool::default()
    };
    pool.base_asset.id = mint.to_string();
    pool.base_asset.name = format!("Token {}", mint);
    pool.base_asset.symbol = mint.chars().take(4).collect::<String>().to_uppercase();
    pool
}

pub fn event(kind: UpdateKind, pool: Pool) -> FeedUpdate {
    FeedUpdate { kind, pool }
}

/// A text frame in the shape the vendor stream pushes.
pub fn stream_frame(events: &[FeedUpdate]) -> String {
    serde_json::json!({ "type": "updates", "data": events }).to_string()
}

pub fn test_state(pools: FakePools) -> AppState {
    AppState::new(
        Arc::new(FeedStore::new(None)),
        Arc::new(pools),
        RewardAggregator::unconfigured(),
    )
}

#[derive(Default)]
pub struct FakePools(pub HashMap<String, Pool>);

impl FakePools {
    pub fn with(mut self, token_id: &str, pool: Pool) -> Self {
        self.0.insert(token_id.to_string(), pool);
        self
    }
}

#[async_trait]
impl PoolSource for FakePools {
    async fn fetch_pool_data(&self, token_id: &str) -> Option<Pool> {
        self.0.get(token_id).cloned()
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub fail: bool,
    pub received: Mutex<Vec<UploadRequest>>,
}

#[async_trait]
impl MetadataUploader for FakeUploader {
    async fn upload_token_metadata(&self, request: &UploadRequest) -> Result<UploadResponse> {
        self.received.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(Error::UploadError("Failed to upload file to Pinata: 401".to_string()));
        }
        Ok(UploadResponse {
            success: true,
            image_url: format!("https://ipfs.io/ipfs/logo-{}", request.mint),
            metadata_url: format!("https://ipfs.io/ipfs/meta-{}", request.mint),
        })
    }
}

pub struct FakeSubmitter {
    pub outcome: std::result::Result<String, String>,
}

#[async_trait]
impl TransactionSubmitter for FakeSubmitter {
    async fn send_and_confirm(&self, _signed_base64: &str, _timeout: Duration) -> Result<String> {
        self.outcome.clone().map_err(Error::TransactionFailed)
    }
}

/// Bonding-curve fees keyed by pool; pools not listed belong to another program.
#[derive(Default)]
pub struct FakeBondingCurve {
    pub fees: HashMap<String, u64>,
    pub pools_by_mint: HashMap<String, String>,
}

#[async_trait]
impl BondingCurveFees for FakeBondingCurve {
    async fn creator_quote_fee(&self, pool: &str) -> Result<u64> {
        self.fees
            .get(pool)
            .copied()
            .ok_or_else(|| Error::AccountDiscriminatorMismatch(pool.to_string()))
    }

    async fn pool_by_base_mint(&self, base_mint: &str) -> Result<Option<String>> {
        Ok(self.pools_by_mint.get(base_mint).cloned())
    }
}

#[derive(Default)]
pub struct FakeAmm {
    pub positions: Vec<String>,
    pub pool: Option<CpAmmPool>,
    pub states: HashMap<String, CpAmmPosition>,
}

#[async_trait]
impl AmmFees for FakeAmm {
    async fn user_positions_by_pool(&self, _pool: &str, _owner: &str) -> Result<Vec<String>> {
        Ok(self.positions.clone())
    }

    async fn pool_state(&self, _pool: &str) -> Result<Option<CpAmmPool>> {
        Ok(self.pool.clone())
    }

    async fn position_state(&self, position: &str) -> Result<Option<CpAmmPosition>> {
        Ok(self.states.get(position).cloned())
    }
}

pub fn amm_pool(fee_a_per_liquidity: U256, fee_b_per_liquidity: U256) -> CpAmmPool {
    CpAmmPool {
        token_a_mint: Pubkey::default(),
        token_b_mint: Pubkey::default(),
        liquidity: 0,
        fee_a_per_liquidity,
        fee_b_per_liquidity,
    }
}

pub fn amm_position(liquidity: u128, fee_a_pending: u64, fee_b_pending: u64) -> CpAmmPosition {
    CpAmmPosition {
        pool: Pubkey::default(),
        nft_mint: Pubkey::default(),
        fee_a_per_token_checkpoint: U256::zero(),
        fee_b_per_token_checkpoint: U256::zero(),
        fee_a_pending,
        fee_b_pending,
        unlocked_liquidity: liquidity,
        vested_liquidity: 0,
        permanent_locked_liquidity: 0,
    }
}
