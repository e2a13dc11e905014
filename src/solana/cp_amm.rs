//! Reader for the constant-product AMM program that graduated tokens migrate to.

use std::collections::HashSet;
use std::sync::Arc;
use async_trait::async_trait;
use log::debug;
use solana_sdk::pubkey;

use crate::error::{Error, Result};
use crate::rewards::AmmFees;
use super::layout::{
    account_discriminator, check_discriminator, read_pubkey, read_u128, read_u256, read_u64,
    U256, U512,
};
use super::{memcmp, parse_pubkey, Pubkey, RpcClient, TOKEN_2022_PROGRAM_ID};

pub const CP_AMM_PROGRAM_ID: Pubkey = pubkey!("cpamdpZCGKUy5JxQXB4dcpGPiikHawvSWAd6mEn1sGG");
const POOL: &str = "Pool";
const POSITION: &str = "Position";

/// Fee-per-liquidity values are Q128 fixed point.
const LIQUIDITY_SCALE: usize = 128;

// Pool field offsets.
const POOL_TOKEN_A_MINT: usize = 168;
const POOL_TOKEN_B_MINT: usize = 200;
const POOL_LIQUIDITY: usize = 360;
const POOL_FEE_A_PER_LIQUIDITY: usize = 488;
const POOL_FEE_B_PER_LIQUIDITY: usize = 520;

// Position field offsets.
const POSITION_POOL: usize = 8;
const POSITION_NFT_MINT: usize = 40;
const POSITION_FEE_A_CHECKPOINT: usize = 72;
const POSITION_FEE_B_CHECKPOINT: usize = 104;
const POSITION_FEE_A_PENDING: usize = 136;
const POSITION_FEE_B_PENDING: usize = 144;
const POSITION_UNLOCKED_LIQUIDITY: usize = 152;
const POSITION_VESTED_LIQUIDITY: usize = 168;
const POSITION_PERMANENT_LOCKED_LIQUIDITY: usize = 184;

#[derive(Debug, Clone, PartialEq)]
pub struct CpAmmPool {
    pub token_a_mint: Pubkey,
    pub token_b_mint: Pubkey,
    pub liquidity: u128,
    pub fee_a_per_liquidity: U256,
    pub fee_b_per_liquidity: U256,
}

impl CpAmmPool {
    pub fn decode(address: &str, data: &[u8]) -> Result<Self> {
        check_discriminator(data, POOL, address)?;
        Ok(Self {
            token_a_mint: read_pubkey(data, POOL_TOKEN_A_MINT)?,
            token_b_mint: read_pubkey(data, POOL_TOKEN_B_MINT)?,
            liquidity: read_u128(data, POOL_LIQUIDITY)?,
            fee_a_per_liquidity: read_u256(data, POOL_FEE_A_PER_LIQUIDITY)?,
            fee_b_per_liquidity: read_u256(data, POOL_FEE_B_PER_LIQUIDITY)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpAmmPosition {
    pub pool: Pubkey,
    pub nft_mint: Pubkey,
    pub fee_a_per_token_checkpoint: U256,
    pub fee_b_per_token_checkpoint: U256,
    pub fee_a_pending: u64,
    pub fee_b_pending: u64,
    pub unlocked_liquidity: u128,
    pub vested_liquidity: u128,
    pub permanent_locked_liquidity: u128,
}

impl CpAmmPosition {
    pub fn decode(address: &str, data: &[u8]) -> Result<Self> {
        check_discriminator(data, POSITION, address)?;
        Ok(Self {
            pool: read_pubkey(data, POSITION_POOL)?,
            nft_mint: read_pubkey(data, POSITION_NFT_MINT)?,
            fee_a_per_token_checkpoint: read_u256(data, POSITION_FEE_A_CHECKPOINT)?,
            fee_b_per_token_checkpoint: read_u256(data, POSITION_FEE_B_CHECKPOINT)?,
            fee_a_pending: read_u64(data, POSITION_FEE_A_PENDING)?,
            fee_b_pending: read_u64(data, POSITION_FEE_B_PENDING)?,
            unlocked_liquidity: read_u128(data, POSITION_UNLOCKED_LIQUIDITY)?,
            vested_liquidity: read_u128(data, POSITION_VESTED_LIQUIDITY)?,
            permanent_locked_liquidity: read_u128(data, POSITION_PERMANENT_LOCKED_LIQUIDITY)?,
        })
    }

    pub fn total_liquidity(&self) -> U512 {
        U512::from(self.unlocked_liquidity)
            + U512::from(self.vested_liquidity)
            + U512::from(self.permanent_locked_liquidity)
    }
}

/// Fees a position has earned but not yet claimed, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnclaimedReward {
    pub fee_token_a: u64,
    pub fee_token_b: u64,
}

fn widen(value: U256) -> U512 {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    U512::from_little_endian(&bytes)
}

fn accrued(liquidity: U512, global: U256, checkpoint: U256, pending: u64) -> u64 {
    let delta = global.saturating_sub(checkpoint);
    let earned = (liquidity * widen(delta)) >> LIQUIDITY_SCALE;
    let earned = if earned > U512::from(u64::MAX) { u64::MAX } else { earned.low_u64() };
    earned.saturating_add(pending)
}

/// Pending fees plus fees accrued since the position's last checkpoint.
pub fn unclaimed_reward(pool: &CpAmmPool, position: &CpAmmPosition) -> UnclaimedReward {
    let liquidity = position.total_liquidity();
    UnclaimedReward {
        fee_token_a: accrued(
            liquidity,
            pool.fee_a_per_liquidity,
            position.fee_a_per_token_checkpoint,
            position.fee_a_pending,
        ),
        fee_token_b: accrued(
            liquidity,
            pool.fee_b_per_liquidity,
            position.fee_b_per_token_checkpoint,
            position.fee_b_pending,
        ),
    }
}

#[derive(Debug, Clone)]
pub struct CpAmmClient {
    rpc: Arc<RpcClient>,
}

impl CpAmmClient {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    async fn fetch_optional<T>(
        &self,
        address: &str,
        decode: fn(&str, &[u8]) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.rpc.get_account(&parse_pubkey(address)?).await? {
            Some(account) => decode(address, &account.data).map(Some),
            None => Ok(None),
        }
    }

    pub async fn fetch_pool_state(&self, pool: &str) -> Result<Option<CpAmmPool>> {
        self.fetch_optional(pool, CpAmmPool::decode).await
    }

    pub async fn fetch_position_state(&self, position: &str) -> Result<Option<CpAmmPosition>> {
        self.fetch_optional(position, CpAmmPosition::decode).await
    }

    /// Positions in `pool` whose position NFT is held by `owner`.
    pub async fn get_user_positions_by_pool(&self, pool: &str, owner: &str) -> Result<Vec<String>> {
        let pool_key = parse_pubkey(pool)?;
        let owner_key = parse_pubkey(owner)?;
        if self.rpc.get_account(&pool_key).await?.is_none() {
            return Err(Error::AccountNotFound(pool.to_string()));
        }

        let held_nfts: HashSet<String> = self
            .rpc
            .get_token_accounts_by_owner(&owner_key, &TOKEN_2022_PROGRAM_ID)
            .await?
            .into_iter()
            .filter(|holding| holding.amount == 1)
            .map(|holding| holding.mint)
            .collect();
        if held_nfts.is_empty() {
            return Ok(Vec::new());
        }

        let filters = vec![
            memcmp(0, &account_discriminator(POSITION)),
            memcmp(POSITION_POOL, pool_key.as_ref()),
        ];
        let positions = self.rpc.get_program_accounts(&CP_AMM_PROGRAM_ID, filters).await?;

        let owned: Vec<String> = positions
            .into_iter()
            .filter_map(|(address, account)| {
                let nft = read_pubkey(&account.data, POSITION_NFT_MINT).ok()?;
                held_nfts.contains(&nft.to_string()).then(|| address.to_string())
            })
            .collect();
        debug!("{} holds {} positions in pool {}", owner, owned.len(), pool);
        Ok(owned)
    }
}

#[async_trait]
impl AmmFees for CpAmmClient {
    async fn user_positions_by_pool(&self, pool: &str, owner: &str) -> Result<Vec<String>> {
        self.get_user_positions_by_pool(pool, owner).await
    }

    async fn pool_state(&self, pool: &str) -> Result<Option<CpAmmPool>> {
        self.fetch_pool_state(pool).await
    }

    async fn position_state(&self, position: &str) -> Result<Option<CpAmmPosition>> {
        self.fetch_position_state(position).await
    }
}
