//! Reader for the dynamic bonding curve program's virtual pool accounts.

use std::sync::Arc;
use async_trait::async_trait;
use log::debug;

use solana_sdk::pubkey;

use crate::error::Result;
use crate::rewards::BondingCurveFees;
use super::layout::{account_discriminator, check_discriminator, read_pubkey, read_u64};
use super::{memcmp, parse_pubkey, Pubkey, RpcClient};

pub const DBC_PROGRAM_ID: Pubkey = pubkey!("dbcij3LWUppWqq96dh6gJWwBifmcGfLSB5D4DuSMaqN");
const VIRTUAL_POOL: &str = "VirtualPool";

// VirtualPool field offsets (discriminator included).
const CREATOR_OFFSET: usize = 104;
const BASE_MINT_OFFSET: usize = 136;
const QUOTE_RESERVE_OFFSET: usize = 240;
const TOTAL_TRADING_QUOTE_FEE_OFFSET: usize = 336;
const CREATOR_BASE_FEE_OFFSET: usize = 352;
const CREATOR_QUOTE_FEE_OFFSET: usize = 360;

/// Fee counters of a bonding-curve pool, in base units.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolFeeMetrics {
    pub creator: Pubkey,
    pub base_mint: Pubkey,
    pub quote_reserve: u64,
    pub total_trading_quote_fee: u64,
    pub creator_base_fee: u64,
    pub creator_quote_fee: u64,
}

impl PoolFeeMetrics {
    pub fn decode(address: &str, data: &[u8]) -> Result<Self> {
        check_discriminator(data, VIRTUAL_POOL, address)?;
        Ok(Self {
            creator: read_pubkey(data, CREATOR_OFFSET)?,
            base_mint: read_pubkey(data, BASE_MINT_OFFSET)?,
            quote_reserve: read_u64(data, QUOTE_RESERVE_OFFSET)?,
            total_trading_quote_fee: read_u64(data, TOTAL_TRADING_QUOTE_FEE_OFFSET)?,
            creator_base_fee: read_u64(data, CREATOR_BASE_FEE_OFFSET)?,
            creator_quote_fee: read_u64(data, CREATOR_QUOTE_FEE_OFFSET)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DbcClient {
    rpc: Arc<RpcClient>,
}

impl DbcClient {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    pub async fn pool_fee_metrics(&self, pool: &str) -> Result<PoolFeeMetrics> {
        let address = parse_pubkey(pool)?;
        let account = self.rpc.get_existing_account(&address).await?;
        PoolFeeMetrics::decode(pool, &account.data)
    }

    /// Finds the virtual pool launched for `base_mint`, if any.
    pub async fn find_pool_by_base_mint(&self, base_mint: &str) -> Result<Option<String>> {
        let mint = parse_pubkey(base_mint)?;
        let filters = vec![
            memcmp(0, &account_discriminator(VIRTUAL_POOL)),
            memcmp(BASE_MINT_OFFSET, mint.as_ref()),
        ];
        let accounts = self.rpc.get_program_accounts(&DBC_PROGRAM_ID, filters).await?;
        debug!("Found {} virtual pools for mint {}", accounts.len(), base_mint);
        Ok(accounts.into_iter().next().map(|(address, _)| address.to_string()))
    }
}

#[async_trait]
impl BondingCurveFees for DbcClient {
    async fn creator_quote_fee(&self, pool: &str) -> Result<u64> {
        Ok(self.pool_fee_metrics(pool).await?.creator_quote_fee)
    }

    async fn pool_by_base_mint(&self, base_mint: &str) -> Result<Option<String>> {
        self.find_pool_by_base_mint(base_mint).await
    }
}
