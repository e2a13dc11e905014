//! Creator fee aggregation across the bonding-curve pool and the AMM pool a
//! token graduates to.
//!
//! Both protocol readers sit behind traits so the aggregation rules can be
//! exercised without a node. Every failure degrades to a zero reward.

use std::sync::Arc;
use async_trait::async_trait;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics;
use crate::solana::cp_amm::{unclaimed_reward, CpAmmPool, CpAmmPosition};

pub const LAMPORTS_PER_SOL: f64 = 1e9;

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BondingCurveFees: Send + Sync {
    /// Creator's accrued quote-side fee for the pool, in lamports.
    async fn creator_quote_fee(&self, pool: &str) -> Result<u64>;
    async fn pool_by_base_mint(&self, base_mint: &str) -> Result<Option<String>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AmmFees: Send + Sync {
    async fn user_positions_by_pool(&self, pool: &str, owner: &str) -> Result<Vec<String>>;
    async fn pool_state(&self, pool: &str) -> Result<Option<CpAmmPool>>;
    async fn position_state(&self, position: &str) -> Result<Option<CpAmmPosition>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CreatorRewards {
    /// Unclaimed bonding-curve creator fees, in SOL.
    pub creator: f64,
    /// Unclaimed AMM position fees, in SOL.
    pub amm: f64,
    pub total: f64,
}

#[derive(Clone)]
pub struct RewardAggregator {
    bonding_curve: Option<Arc<dyn BondingCurveFees>>,
    amm: Option<Arc<dyn AmmFees>>,
}

impl std::fmt::Debug for RewardAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardAggregator")
            .field("bonding_curve", &self.bonding_curve.is_some())
            .field("amm", &self.amm.is_some())
            .finish()
    }
}

impl RewardAggregator {
    pub fn new(bonding_curve: Arc<dyn BondingCurveFees>, amm: Arc<dyn AmmFees>) -> Self {
        Self {
            bonding_curve: Some(bonding_curve),
            amm: Some(amm),
        }
    }

    /// Aggregator with no RPC endpoint configured; every query reports zero.
    pub fn unconfigured() -> Self {
        Self {
            bonding_curve: None,
            amm: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bonding_curve.is_some() && self.amm.is_some()
    }

    async fn try_creator_rewards(
        client: &dyn BondingCurveFees,
        pool_id: &str,
        token_id: Option<&str>,
    ) -> Result<f64> {
        match client.creator_quote_fee(pool_id).await {
            Ok(lamports) => Ok(lamports_to_sol(lamports)),
            Err(Error::AccountDiscriminatorMismatch(_)) => {
                if let Some(token_id) = token_id {
                    warn!(
                        "Pool {} is not a bonding-curve pool, looking it up by token {}",
                        pool_id, token_id
                    );
                    match client.pool_by_base_mint(token_id).await {
                        Ok(Some(pool)) => {
                            return Ok(lamports_to_sol(client.creator_quote_fee(&pool).await?));
                        }
                        Ok(None) => warn!("No bonding-curve pool found for token {}", token_id),
                        Err(e) => warn!("Could not find bonding-curve pool by token mint: {}", e),
                    }
                }
                info!("Pool {} is not using the dynamic bonding curve program", pool_id);
                Ok(0.0)
            }
            Err(e) => Err(e),
        }
    }

    /// Unclaimed creator fees on the bonding curve, in SOL.
    pub async fn fetch_creator_rewards(&self, pool_id: &str, token_id: Option<&str>) -> f64 {
        let Some(client) = self.bonding_curve.as_deref() else {
            error!("RPC URL not configured, creator rewards unavailable");
            return 0.0;
        };

        match Self::try_creator_rewards(client, pool_id, token_id).await {
            Ok(sol) => sol,
            Err(e) => {
                metrics::API_ERRORS.inc();
                error!("Failed to fetch creator rewards for {}: {}", pool_id, e);
                0.0
            }
        }
    }

    async fn try_amm_rewards(client: &dyn AmmFees, pool_id: &str, creator: &str) -> Result<f64> {
        let positions = client.user_positions_by_pool(pool_id, creator).await?;
        if positions.is_empty() {
            info!("No AMM positions found for {} in pool {}", creator, pool_id);
            return Ok(0.0);
        }

        let Some(pool_state) = client.pool_state(pool_id).await? else {
            warn!("Could not fetch AMM pool state for {}", pool_id);
            return Ok(0.0);
        };

        let mut total = 0.0;
        for position in &positions {
            let position_state = match client.position_state(position).await {
                Ok(Some(state)) => state,
                Ok(None) => {
                    warn!("Could not fetch position state for {}", position);
                    continue;
                }
                Err(e) => {
                    warn!("Error processing position {}: {}", position, e);
                    continue;
                }
            };

            let unclaimed = unclaimed_reward(&pool_state, &position_state);
            if unclaimed.fee_token_b > 0 {
                total += lamports_to_sol(unclaimed.fee_token_b);
            }
            if unclaimed.fee_token_a > 0 {
                let fee_a = lamports_to_sol(unclaimed.fee_token_a);
                // Token A is the launched token; only counted while it stays below the running quote total.
                if fee_a < total || total == 0.0 {
                    total += fee_a;
                }
            }
        }
        Ok(total)
    }

    /// Unclaimed fees on the creator's AMM positions after graduation, in SOL.
    pub async fn fetch_amm_creator_rewards(&self, pool_id: &str, creator: &str) -> f64 {
        let Some(client) = self.amm.as_deref() else {
            error!("RPC URL not configured, AMM rewards unavailable");
            return 0.0;
        };

        match Self::try_amm_rewards(client, pool_id, creator).await {
            Ok(sol) => sol,
            Err(e) if e.is_missing_account() => {
                info!("Pool {} is not an AMM pool or does not exist", pool_id);
                0.0
            }
            Err(e) => {
                metrics::API_ERRORS.inc();
                error!("Failed to fetch AMM creator rewards for {}: {}", pool_id, e);
                0.0
            }
        }
    }

    /// Queries both protocols concurrently and sums the results.
    pub async fn fetch_rewards(
        &self,
        pool_id: &str,
        token_id: Option<&str>,
        creator: &str,
    ) -> CreatorRewards {
        let (creator_fees, amm_fees) = tokio::join!(
            self.fetch_creator_rewards(pool_id, token_id),
            self.fetch_amm_creator_rewards(pool_id, creator),
        );
        CreatorRewards {
            creator: creator_fees,
            amm: amm_fees,
            total: creator_fees + amm_fees,
        }
    }
}
