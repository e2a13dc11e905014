// Solana RPC plumbing and the two protocol account readers
pub mod cp_amm;
pub mod dbc;
pub mod layout;

use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info, warn};
use serde_json::Value;
use solana_account_decoder::{UiAccountData, UiAccountEncoding};
use solana_client::nonblocking::rpc_client::RpcClient as SolanaRpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

use crate::error::{Error, Result};

pub use solana_sdk::pubkey::Pubkey;

pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address)
        .map_err(|e| Error::InvalidInput(format!("Invalid address '{}': {}", address, e)))
}

/// `getProgramAccounts` filter matching raw bytes at `offset`.
pub fn memcmp(offset: usize, bytes: &[u8]) -> RpcFilterType {
    RpcFilterType::Memcmp(Memcmp::new_raw_bytes(offset, bytes.to_vec()))
}

/// Token account held by an owner, reduced to mint and raw amount.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenHolding {
    pub mint: String,
    pub amount: u64,
}

/// Decodes a wallet-signed transaction as sent by the frontend.
pub fn decode_transaction(signed_base64: &str) -> Result<VersionedTransaction> {
    let bytes = STANDARD.decode(signed_base64)?;
    bincode::deserialize(&bytes)
        .map_err(|e| Error::InvalidInput(format!("Invalid transaction bytes: {}", e)))
}

/// Node client at `confirmed` commitment with the reads the protocol readers need.
pub struct RpcClient {
    inner: SolanaRpcClient,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").field("url", &self.inner.url()).finish()
    }
}

impl RpcClient {
    pub fn new(url: String) -> Self {
        Self {
            inner: SolanaRpcClient::new_with_timeout_and_commitment(
                url,
                REQUEST_TIMEOUT,
                CommitmentConfig::confirmed(),
            ),
        }
    }

    pub async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .inner
            .get_account_with_commitment(address, self.inner.commitment())
            .await?;
        Ok(response.value)
    }

    /// Like [`get_account`](Self::get_account) but a missing account is an error.
    pub async fn get_existing_account(&self, address: &Pubkey) -> Result<Account> {
        self.get_account(address)
            .await?
            .ok_or_else(|| Error::AccountNotFound(address.to_string()))
    }

    pub async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> Result<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.inner.commitment()),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };
        Ok(self
            .inner
            .get_program_accounts_with_config(program_id, config)
            .await?)
    }

    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<Vec<TokenHolding>> {
        let accounts = self
            .inner
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(*token_program))
            .await?;
        Ok(accounts
            .iter()
            .filter_map(|keyed| match &keyed.account.data {
                UiAccountData::Json(parsed) => parse_token_holding(&parsed.parsed),
                _ => None,
            })
            .collect())
    }

    /// Submits an already signed transaction and waits for `confirmed`
    /// commitment.
    pub async fn send_and_confirm(&self, signed_base64: &str, timeout: Duration) -> Result<Signature> {
        let transaction = decode_transaction(signed_base64)?;
        let config = RpcSendTransactionConfig {
            preflight_commitment: Some(self.inner.commitment().commitment),
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .inner
            .send_transaction_with_config(&transaction, config)
            .await?;
        info!("Submitted transaction {}", signature);

        let started = Instant::now();
        loop {
            let statuses = self.inner.get_signature_statuses(&[signature]).await?;
            if let Some(status) = statuses.value.into_iter().next().flatten() {
                if let Some(err) = status.err {
                    return Err(Error::TransactionFailed(format!("{}: {}", signature, err)));
                }
                if status.satisfies_commitment(self.inner.commitment()) {
                    info!("Transaction {} confirmed", signature);
                    return Ok(signature);
                }
                debug!("Transaction {} at {:?}", signature, status.confirmation_status);
            }
            if started.elapsed() >= timeout {
                warn!("Transaction {} not confirmed after {:?}", signature, timeout);
                return Err(Error::TransactionFailed(format!(
                    "{} was not confirmed within {}s",
                    signature,
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}

/// Forwards client-signed transactions to the cluster.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn send_and_confirm(&self, signed_base64: &str, timeout: Duration) -> Result<String>;
}

#[async_trait]
impl TransactionSubmitter for RpcClient {
    async fn send_and_confirm(&self, signed_base64: &str, timeout: Duration) -> Result<String> {
        RpcClient::send_and_confirm(self, signed_base64, timeout)
            .await
            .map(|signature| signature.to_string())
    }
}

/// Reads mint and raw amount from a `jsonParsed` token account.
fn parse_token_holding(parsed: &Value) -> Option<TokenHolding> {
    let info = parsed.get("info")?;
    let mint = info.get("mint")?.as_str()?.to_string();
    let amount = info.pointer("/tokenAmount/amount")?.as_str()?.parse().ok()?;
    Some(TokenHolding { mint, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_sdk::transaction::Transaction;

    #[test]
    fn test_parse_token_holding() {
        let parsed = json!({
            "type": "account",
            "info": {
                "mint": "NftMint",
                "owner": "Wallet",
                "tokenAmount": {"amount": "1", "decimals": 0}
            }
        });
        assert_eq!(
            parse_token_holding(&parsed),
            Some(TokenHolding { mint: "NftMint".to_string(), amount: 1 })
        );
        assert_eq!(parse_token_holding(&json!({"info": {"mint": "NftMint"}})), None);
        assert_eq!(parse_token_holding(&json!({})), None);
    }

    #[test]
    fn test_decode_transaction() {
        let transaction = VersionedTransaction::from(Transaction::new_with_payer(&[], None));
        let encoded = STANDARD.encode(bincode::serialize(&transaction).unwrap());
        assert_eq!(decode_transaction(&encoded).unwrap(), transaction);

        assert!(matches!(decode_transaction("not base64!"), Err(Error::ParseError(_))));
        assert!(matches!(
            decode_transaction(&STANDARD.encode([7u8, 1])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_pubkey() {
        assert_eq!(parse_pubkey("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb").unwrap(), TOKEN_2022_PROGRAM_ID);
        assert!(matches!(parse_pubkey("short"), Err(Error::InvalidInput(_))));
    }
}
