pub mod client;

use crate::types::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Read-only view of the Catlas ERC-1155 contract.
///
/// The per-token methods return maps keyed by token id; a missing entry
/// means the read failed (reverted, timed out, ...) and callers treat it
/// as a zero value rather than an error.
#[async_trait]
pub trait ChainReading: Send + Sync {
    async fn balances(&self, owner: Address, token_ids: &[i64]) -> HashMap<i64, U256>;

    async fn total_supplies(&self, token_ids: &[i64]) -> HashMap<i64, U256>;

    async fn mint_price(&self) -> Result<U256>;
}
