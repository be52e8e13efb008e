use anyhow::{anyhow, Context, Result};
use eth::types::Address;
use std::str::FromStr;

pub struct Config {
    pub database_url: String,
    pub rpc_url: String,
    /// Catlas ERC-1155 contract. When unset, chain-backed views degrade to
    /// empty results instead of failing.
    pub contract_address: Option<Address>,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub pinata_jwt: String,
    pub nominatim_email: Option<String>,
    /// Overrides the contract's mintPrice() when set.
    pub mint_price_wei: Option<u128>,
    pub app_url: String,
    pub bind_address: String,
    pub rpc_batch_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let contract_address = match std::env::var("CONTRACT_ADDRESS") {
            Ok(value) => Some(
                Address::from_str(&value).map_err(|err| anyhow!("bad CONTRACT_ADDRESS: {err}"))?,
            ),
            Err(_) => None,
        };
        let mint_price_wei = match std::env::var("MINT_PRICE_WEI") {
            Ok(value) => Some(value.parse().context("bad MINT_PRICE_WEI")?),
            Err(_) => None,
        };
        let rpc_batch_delay_ms = match std::env::var("RPC_BATCH_DELAY_MS") {
            Ok(value) => value.parse().context("bad RPC_BATCH_DELAY_MS")?,
            Err(_) => 20,
        };
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("missing DATABASE_URL")?,
            rpc_url: std::env::var("RPC_URL")
                .unwrap_or_else(|_| "https://mainnet.base.org".into()),
            contract_address,
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY")
                .context("missing OPENROUTER_API_KEY")?,
            openrouter_model: std::env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "google/gemini-2.5-flash".into()),
            pinata_jwt: std::env::var("PINATA_JWT").context("missing PINATA_JWT")?,
            nominatim_email: std::env::var("NOMINATIM_EMAIL").ok(),
            mint_price_wei,
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            rpc_batch_delay_ms,
        })
    }
}
