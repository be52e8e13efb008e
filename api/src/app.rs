use crate::config::Config;
use crate::routes::{
    analyze::{OpenRouterApi, VisionClassifying},
    geocode::{Nominatim, ReverseGeocoding},
    ipfs::{PinataApi, Pinning},
    users::{EnsData, EnsResolving},
};
use anyhow::{anyhow, Result};
use data_store::store::DataStore;
use eth::{
    rpc::{client::Client, ChainReading},
    types::Address,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// 0.001 ETH, used when neither config nor the contract provide a price.
const DEFAULT_MINT_PRICE_WEI: u128 = 1_000_000_000_000_000;
/// The mint price is split evenly between the creator and the charity
/// address the contract holds.
pub const CREATOR_SPLIT: u128 = 2;
/// Discover/search page size.
pub const LIST_LIMIT: i64 = 60;
/// Cap on indexed rows considered by chain-read fan-outs (owned view,
/// profile mint counts). Keeps the per-token RPC fan-out finite.
pub const CHAIN_SCAN_CAP: i64 = 200;

#[derive(Clone)]
pub struct AppData {
    pub store: Arc<Mutex<DataStore>>,
    pub chain: Arc<dyn ChainReading>,
    pub vision: Arc<dyn VisionClassifying>,
    pub pinner: Arc<dyn Pinning>,
    pub ens: Arc<dyn EnsResolving>,
    pub geocoder: Arc<dyn ReverseGeocoding>,
    pub contract: Option<Address>,
    pub mint_price_wei: u128,
}

impl AppData {
    pub async fn new(config: Config) -> Result<Self> {
        let chain: Arc<dyn ChainReading> = Arc::new(Client::new(
            &config.rpc_url,
            config.contract_address.unwrap_or_else(Address::zero),
            config.rpc_batch_delay_ms,
        )?);
        let mint_price_wei = match config.mint_price_wei {
            Some(price) => price,
            None if config.contract_address.is_some() => match chain.mint_price().await {
                Ok(price) => price.as_u128(),
                Err(err) => {
                    tracing::warn!("mintPrice read failed, using default: {err:?}");
                    DEFAULT_MINT_PRICE_WEI
                }
            },
            None => DEFAULT_MINT_PRICE_WEI,
        };
        Ok(Self {
            store: Arc::new(Mutex::new(DataStore::new(&config.database_url)?)),
            chain,
            vision: Arc::new(OpenRouterApi::new(
                &config.openrouter_api_key,
                &config.openrouter_model,
                &config.app_url,
            )),
            pinner: Arc::new(PinataApi::new(&config.pinata_jwt)),
            ens: Arc::new(EnsData {}),
            geocoder: Arc::new(Nominatim::new(
                config.nominatim_email.as_deref(),
                &config.app_url,
            )),
            contract: config.contract_address,
            mint_price_wei,
        })
    }

    pub fn store(&self) -> Result<MutexGuard<'_, DataStore>> {
        self.store.lock().map_err(|_| anyhow!("store mutex poisoned"))
    }
}
