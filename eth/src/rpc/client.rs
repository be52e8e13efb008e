use super::ChainReading;
use crate::types::{Address, U256};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethrpc::{
    eth,
    http::{buffered::Configuration, reqwest::Url, Error as EthRpcError},
    types::{Address as H160, BlockId, TransactionCall, U256 as Uint256},
};
use futures::future::join_all;
use solabi::{decode::Decode, encode::Encode, selector, FunctionEncoder};
use std::{collections::HashMap, time::Duration};

const BALANCE_OF: FunctionEncoder<(H160, Uint256), (Uint256,)> =
    FunctionEncoder::new(selector!("balanceOf(address,uint256)"));
const TOTAL_SUPPLY: FunctionEncoder<(Uint256,), (Uint256,)> =
    FunctionEncoder::new(selector!("totalSupply(uint256)"));
const MINT_PRICE: FunctionEncoder<(), (Uint256,)> =
    FunctionEncoder::new(selector!("mintPrice()"));

pub struct Client {
    provider: ethrpc::http::Buffered,
    contract: Address,
}

fn handle_error(error: EthRpcError, context: &str) {
    match error {
        EthRpcError::Rpc(err) => {
            let known_rpc_errors = [
                // Contract does not have attempted functionality
                // or function exists and some assertion failed.
                "execution reverted",
                // Contract method is unable to respond to the given input.
                "out of gas",
            ];
            if !known_rpc_errors.iter().any(|e| err.message.contains(e)) {
                tracing::warn!("request failed: {context} with {err:?}");
            }
        }
        other => {
            tracing::warn!("rpc transport failure: {context} with {other:?}");
        }
    }
}

#[async_trait]
impl ChainReading for Client {
    async fn balances(&self, owner: Address, token_ids: &[i64]) -> HashMap<i64, U256> {
        tracing::debug!("preparing {} balanceOf requests", token_ids.len());
        let futures = token_ids.iter().map(|&id| {
            self.provider
                .call(eth::Call, (self.balance_call(owner, id), BlockId::default()))
        });
        // join_all preserves the input order of its futures.
        let results = join_all(futures).await;
        token_ids
            .iter()
            .zip(results)
            .filter_map(|(&id, result)| match result {
                Ok(bytes) => Self::decode_uint(bytes, BALANCE_OF).map(|value| (id, value)),
                Err(err) => {
                    handle_error(err, &format!("balanceOf for token {id}"));
                    None
                }
            })
            .collect()
    }

    async fn total_supplies(&self, token_ids: &[i64]) -> HashMap<i64, U256> {
        tracing::debug!("preparing {} totalSupply requests", token_ids.len());
        let futures = token_ids.iter().map(|&id| {
            self.provider
                .call(eth::Call, (self.supply_call(id), BlockId::default()))
        });
        let results = join_all(futures).await;
        token_ids
            .iter()
            .zip(results)
            .filter_map(|(&id, result)| match result {
                Ok(bytes) => Self::decode_uint(bytes, TOTAL_SUPPLY).map(|value| (id, value)),
                Err(err) => {
                    handle_error(err, &format!("totalSupply for token {id}"));
                    None
                }
            })
            .collect()
    }

    async fn mint_price(&self) -> Result<U256> {
        let call = TransactionCall {
            to: Some(self.contract.0),
            input: Some(MINT_PRICE.encode_params(&())),
            ..Default::default()
        };
        let bytes = self
            .provider
            .call(eth::Call, (call, BlockId::default()))
            .await
            .map_err(|err| anyhow!("mintPrice call failed: {err:?}"))?;
        let (price,) = MINT_PRICE
            .decode_returns(&bytes)
            .context("decode mintPrice return")?;
        Ok(U256(price))
    }
}

impl Client {
    pub fn new(url: &str, contract: Address, batch_delay: u64) -> Result<Self> {
        Ok(Self {
            provider: ethrpc::http::Client::new(Url::parse(url).context("invalid rpc url")?)
                .buffered(Configuration {
                    delay: Duration::from_millis(batch_delay),
                    max_size: 20,
                    ..Default::default()
                }),
            contract,
        })
    }

    fn balance_call(&self, owner: Address, token_id: i64) -> TransactionCall {
        TransactionCall {
            to: Some(self.contract.0),
            input: Some(BALANCE_OF.encode_params(&(owner.0, Uint256::from(token_id as u64)))),
            ..Default::default()
        }
    }

    fn supply_call(&self, token_id: i64) -> TransactionCall {
        TransactionCall {
            to: Some(self.contract.0),
            input: Some(TOTAL_SUPPLY.encode_params(&(Uint256::from(token_id as u64),))),
            ..Default::default()
        }
    }

    fn decode_uint<T>(res: Vec<u8>, encoder: FunctionEncoder<T, (Uint256,)>) -> Option<U256>
    where
        T: Encode + Decode,
    {
        match encoder.decode_returns(&res) {
            Ok(decoded) => Some(U256(decoded.0)),
            Err(err) => {
                if !res.is_empty() {
                    // Only log if result is non-empty
                    tracing::warn!("failed to decode bytes {:?} with {}", res, err);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn test_client() -> Client {
        Client::new(
            "https://mainnet.base.org",
            Address::from_str("0x92be2f02c94d214f8d38ece700385471d9a66c0a").unwrap(),
            0,
        )
        .expect("Needed for test")
    }

    #[tokio::test]
    async fn call_selectors() {
        let client = test_client();
        let balance = client.balance_call(Address::from(1), 7);
        assert_eq!(&balance.input.unwrap()[..4], [0x00, 0xfd, 0xd5, 0x8e]);

        let supply = client.supply_call(7);
        assert_eq!(&supply.input.unwrap()[..4], [0xbd, 0x85, 0xb0, 0x39]);

        assert_eq!(&MINT_PRICE.encode_params(&())[..4], [0x68, 0x17, 0xc7, 0x6c]);
    }

    #[test]
    fn decode_uint_results() {
        let encoded = TOTAL_SUPPLY.encode_returns(&(Uint256::from(5u64),));
        assert_eq!(
            Client::decode_uint(encoded, TOTAL_SUPPLY),
            Some(U256::from(5))
        );
        // Empty response bytes (e.g. call to a non-contract) decode to None.
        assert_eq!(Client::decode_uint(vec![], TOTAL_SUPPLY), None);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    #[ignore = "requires network access to a Base RPC endpoint"]
    async fn balances_against_live_node() {
        let client = test_client();
        let balances = client.balances(Address::from(1), &[1, 2, 3]).await;
        // An EOA that never minted holds nothing; reads may also revert and
        // be dropped from the map entirely.
        assert!(balances.values().all(U256::is_zero));
    }
}
