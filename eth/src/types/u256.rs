use ethrpc::types::U256 as Uint256;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::{num::ParseIntError, str::FromStr};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256(pub Uint256);

impl Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct U256Visitor;

        impl<'de> de::Visitor<'de> for U256Visitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string representing U256")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map(U256)
                    .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_str(U256Visitor)
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        U256(Uint256::from(value))
    }
}

impl U256 {
    pub fn from_dec_str(value: &str) -> Result<Self, ParseIntError> {
        match Uint256::from_str(value) {
            Ok(res) => Ok(U256(res)),
            Err(err) => Err(err),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Uint256::from(0u64)
    }

    /// Saturating narrowing; balances and supplies in this system are tiny,
    /// anything beyond u128 is clamped.
    pub fn as_u128(&self) -> u128 {
        if self.0 > Uint256::from(u128::MAX) {
            u128::MAX
        } else {
            self.0.as_u128()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_serialization() {
        let number = U256::from(42);
        let string = serde_json::to_string(&number).expect("Failed to serialize to JSON");
        assert_eq!(string, "\"42\"");
        let deserialized_number: U256 =
            serde_json::from_str(&string).expect("Failed to deserialize from JSON");
        assert_eq!(number, deserialized_number);
    }

    #[test]
    fn narrowing() {
        assert_eq!(U256::from(0).as_u128(), 0);
        assert!(U256::from(0).is_zero());
        assert_eq!(U256::from(u64::MAX).as_u128(), u64::MAX as u128);
        assert_eq!(U256(Uint256::MAX).as_u128(), u128::MAX);
    }
}
