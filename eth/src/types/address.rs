use diesel::{
    self,
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    serialize::{IsNull, Output, ToSql},
    sql_types::Text,
    Queryable,
};
use ethrpc::types::Address as H160;
use serde::{de, Deserialize, Deserializer, Serialize};
use solabi::ethprim::ParseAddressError;
use std::{
    fmt::{Debug, Display},
    io::Write,
    str::FromStr,
};

/// An address. Can be an EOA or a smart contract address.
///
/// Rendered, serialized and persisted as a lowercase `0x`-prefixed hex
/// string, which is how the store keys creators and likers.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub H160);

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Address")
            .field(&format_args!("0x{:x}", self.0))
            .finish()
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Address::from_str(&value)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&value), &"a hex address"))
    }
}

/// Postgres keeps addresses as lowercase TEXT (there is no fixed-length
/// hex type), so the diesel round trip goes through strings.
impl FromSql<Text, Pg> for Address {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(Address::from_str(&value)?)
    }
}

impl ToSql<Text, Pg> for Address {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> diesel::serialize::Result {
        out.write_all(self.to_string().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl Queryable<Text, Pg> for Address {
    type Row = String;

    fn build(row: Self::Row) -> deserialize::Result<Self> {
        Ok(Address::from_str(&row)?)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl Address {
    pub fn zero() -> Self {
        Self(H160([0; 20]))
    }
}

impl From<H160> for Address {
    fn from(value: H160) -> Self {
        Self(value)
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    /// Case-insensitive: the input is lowercased before parsing so that
    /// checksummed client input and stored lowercase text both round-trip.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match H160::from_str(&s.to_lowercase()) {
            Ok(res) => Ok(Address(res)),
            Err(err) => Err(err),
        }
    }
}

/// This is a lazy constructor only for testing.
impl From<u64> for Address {
    fn from(value: u64) -> Self {
        let mut new_array: [u8; 20] = [0; 20];
        new_array[12..].copy_from_slice(&value.to_be_bytes());
        Self(H160(new_array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_round_trip() {
        let checksummed = "0x92BE2F02C94D214F8D38ECE700385471D9A66C0A";
        let address = Address::from_str(checksummed).unwrap();
        assert_eq!(
            address.to_string(),
            "0x92be2f02c94d214f8d38ece700385471d9a66c0a"
        );
        assert_eq!(Address::from_str(&address.to_string()).unwrap(), address);
    }

    #[test]
    fn serde_string_form() {
        let address = Address::from(7);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"0x0000000000000000000000000000000000000007\"");
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Address::from_str("not-an-address").is_err());
        assert!(Address::from_str("0x1234").is_err());
    }
}
