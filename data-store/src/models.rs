use crate::schema::*;
use chrono::{NaiveDateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};
use eth::types::Address;
use serde::Serialize;
use serde_json::Value;

/// Off-chain shadow of a published token. Written by the index upsert right
/// after a successful mint, read by the discover/search views. The on-chain
/// token stays authoritative; this row only makes it discoverable without
/// scanning logs.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = cats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Cat {
    pub token_id: i64,
    #[diesel(serialize_as = String)]
    pub creator: Address,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Mirror of the token's off-chain metadata document, image pointer
    /// included.
    pub metadata: Value,
    pub cid: String,
    pub created_at: NaiveDateTime,
}

impl Cat {
    pub fn new(token_id: i64, creator: Address, cid: &str) -> Self {
        Self {
            token_id,
            creator,
            name: None,
            city: None,
            country: None,
            latitude: None,
            longitude: None,
            metadata: serde_json::json!({}),
            cid: cid.to_owned(),
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn image(&self) -> Option<String> {
        self.metadata
            .get("image")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub token_id: i64,
    #[diesel(serialize_as = String)]
    pub user_address: Address,
    pub created_at: NaiveDateTime,
}

impl Like {
    pub fn new(token_id: i64, user_address: Address) -> Self {
        Self {
            token_id,
            user_address,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Upserted lazily: first profile view caches the resolved ENS name,
/// username edits fill the rest.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    #[diesel(serialize_as = String)]
    pub address: Address,
    pub username: Option<String>,
    pub ens: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_image_from_metadata() {
        let mut cat = Cat::new(1, Address::from(1), "QmTest");
        assert_eq!(cat.image(), None);

        cat.metadata = serde_json::json!({
            "name": "Banana Philosopher",
            "image": "ipfs://QmImage",
        });
        assert_eq!(cat.image(), Some("ipfs://QmImage".to_string()));

        // Non-string image pointers are ignored.
        cat.metadata = serde_json::json!({ "image": 42 });
        assert_eq!(cat.image(), None);
    }
}
