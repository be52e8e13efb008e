use crate::{
    app::{AppData, CHAIN_SCAN_CAP, LIST_LIMIT},
    routes::ErrorBody,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use anyhow::Result;
use data_store::{
    models::Cat,
    store::{CatFilter, SortKey},
};
use eth::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{cmp::Reverse, collections::HashMap, str::FromStr};
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
pub struct CatsQuery {
    pub creator: Option<String>,
    pub owner: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatItem {
    pub token_id: i64,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl From<&Cat> for CatItem {
    fn from(cat: &Cat) -> Self {
        Self {
            token_id: cat.token_id,
            name: cat.name.clone(),
            image: cat.image(),
            city: cat.city.clone(),
            country: cat.country.clone(),
            latitude: cat.latitude,
            longitude: cat.longitude,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatList {
    pub items: Vec<CatItem>,
}

/// Stable sort, so equally-liked tokens keep their newest-first order.
fn sort_by_likes(items: &mut [CatItem], counts: &HashMap<i64, i64>) {
    items.sort_by_key(|item| Reverse(counts.get(&item.token_id).copied().unwrap_or(0)));
}

#[utoipa::path(
    responses(
        (status = 200, description = "Indexed cats, filtered and sorted.", body = CatList),
        (status = 400, description = "Invalid creator or owner address."),
        (status = 500, description = "Store failure; items degrade to empty."),
    )
)]
#[get("/cats")]
pub async fn cats(data: web::Data<AppData>, query: web::Query<CatsQuery>) -> impl Responder {
    // Collected view: list indexed cats and probe on-chain balances.
    if let Some(raw) = &query.owner {
        let owner = match Address::from_str(raw) {
            Ok(address) => address,
            Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
        };
        return owned_by(&data, owner).await;
    }

    let creator = match &query.creator {
        Some(raw) => match Address::from_str(raw) {
            Ok(address) => Some(address),
            Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
        },
        None => None,
    };
    let filter = CatFilter {
        creator,
        query: query.q.clone().filter(|q| !q.trim().is_empty()),
        sort: SortKey::parse(query.sort.as_deref().unwrap_or("newest")),
        limit: LIST_LIMIT,
    };
    match list_cats(&data, &filter) {
        Ok(items) => HttpResponse::Ok().json(CatList { items }),
        Err(err) => {
            tracing::error!("cats list failed: {err:?}");
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "items": [], "error": "failed" }))
        }
    }
}

fn list_cats(data: &AppData, filter: &CatFilter) -> Result<Vec<CatItem>> {
    let rows = data.store()?.list_cats(filter)?;
    let mut items: Vec<CatItem> = rows.iter().map(CatItem::from).collect();
    if filter.sort == SortKey::MostLiked && !items.is_empty() {
        let ids: Vec<i64> = items.iter().map(|item| item.token_id).collect();
        let counts = data.store()?.like_counts(&ids)?;
        sort_by_likes(&mut items, &counts);
    }
    Ok(items)
}

async fn owned_by(data: &AppData, owner: Address) -> HttpResponse {
    if data.contract.is_none() {
        return HttpResponse::Ok().json(CatList { items: vec![] });
    }
    let filter = CatFilter {
        limit: CHAIN_SCAN_CAP,
        ..Default::default()
    };
    let rows = match data.store().and_then(|mut store| store.list_cats(&filter)) {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!("owned-by listing failed: {err:?}");
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "items": [], "error": "failed" }));
        }
    };
    let ids: Vec<i64> = rows.iter().map(|cat| cat.token_id).collect();
    // Tokens whose balance read failed are simply not shown.
    let balances = data.chain.balances(owner, &ids).await;
    let items = rows
        .iter()
        .filter(|cat| {
            balances
                .get(&cat.token_id)
                .map(|balance| !balance.is_zero())
                .unwrap_or(false)
        })
        .map(CatItem::from)
        .collect();
    HttpResponse::Ok().json(CatList { items })
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexCatRequest {
    pub token_id: Option<i64>,
    pub creator: Option<String>,
    pub cid: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
}

#[utoipa::path(
    request_body = IndexCatRequest,
    responses(
        (status = 200, description = "Row upserted."),
        (status = 400, description = "Missing required field.", body = ErrorBody),
        (status = 500, description = "Store failure.", body = ErrorBody),
    )
)]
#[post("/cats/index")]
pub async fn index_cat(
    data: web::Data<AppData>,
    body: web::Json<IndexCatRequest>,
) -> impl Responder {
    let Some(token_id) = body.token_id else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing tokenId"));
    };
    let Some(creator_raw) = &body.creator else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing creator"));
    };
    let Some(cid) = &body.cid else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing cid"));
    };
    let creator = match Address::from_str(creator_raw) {
        Ok(address) => address,
        Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
    };

    let mut cat = Cat::new(token_id, creator, cid);
    cat.name = body.name.clone();
    cat.city = body.city.clone();
    cat.country = body.country.clone();
    cat.latitude = body.latitude;
    cat.longitude = body.longitude;
    if let Some(metadata) = &body.metadata {
        cat.metadata = metadata.clone();
    }

    match data.store().and_then(|mut store| store.upsert_cat(&cat)) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "ok": true })),
        Err(err) => {
            tracing::error!("index upsert failed for token {token_id}: {err:?}");
            HttpResponse::InternalServerError().json(ErrorBody::new("Failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    fn item(token_id: i64) -> CatItem {
        CatItem {
            token_id,
            name: None,
            image: None,
            city: None,
            country: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn most_liked_orders_by_count() {
        // Newest-first input: token 3, then 2, then 1.
        let mut items = vec![item(3), item(2), item(1)];
        let counts = hashmap! { 1 => 5, 2 => 2 };
        sort_by_likes(&mut items, &counts);
        let ids: Vec<i64> = items.iter().map(|i| i.token_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn most_liked_ties_keep_newest_first() {
        let mut items = vec![item(3), item(2), item(1)];
        let counts = hashmap! { 1 => 2, 2 => 2, 3 => 0 };
        sort_by_likes(&mut items, &counts);
        let ids: Vec<i64> = items.iter().map(|i| i.token_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn items_omit_absent_optionals() {
        let rendered = serde_json::to_value(item(1)).unwrap();
        assert!(rendered.get("image").is_none());
        assert!(rendered.get("latitude").is_none());
        // Nullable display fields stay present as nulls.
        assert!(rendered.get("name").is_some());
    }
}
