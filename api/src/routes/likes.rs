use crate::{app::AppData, routes::ErrorBody};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use eth::types::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Caller identity travels in this header. It is client-asserted; likes
/// carry no signature check.
pub const USER_ADDRESS_HEADER: &str = "x-user-address";

pub fn caller_address(request: &HttpRequest) -> Option<Address> {
    request
        .headers()
        .get(USER_ADDRESS_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| Address::from_str(raw).ok())
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub token_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResponse {
    pub liked: bool,
}

#[utoipa::path(
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Like toggled; liked reflects the new state.", body = ToggleResponse),
        (status = 400, description = "Missing caller header or tokenId.", body = ErrorBody),
        (status = 500, description = "Store failure.", body = ErrorBody),
    )
)]
#[post("/likes")]
pub async fn toggle_like(
    request: HttpRequest,
    data: web::Data<AppData>,
    body: web::Json<ToggleRequest>,
) -> impl Responder {
    let (Some(address), Some(token_id)) = (caller_address(&request), body.token_id) else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing address or tokenId"));
    };
    match data
        .store()
        .and_then(|mut store| store.toggle_like(token_id, address))
    {
        Ok(liked) => HttpResponse::Ok().json(ToggleResponse { liked }),
        Err(err) => {
            tracing::error!("like toggle failed for token {token_id}: {err:?}");
            HttpResponse::InternalServerError().json(ErrorBody::new("Failed"))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesQuery {
    pub token_id: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct LikesSummary {
    pub total: i64,
    pub liked: bool,
}

#[utoipa::path(
    responses(
        (status = 200, description = "Like count, and whether the given address liked it. Degrades to zeroes.", body = LikesSummary),
    )
)]
#[get("/likes")]
pub async fn likes(data: web::Data<AppData>, query: web::Query<LikesQuery>) -> impl Responder {
    let Some(token_id) = query
        .token_id
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
    else {
        return HttpResponse::Ok().json(LikesSummary::default());
    };
    let address = query
        .address
        .as_deref()
        .and_then(|raw| Address::from_str(raw).ok());

    let summary = (|| -> anyhow::Result<LikesSummary> {
        let mut store = data.store()?;
        let total = store.like_count(token_id)?;
        let liked = match address {
            Some(address) => store.is_liked(token_id, address)?,
            None => false,
        };
        Ok(LikesSummary { total, liked })
    })();
    match summary {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => {
            tracing::warn!("like lookup failed for token {token_id}: {err:?}");
            HttpResponse::Ok().json(LikesSummary::default())
        }
    }
}
