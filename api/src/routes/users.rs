use crate::{
    app::{AppData, CHAIN_SCAN_CAP, CREATOR_SPLIT},
    routes::{likes::caller_address, ErrorBody},
};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use anyhow::Result;
use eth::types::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{str::FromStr, sync::LazyLock};
use utoipa::ToSchema;

const ENSDATA_URL: &str = "https://ensdata.net";

/// Forward ENS lookup for an address. Resolution failures are treated as
/// "no name": the profile still renders.
#[async_trait::async_trait]
pub trait EnsResolving: Send + Sync {
    async fn resolve(&self, address: &Address) -> Option<String>;
}

pub struct EnsData {}

#[async_trait::async_trait]
impl EnsResolving for EnsData {
    async fn resolve(&self, address: &Address) -> Option<String> {
        let response = reqwest::get(format!("{ENSDATA_URL}/{address}")).await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.json::<Value>().await.ok()?;
        ["primary", "ens"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub discovered: i64,
    pub minted: u64,
    /// Wei, as a decimal string. Large enough to overflow JSON numbers.
    pub earned_wei: String,
    pub likes: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    pub address: String,
    pub username: Option<String>,
    pub ens: Option<String>,
    pub stats: ProfileStats,
}

#[utoipa::path(
    responses(
        (status = 200, description = "Profile with discovery and earning stats.", body = Profile),
        (status = 400, description = "Malformed address."),
        (status = 500, description = "Store failure.", body = ErrorBody),
    )
)]
#[get("/users/{address}")]
pub async fn profile(data: web::Data<AppData>, path: web::Path<String>) -> impl Responder {
    let address = match Address::from_str(&path) {
        Ok(address) => address,
        Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
    };
    match build_profile(&data, &address).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(err) => {
            tracing::error!("profile build failed for {address}: {err:?}");
            HttpResponse::InternalServerError().json(ErrorBody::new("Failed"))
        }
    }
}

async fn build_profile(data: &AppData, address: &Address) -> Result<Profile> {
    let user = data.store()?.load_user(*address)?;
    let (username, cached_ens) = match user {
        Some(user) => (user.username, user.ens),
        None => (None, None),
    };
    let ens = match cached_ens {
        Some(ens) => Some(ens),
        None => {
            let resolved = data.ens.resolve(address).await;
            if let Some(name) = &resolved {
                data.store()?.cache_ens(*address, name)?;
            }
            resolved
        }
    };

    let (discovered, token_ids, likes) = {
        let mut store = data.store()?;
        let discovered = store.cats_by_creator_count(*address)?;
        let token_ids = store.token_ids_by_creator(*address, CHAIN_SCAN_CAP)?;
        let likes = store.likes_for_tokens(&token_ids)?;
        (discovered, token_ids, likes)
    };

    // Copies held by others = total supply minus the creator's own mints.
    let supplies = data.chain.total_supplies(&token_ids).await;
    let minted: u128 = supplies
        .values()
        .fold(0u128, |sum, supply| sum.saturating_add(supply.as_u128()));
    let earned = minted
        .saturating_sub(discovered as u128)
        .saturating_mul(data.mint_price_wei)
        / CREATOR_SPLIT;

    Ok(Profile {
        address: address.to_string(),
        username,
        ens,
        stats: ProfileStats {
            discovered,
            minted: minted.min(u64::MAX as u128) as u64,
            earned_wei: earned.to_string(),
            likes,
        },
    })
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UsernameRequest {
    pub username: Option<String>,
}

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{2,32}$").expect("static pattern"));

/// Short handles, or the caller's own ENS name verbatim.
fn valid_username(name: &str, ens: Option<&str>) -> bool {
    if HANDLE_RE.is_match(name) {
        return true;
    }
    name.contains('.')
        && ens
            .map(|ens| ens.eq_ignore_ascii_case(name))
            .unwrap_or(false)
}

#[utoipa::path(
    request_body = UsernameRequest,
    responses(
        (status = 200, description = "Username stored."),
        (status = 400, description = "Missing or invalid username.", body = ErrorBody),
        (status = 401, description = "Caller header does not match the path address.", body = ErrorBody),
        (status = 500, description = "Store failure."),
    )
)]
#[post("/users/{address}")]
pub async fn set_username(
    request: HttpRequest,
    data: web::Data<AppData>,
    path: web::Path<String>,
    body: web::Json<UsernameRequest>,
) -> impl Responder {
    let address = match Address::from_str(&path) {
        Ok(address) => address,
        Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
    };
    if caller_address(&request) != Some(address) {
        return HttpResponse::Unauthorized().json(ErrorBody::new("unauthorized"));
    }
    let username = body
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let Some(username) = username else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing username"));
    };

    // Dotted names must match the caller's resolved ENS; look it up if the
    // store has nothing cached.
    let stored_ens = data
        .store()
        .ok()
        .and_then(|mut store| store.load_user(address).ok().flatten())
        .and_then(|user| user.ens);
    let ens = match stored_ens {
        Some(ens) => Some(ens),
        None => data.ens.resolve(&address).await,
    };
    if !valid_username(username, ens.as_deref()) {
        return HttpResponse::BadRequest().json(ErrorBody::new("invalid_username"));
    }

    match data
        .store()
        .and_then(|mut store| store.set_username(address, username, ens.as_deref()))
    {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "ok": true })),
        Err(err) => {
            tracing::error!("username update failed for {address}: {err:?}");
            HttpResponse::InternalServerError().json(serde_json::json!({ "ok": false }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_handles_pass() {
        assert!(valid_username("whisker_fan", None));
        assert!(valid_username("ab", None));
        assert!(valid_username("A-1", None));
    }

    #[test]
    fn length_and_charset_are_enforced() {
        assert!(!valid_username("x", None));
        assert!(!valid_username(&"a".repeat(33), None));
        assert!(!valid_username("has space", None));
        assert!(!valid_username("emoji😺", None));
    }

    #[test]
    fn dotted_names_require_matching_ens() {
        assert!(valid_username("Vitalik.ETH", Some("vitalik.eth")));
        assert!(!valid_username("vitalik.eth", Some("someone-else.eth")));
        assert!(!valid_username("vitalik.eth", None));
    }
}
