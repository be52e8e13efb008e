use crate::{app::AppData, routes::ErrorBody};
use actix_web::{get, web, HttpResponse, Responder};
use anyhow::{Context, Result};
use reqwest::{
    header::{REFERER, USER_AGENT},
    Url,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Most-specific-first locality candidates in a Nominatim address block.
const LOCALITY_KEYS: [&str; 9] = [
    "city",
    "town",
    "village",
    "hamlet",
    "municipality",
    "city_district",
    "suburb",
    "county",
    "state_district",
];

/// Reverse geocoding gateway. `Ok(None)` means the upstream answered with
/// a non-success status.
#[async_trait::async_trait]
pub trait ReverseGeocoding: Send + Sync {
    async fn reverse(&self, lat: &str, lon: &str) -> Result<Option<Value>>;
}

pub struct Nominatim {
    email: Option<String>,
    referer: String,
}

impl Nominatim {
    pub fn new(email: Option<&str>, referer: &str) -> Self {
        Self {
            email: email.map(str::to_owned),
            referer: referer.to_owned(),
        }
    }
}

#[async_trait::async_trait]
impl ReverseGeocoding for Nominatim {
    async fn reverse(&self, lat: &str, lon: &str) -> Result<Option<Value>> {
        let mut url = Url::parse(NOMINATIM_URL).context("nominatim url")?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", lat)
            .append_pair("lon", lon)
            .append_pair("zoom", "14")
            .append_pair("addressdetails", "1")
            .append_pair("accept-language", "en");
        if let Some(email) = &self.email {
            url.query_pairs_mut().append_pair("email", email);
        }
        // Nominatim's usage policy wants an identifying agent.
        let response = reqwest::Client::new()
            .get(url)
            .header(USER_AGENT, format!("Catlas/1.0 ({})", self.referer))
            .header(REFERER, &self.referer)
            .send()
            .await
            .context("nominatim request")?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = response.json().await.context("nominatim body")?;
        Ok(Some(body))
    }
}

/// Walks the candidate keys from most to least specific and returns the
/// first one present.
fn pick_locality(address: Option<&Value>) -> Option<String> {
    let address = address?;
    LOCALITY_KEYS
        .iter()
        .find_map(|key| address.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    /// Alias some clients send instead of `lon`.
    pub lng: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Locality {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[utoipa::path(
    responses(
        (status = 200, description = "Nearest locality and country for the coordinates.", body = Locality),
        (status = 400, description = "Missing coordinates.", body = ErrorBody),
        (status = 502, description = "Upstream geocoder refused the request.", body = ErrorBody),
        (status = 500, description = "Gateway failure.", body = ErrorBody),
    )
)]
#[get("/geocode/reverse")]
pub async fn reverse_geocode(
    data: web::Data<AppData>,
    query: web::Query<GeocodeQuery>,
) -> impl Responder {
    let lon = query.lon.as_deref().or(query.lng.as_deref());
    let (Some(lat), Some(lon)) = (query.lat.as_deref(), lon) else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing lat/lon"));
    };
    match data.geocoder.reverse(lat, lon).await {
        Ok(Some(body)) => {
            let address = body.get("address");
            let locality = Locality {
                city: pick_locality(address),
                country: address
                    .and_then(|a| a.get("country"))
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            };
            HttpResponse::Ok().json(locality)
        }
        Ok(None) => HttpResponse::BadGateway().json(ErrorBody::new("Reverse geocode failed")),
        Err(err) => {
            tracing::error!("reverse geocode failed: {err:?}");
            HttpResponse::InternalServerError().json(ErrorBody::new("Internal error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locality_prefers_city_over_county() {
        let address = json!({ "county": "Kreis Pinneberg", "city": "Hamburg" });
        assert_eq!(pick_locality(Some(&address)).as_deref(), Some("Hamburg"));
    }

    #[test]
    fn locality_falls_back_down_the_chain() {
        let address = json!({ "state_district": "Upper Bavaria", "suburb": "Schwabing" });
        assert_eq!(pick_locality(Some(&address)).as_deref(), Some("Schwabing"));
        assert_eq!(
            pick_locality(Some(&json!({ "state_district": "Upper Bavaria" }))).as_deref(),
            Some("Upper Bavaria")
        );
    }

    #[test]
    fn no_address_block_means_no_locality() {
        assert_eq!(pick_locality(None), None);
        assert_eq!(pick_locality(Some(&json!({ "country": "Japan" }))), None);
    }
}
