pub mod openrouter;
pub mod prompt;

pub use openrouter::{OpenRouterApi, VisionClassifying};
pub use prompt::CatAnalysis;

use crate::{app::AppData, routes::ErrorBody};
use actix_web::{http::header, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Gps {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CropHint {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Data URL or raw base64 (no header).
    pub image_base64: String,
    /// Capture hints; accepted for parity with the upload wizard but not
    /// forwarded to the model.
    pub gps: Option<Gps>,
    pub crop: Option<CropHint>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub result: CatAnalysis,
}

#[utoipa::path(
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Classification result; failures degrade to isCat=false.", body = AnalyzeResponse),
        (status = 400, description = "Missing image payload.", body = ErrorBody),
    )
)]
#[post("/analyze")]
pub async fn analyze(
    data: web::Data<AppData>,
    body: web::Json<AnalyzeRequest>,
) -> impl Responder {
    if body.image_base64.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing imageBase64"));
    }
    let result = match data.vision.classify(&body.image_base64).await {
        Ok(analysis) => analysis,
        // The caller never sees a hard failure here, only a negative
        // classification.
        Err(err) => {
            tracing::warn!("vision gateway failed: {err:?}");
            CatAnalysis::not_a_cat("Analysis unavailable")
        }
    };
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(AnalyzeResponse { result })
}
