use crate::{app::AppData, routes::ErrorBody};
use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse, Responder};
use anyhow::{anyhow, Context, Result};
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

const PINATA_UPLOAD_URL: &str = "https://uploads.pinata.cloud/v3/files";

/// Content-addressed file pinning. Returns the CID of the pinned bytes.
#[async_trait::async_trait]
pub trait Pinning: Send + Sync {
    async fn pin_file(&self, name: &str, mime: &str, bytes: Vec<u8>) -> Result<String>;
}

pub struct PinataApi {
    jwt: String,
}

impl PinataApi {
    pub fn new(jwt: &str) -> Self {
        Self {
            jwt: jwt.to_owned(),
        }
    }
}

#[async_trait::async_trait]
impl Pinning for PinataApi {
    async fn pin_file(&self, name: &str, mime: &str, bytes: Vec<u8>) -> Result<String> {
        let part = Part::bytes(bytes)
            .file_name(name.to_owned())
            .mime_str(mime)
            .context("part mime")?;
        let form = Form::new()
            .part("file", part)
            .text("network", "public");
        let response = reqwest::Client::new()
            .post(PINATA_UPLOAD_URL)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .context("pinata request")?;
        let status = response.status();
        let body = response.json::<Value>().await.context("pinata body")?;
        body.pointer("/data/cid")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("pinata returned {status} without a cid: {body}"))
    }
}

/// Rewrites `metadata.image` to point at the pinned image.
fn splice_image(metadata: &mut Value, image_cid: &str) {
    if let Some(object) = metadata.as_object_mut() {
        object.insert("image".to_owned(), Value::String(format!("ipfs://{image_cid}")));
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// CID of the metadata document, the token URI payload.
    pub cid: String,
    pub image_cid: String,
}

#[utoipa::path(
    responses(
        (status = 200, description = "Image and metadata pinned; metadata.image now points at the image CID.", body = UploadResponse),
        (status = 400, description = "Missing or malformed parts.", body = ErrorBody),
        (status = 500, description = "Pinning failed.", body = ErrorBody),
    )
)]
#[post("/ipfs/upload")]
pub async fn upload(data: web::Data<AppData>, mut payload: Multipart) -> impl Responder {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut metadata_bytes: Option<Vec<u8>> = None;

    loop {
        let field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!("malformed multipart upload: {err}");
                return HttpResponse::BadRequest().json(ErrorBody::new("Malformed multipart"));
            }
        };
        let name = field.name().to_owned();
        let mime = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "image/jpeg".to_owned());
        let bytes = match read_field(field).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!("multipart field read failed: {err}");
                return HttpResponse::BadRequest().json(ErrorBody::new("Malformed multipart"));
            }
        };
        match name.as_str() {
            "image" => image = Some((mime, bytes)),
            "metadata" => metadata_bytes = Some(bytes),
            _ => {}
        }
    }

    let (Some((mime, image_bytes)), Some(metadata_bytes)) = (image, metadata_bytes) else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Missing image or metadata"));
    };
    let mut metadata: Value = match serde_json::from_slice(&metadata_bytes) {
        Ok(value) => value,
        Err(_) => return HttpResponse::BadRequest().json(ErrorBody::new("Invalid metadata")),
    };

    // Image first so its CID can be spliced into the metadata document.
    let result = async {
        let image_cid = data.pinner.pin_file("image.jpg", &mime, image_bytes).await?;
        splice_image(&mut metadata, &image_cid);
        let cid = data
            .pinner
            .pin_file(
                "metadata.json",
                "application/json",
                serde_json::to_vec(&metadata)?,
            )
            .await?;
        Ok::<_, anyhow::Error>(UploadResponse { cid, image_cid })
    }
    .await;

    match result {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => {
            tracing::error!("ipfs upload failed: {err:?}");
            HttpResponse::InternalServerError().json(ErrorBody::new("Internal error"))
        }
    }
}

async fn read_field(mut field: actix_multipart::Field) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|err| anyhow!("field chunk: {err}"))?
    {
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn image_field_is_spliced() {
        let mut metadata = json!({ "name": "Window Dreamer", "image": "placeholder" });
        splice_image(&mut metadata, "bafybeigdyrcid");
        assert_eq!(
            metadata.get("image").and_then(Value::as_str),
            Some("ipfs://bafybeigdyrcid")
        );
        assert_eq!(
            metadata.get("name").and_then(Value::as_str),
            Some("Window Dreamer")
        );
    }

    #[test]
    fn non_object_metadata_is_left_alone() {
        let mut metadata = json!("just a string");
        splice_image(&mut metadata, "bafybeigdyrcid");
        assert_eq!(metadata, json!("just a string"));
    }
}
