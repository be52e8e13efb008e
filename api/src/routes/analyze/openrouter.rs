use super::prompt::{CatAnalysis, CAT_CLASSIFICATION_PROMPT};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[async_trait::async_trait]
pub trait VisionClassifying: Send + Sync {
    async fn classify(&self, image_base64: &str) -> Result<CatAnalysis>;
}

pub struct OpenRouterApi {
    api_key: String,
    model: String,
    referer: String,
}

impl OpenRouterApi {
    pub fn new(api_key: &str, model: &str, referer: &str) -> Self {
        Self {
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            referer: referer.to_owned(),
        }
    }

    fn request_body(&self, image_base64: &str) -> Value {
        // Accept both data URLs and raw base64.
        let raw = image_base64.rsplit(',').next().unwrap_or(image_base64);
        let image_data_url = format!("data:image/jpeg;base64,{raw}");
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": "You are a precise vision assistant." },
                { "role": "user", "content": [
                    { "type": "text", "text": CAT_CLASSIFICATION_PROMPT },
                    { "type": "image_url", "image_url": { "url": image_data_url } },
                ]},
            ],
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
        })
    }

    fn parse_completion(response: Value) -> CatAnalysis {
        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or("{}");
        match serde_json::from_str(content) {
            Ok(analysis) => analysis,
            Err(err) => {
                tracing::warn!("unparseable model reply: {err} - degrading to not-a-cat");
                CatAnalysis::not_a_cat("Unparseable response")
            }
        }
    }
}

#[async_trait::async_trait]
impl VisionClassifying for OpenRouterApi {
    async fn classify(&self, image_base64: &str) -> Result<CatAnalysis> {
        let response = Client::new()
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", "Catlas")
            .json(&self.request_body(image_base64))
            .send()
            .await
            .context("openrouter request")?
            .json::<Value>()
            .await
            .context("openrouter response body")?;
        Ok(Self::parse_completion(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_header_is_stripped() {
        let api = OpenRouterApi::new("key", "some/model", "http://localhost:3000");
        let body = api.request_body("data:image/png;base64,AAAA");
        let url = body
            .pointer("/messages/1/content/1/image_url/url")
            .and_then(Value::as_str)
            .unwrap();
        assert_eq!(url, "data:image/jpeg;base64,AAAA");

        // Raw base64 without header gets the same treatment.
        let body = api.request_body("BBBB");
        let url = body
            .pointer("/messages/1/content/1/image_url/url")
            .and_then(Value::as_str)
            .unwrap();
        assert_eq!(url, "data:image/jpeg;base64,BBBB");
    }

    #[test]
    fn completion_content_is_parsed() {
        let response = json!({
            "choices": [{
                "message": {
                    "content": "{\"isCat\": true, \"title\": \"Window Dreamer\"}"
                }
            }]
        });
        let analysis = OpenRouterApi::parse_completion(response);
        assert!(analysis.is_cat);
        assert_eq!(analysis.title.as_deref(), Some("Window Dreamer"));
    }

    #[test]
    fn garbage_content_degrades_to_not_a_cat() {
        let response = json!({
            "choices": [{ "message": { "content": "Sorry, I cannot do that." } }]
        });
        let analysis = OpenRouterApi::parse_completion(response);
        assert!(!analysis.is_cat);
        assert_eq!(analysis.scene_description.as_deref(), Some("Unparseable response"));
    }

    #[test]
    fn missing_choices_degrade_quietly() {
        let analysis = OpenRouterApi::parse_completion(json!({ "error": "rate limited" }));
        assert!(!analysis.is_cat);
    }
}
