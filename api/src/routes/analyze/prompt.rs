use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Fixed instruction sent with every classification request. The model is
/// asked for strict JSON matching [`CatAnalysis`].
pub const CAT_CLASSIFICATION_PROMPT: &str = r#"
Analyze this image carefully and determine if it contains a cat. Look for feline features, fur patterns, ears, whiskers, and typical cat behaviors or poses.

**Important**: Only classify as a cat if you're confident the image shows a cat. If the image shows:
- Other animals (dogs, birds, etc.)
- The cat is not real, e.g. a cat-like toy, a cat-like drawing, a cat-like sculpture, anime cat, etc.
- Objects that might look like cats
- Poor quality images where you can't clearly identify a cat
- Multiple animals where a cat is not the primary subject

Then set "isCat": false and provide a helpful explanation.

If it IS a cat, provide detailed information about:

1. **Title**: Create a fun, unique 1-4 word name for this cat based on its appearance, pose, expression, and environment. Examples: "Banana Philosopher", "Window Dreamer", "Curious Explorer", "Sunny Lounger"

2. **Breed**: Identify the most likely cat breed or mix (e.g., "Persian", "Siamese", "Maine Coon", "Siberian", "etc.")

3. **Color**: Describe the primary color (e.g., "Orange", "Black", "Gray", "White")

4. **Pattern**: Any specific markings (e.g., "Tabby", "Solid", "Calico", "Bicolor") - only if clearly visible

5. **Body Type**: The cat's build (e.g., "sleek", "muscular", "fluffy", "stocky", "longhaired")

6. **Eye Color**: Color of the eyes (e.g., "Green", "Blue", "Yellow") - ONLY if clearly visible in the image

7. **Pose**: The cat's position/pose (e.g., "standing", "sitting", "lying", "curled", "jumping", "alert")

8. **Photo Quality**: Image quality assessment (e.g., "excellent", "good", "fair", "poor")

9. **Welfare Check**: Assess for obvious welfare indicators (NOT medical diagnosis):
   - "appears_underweight" - if cat looks very thin
   - "visible_injury" - if there are obvious wounds/scars
   - "poor_coat_condition" - if fur looks extremely matted or unhealthy
   - "abnormal_posture" - if posture suggests discomfort
   - "appears_healthy" - if no obvious concerns

10. **Scene Description**: Brief description of the scene/environment (1-2 sentences)

11. **Detected Features**: List which features were clearly identifiable (e.g., ["face", "body", "eyes", "environment"])

**Guidelines:**
- For conditional features (eyeColor, pattern): Only include if clearly visible and confident (>70%)
- For welfare indicators: Only flag obvious concerns, never diagnose medical conditions
- For title: Make it fun and unique but relevant to what you see
- Keep all responses concise and factual
- If uncertain about any attribute, use "Unknown" or omit optional fields

Format your response as JSON with the following structure:
{
  "isCat": true/false,
  "title": "Fun Name",
  "breed": "string",
  "color": "string",
  "pattern": "string",
  "bodyType": "sleek" | "muscular" | "fluffy" | "stocky" | "longhaired",
  "eyeColor": "string",
  "pose": "standing" | "sitting" | "lying" | "curled" | "jumping" | "alert",
  "photoQuality": "excellent" | "good" | "poor",
  "welfareCheck": {
    "attentionNeeded": true/false,
    "indicators": ["appears_underweight", "visible_injury"],
    "recommendation": "monitor" | "consult_vet" | "appears_healthy"
  },
  "sceneDescription": "Brief scene description",
  "detectedFeatures": ["face", "body", "environment"]
}

For non-cat images, set "isCat": false and explain what you see in the "sceneDescription" field.
"#;

/// Non-diagnostic welfare flags, passed through to the client verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WelfareCheck {
    #[serde(default)]
    pub attention_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatAnalysis {
    #[serde(default)]
    pub is_cat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welfare_check: Option<WelfareCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_features: Option<Vec<String>>,
    /// Unknown model fields pass through untouched.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl CatAnalysis {
    /// Degraded classification: every failure mode collapses to this.
    pub fn not_a_cat(scene_description: &str) -> Self {
        Self {
            is_cat: false,
            title: None,
            breed: None,
            color: None,
            pattern: None,
            body_type: None,
            eye_color: None,
            pose: None,
            photo_quality: None,
            welfare_check: None,
            scene_description: Some(scene_description.to_owned()),
            detected_features: None,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_model_reply() {
        let reply = json!({
            "isCat": true,
            "title": "Banana Philosopher",
            "breed": "Siberian",
            "color": "Orange",
            "bodyType": "fluffy",
            "welfareCheck": {
                "attentionNeeded": false,
                "recommendation": "appears_healthy"
            },
            "sceneDescription": "A cat on a sunny windowsill.",
            "detectedFeatures": ["face", "body"],
            "confidence": 0.97
        });
        let analysis: CatAnalysis = serde_json::from_value(reply).unwrap();
        assert!(analysis.is_cat);
        assert_eq!(analysis.title.as_deref(), Some("Banana Philosopher"));
        assert_eq!(analysis.body_type.as_deref(), Some("fluffy"));
        assert!(!analysis.welfare_check.as_ref().unwrap().attention_needed);
        // Fields the prompt never asked for survive the round trip.
        assert_eq!(analysis.extra.get("confidence"), Some(&json!(0.97)));
        let back = serde_json::to_value(&analysis).unwrap();
        assert_eq!(back.get("confidence"), Some(&json!(0.97)));
    }

    #[test]
    fn missing_flag_means_not_a_cat() {
        let analysis: CatAnalysis = serde_json::from_str("{}").unwrap();
        assert!(!analysis.is_cat);
    }
}
