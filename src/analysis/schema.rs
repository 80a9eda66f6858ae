use serde::Serialize;
use serde_json::{json, Value};

/// Instruction sent with every plate photo. The model answers in French to
/// match the product copy.
pub const ANALYSIS_PROMPT: &str = "Analyze plate. French response.";

pub const IMAGE_MIME_TYPE: &str = "image/png";

// --- generateContent request body ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: &'static str,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: &'static str,
    pub response_schema: Value,
}

/// Pure builder: one user turn carrying the instruction and the inline
/// image, constrained to emit JSON in the shape of `AnalysisResult`.
pub fn build_request(prompt: &str, image_payload: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text {
                    text: prompt.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: IMAGE_MIME_TYPE,
                        data: image_payload.to_string(),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
        },
    }
}

/// The output contract, declared to the API rather than described in prose.
/// The client still re-validates the payload it gets back.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "foods": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "portion": { "type": "STRING" },
                        "calories": { "type": "NUMBER" },
                        "protein": { "type": "NUMBER" },
                        "carbs": { "type": "NUMBER" },
                        "fat": { "type": "NUMBER" }
                    },
                    "required": ["name", "calories"]
                }
            },
            "totalCalories": { "type": "NUMBER" },
            "healthScore": { "type": "NUMBER" },
            "healthLabel": { "type": "STRING" },
            "analysis": { "type": "STRING" },
            "recommendation": { "type": "STRING" }
        },
        "required": [
            "foods",
            "totalCalories",
            "healthScore",
            "healthLabel",
            "analysis",
            "recommendation"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_prompt_and_inline_image() {
        let request = build_request(ANALYSIS_PROMPT, "QUJD");
        let body = serde_json::to_value(&request).expect("request serializes");

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], ANALYSIS_PROMPT);

        let inline = &body["contents"][0]["parts"][1]["inlineData"];
        assert_eq!(inline["mimeType"], "image/png");
        assert_eq!(inline["data"], "QUJD");

        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn schema_requires_the_full_result_shape() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("required list")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for field in [
            "foods",
            "totalCalories",
            "healthScore",
            "healthLabel",
            "analysis",
            "recommendation",
        ] {
            assert!(required.contains(&field), "missing required {field}");
        }

        let food_required = &schema["properties"]["foods"]["items"]["required"];
        assert_eq!(*food_required, json!(["name", "calories"]));
    }
}
