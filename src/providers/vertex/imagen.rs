//! Vertex AI Imagen request/response mapping for the `:predict` endpoint.

use crate::error::LlmError;
use crate::types::{GeneratedImage, ImageGenerationRequest, ImageGenerationResponse};
use base64::Engine;
use serde_json::{Map, Value, json};

/// Build the `:predict` body: one instance carrying the prompt plus `parameters`.
pub fn build_request_body(req: &ImageGenerationRequest) -> Value {
    let mut parameters = Map::new();
    parameters.insert("sampleCount".to_string(), json!(req.count.max(1)));
    if let Some(neg) = &req.negative_prompt {
        parameters.insert("negativePrompt".to_string(), json!(neg));
    }
    if let Some(ar) = &req.aspect_ratio {
        parameters.insert("aspectRatio".to_string(), json!(ar));
    }
    if let Some(seed) = req.seed {
        parameters.insert("seed".to_string(), json!(seed));
    }
    for (k, v) in &req.extra_params {
        parameters.insert(k.clone(), v.clone());
    }

    json!({
        "instances": [{ "prompt": req.prompt }],
        "parameters": Value::Object(parameters),
    })
}

fn sniff_mime(b64: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(b64).ok()?;
    infer::get(&bytes).map(|t| t.mime_type().to_string())
}

/// Map a `:predict` response into images. The raw body is kept as-is.
pub fn parse_response(raw: Value, model: &str) -> Result<ImageGenerationResponse, LlmError> {
    if !raw.is_object() {
        return Err(LlmError::ParseError(
            "Vertex predict response is not a JSON object".to_string(),
        ));
    }

    // Safety filters can drop every prediction, in which case the key is absent.
    let preds = raw
        .get("predictions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut images = Vec::with_capacity(preds.len());
    for pred in preds {
        let Value::Object(mut obj) = pred else {
            continue;
        };
        let b64_json = obj
            .remove("bytesBase64Encoded")
            .and_then(|v| v.as_str().map(str::to_string));
        let mime_type = obj
            .remove("mimeType")
            .and_then(|v| v.as_str().map(str::to_string))
            .or_else(|| b64_json.as_deref().and_then(sniff_mime));
        let revised_prompt = obj
            .remove("prompt")
            .and_then(|v| v.as_str().map(str::to_string));

        images.push(GeneratedImage {
            b64_json,
            mime_type,
            revised_prompt,
            metadata: obj.into_iter().collect(),
        });
    }

    Ok(ImageGenerationResponse {
        images,
        model: model.to_string(),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn default_body_requests_one_sample() {
        let body = build_request_body(&ImageGenerationRequest::new("a cat"));
        assert_eq!(
            body,
            json!({
                "instances": [{ "prompt": "a cat" }],
                "parameters": { "sampleCount": 1 }
            })
        );
    }

    #[test]
    fn optional_parameters_are_merged() {
        let req = ImageGenerationRequest::new("a dog")
            .with_count(3)
            .with_negative_prompt("blurry")
            .with_aspect_ratio("16:9")
            .with_seed(42)
            .with_extra_param("addWatermark", json!(false));
        let body = build_request_body(&req);
        let params = &body["parameters"];
        assert_eq!(params["sampleCount"], 3);
        assert_eq!(params["negativePrompt"], "blurry");
        assert_eq!(params["aspectRatio"], "16:9");
        assert_eq!(params["seed"], 42);
        assert_eq!(params["addWatermark"], false);
    }

    #[test]
    fn parses_predictions_and_keeps_raw() {
        let raw = json!({
            "predictions": [
                { "bytesBase64Encoded": PNG_B64, "mimeType": "image/png", "raiFilteredReason": null },
                { "bytesBase64Encoded": PNG_B64, "prompt": "an orange cat" }
            ],
            "deployedModelId": "123"
        });
        let resp = parse_response(raw.clone(), "imagegeneration").unwrap();
        assert_eq!(resp.raw, raw);
        assert_eq!(resp.images.len(), 2);
        assert_eq!(resp.images[0].mime_type.as_deref(), Some("image/png"));
        assert!(resp.images[0].metadata.contains_key("raiFilteredReason"));
        // sniffed from the decoded bytes
        assert_eq!(resp.images[1].mime_type.as_deref(), Some("image/png"));
        assert_eq!(resp.images[1].revised_prompt.as_deref(), Some("an orange cat"));
        assert!(resp.images[1].bytes().unwrap().unwrap().starts_with(b"\x89PNG"));
    }

    #[test]
    fn filtered_response_has_no_images() {
        let resp = parse_response(json!({}), "imagegeneration").unwrap();
        assert!(resp.images.is_empty());
        assert!(parse_response(json!([1, 2]), "m").is_err());
    }
}
