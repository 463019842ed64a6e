use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ReceiptError;

/// Public endpoint of the document text detection API.
pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [ImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    image: Image<'a>,
    features: [Feature; 1],
}

#[derive(Debug, Serialize)]
struct Image<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Status,
}

fn annotate_body(content: &str) -> AnnotateRequest<'_> {
    AnnotateRequest {
        requests: [ImageRequest {
            image: Image { content },
            features: [Feature {
                kind: "DOCUMENT_TEXT_DETECTION",
            }],
        }],
    }
}

/// Decode client supplied image data, accepting `data:<mime>;base64,` URLs.
pub(crate) fn decode_image(raw: &str) -> Result<Vec<u8>, ReceiptError> {
    let raw = raw.trim();
    let payload = match raw.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => raw,
    };
    if payload.is_empty() {
        return Err(ReceiptError::EmptyImage);
    }
    let bytes = STANDARD.decode(payload)?;
    if bytes.is_empty() {
        return Err(ReceiptError::EmptyImage);
    }
    Ok(bytes)
}

/// Client for the OCR service.
#[derive(Clone, Debug)]
pub struct VisionClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl VisionClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Run document text detection on `image` and return the full text,
    /// empty when nothing was recognized.
    pub async fn detect_text(&self, image: &[u8]) -> Result<String, ReceiptError> {
        if self.api_key.is_empty() {
            return Err(ReceiptError::MissingApiKey);
        }

        let content = STANDARD.encode(image);
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&annotate_body(&content))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => "vision service error".to_string(),
            };
            return Err(ReceiptError::Vision { status, message });
        }

        let body: AnnotateResponse = resp.json().await?;
        let first = body.responses.into_iter().next().unwrap_or_default();
        if let Some(error) = first.error {
            return Err(ReceiptError::Vision {
                status,
                message: error.message,
            });
        }
        Ok(first
            .full_text_annotation
            .map(|annotation| annotation.text)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_asks_for_document_text() {
        let body = serde_json::to_value(annotate_body("aGVsbG8=")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "requests": [{
                    "image": { "content": "aGVsbG8=" },
                    "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
                }]
            })
        );
    }

    #[test]
    fn response_text_is_read_from_full_annotation() {
        let raw = r#"{"responses":[{"fullTextAnnotation":{"text":"CAFE\nTotal 50.000"}}]}"#;
        let parsed: AnnotateResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.responses[0]
            .full_text_annotation
            .as_ref()
            .map(|a| a.text.as_str());
        assert_eq!(text, Some("CAFE\nTotal 50.000"));

        let empty: AnnotateResponse = serde_json::from_str(r#"{"responses":[{}]}"#).unwrap();
        assert!(empty.responses[0].full_text_annotation.is_none());
    }

    #[test]
    fn data_urls_and_plain_base64_decode() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_image("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn empty_or_garbage_images_are_rejected() {
        assert!(matches!(decode_image("  "), Err(ReceiptError::EmptyImage)));
        assert!(matches!(
            decode_image("data:image/png;base64,"),
            Err(ReceiptError::EmptyImage)
        ));
        assert!(matches!(
            decode_image("not base64!"),
            Err(ReceiptError::InvalidImage(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = VisionClient::new(Client::new(), "http://127.0.0.1:9", "");
        let err = client.detect_text(b"img").await.unwrap_err();
        assert!(matches!(err, ReceiptError::MissingApiKey));
    }
}
