use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ChatApiError;

/// One part of a multimodal message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrlPart },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrlPart {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Inline an image attachment as a base64 data URL.
    pub fn image_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self::ImageUrl {
            image_url: ImageUrlPart {
                url: format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes)),
            },
        }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrlPart { url: url.into() },
        }
    }
}

/// Message content: a bare string for text-only turns, parts when images
/// ride along. Serialized untagged so both shapes match the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_owned(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_with_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_owned(),
            content: MessageContent::Parts(parts),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_owned(),
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Body of a streaming chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn streaming(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
        }
    }
}

/// Output dimensions accepted by the image-generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "256x256")]
    Square256,
    #[serde(rename = "512x512")]
    Square512,
    #[serde(rename = "1024x1024")]
    Square1024,
    #[serde(rename = "1792x1024")]
    Wide1792,
    #[serde(rename = "1024x1792")]
    Tall1792,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::Square1024
    }
}

/// Body of a non-streaming image-generation request.
#[derive(Debug, Clone, Serialize)]
pub struct ImagesRequest {
    pub model: String,
    pub prompt: String,
    pub n: u8,
    pub size: ImageSize,
}

impl ImagesRequest {
    /// Image count is clamped to the 1..=4 range the endpoint accepts.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, n: u8, size: ImageSize) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            n: n.clamp(1, 4),
            size,
        }
    }
}

/// Non-streaming image-generation response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesResponse {
    pub data: Vec<ImageAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageAsset {
    pub url: Option<String>,
    pub b64_json: Option<String>,
}

impl ImagesResponse {
    /// Extract one URL (or data URL) per generated asset.
    pub fn asset_urls(self) -> Result<Vec<String>, ChatApiError> {
        let urls: Vec<String> = self
            .data
            .into_iter()
            .filter_map(|asset| {
                asset.url.or_else(|| {
                    asset
                        .b64_json
                        .map(|encoded| format!("data:image/png;base64,{encoded}"))
                })
            })
            .collect();
        if urls.is_empty() {
            return Err(ChatApiError::EmptyImageResponse);
        }
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, ChatRequest, ContentPart, ImageSize, ImagesRequest, ImagesResponse};

    #[test]
    fn text_message_serializes_as_bare_string() {
        let message = ChatMessage::user("hello");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn multimodal_message_serializes_as_parts() {
        let message = ChatMessage::user_with_parts(vec![
            ContentPart::text("look"),
            ContentPart::image_url("https://example.com/a.png"),
        ]);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "https://example.com/a.png"
        );
    }

    #[test]
    fn image_bytes_produce_data_url() {
        let part = ContentPart::image_bytes("image/png", b"abc");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,YWJj");
    }

    #[test]
    fn chat_request_is_marked_streaming() {
        let request = ChatRequest::streaming("gpt-4o", vec![ChatMessage::user("hi")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["model"], "gpt-4o");
    }

    #[test]
    fn image_count_is_clamped() {
        assert_eq!(ImagesRequest::new("dall-e-3", "cat", 0, ImageSize::default()).n, 1);
        assert_eq!(ImagesRequest::new("dall-e-3", "cat", 9, ImageSize::default()).n, 4);
    }

    #[test]
    fn image_size_serializes_as_dimension_string() {
        let json = serde_json::to_value(ImageSize::Square1024).unwrap();
        assert_eq!(json, "1024x1024");
    }

    #[test]
    fn empty_image_response_is_an_error() {
        let response = ImagesResponse { data: Vec::new() };
        assert!(response.asset_urls().is_err());
    }

    #[test]
    fn b64_assets_become_data_urls() {
        let response: ImagesResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"Zm9v"}]}"#).unwrap();
        let urls = response.asset_urls().unwrap();
        assert_eq!(urls, vec!["data:image/png;base64,Zm9v".to_owned()]);
    }
}
