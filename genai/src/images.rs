//! OpenAI-compatible image generation client.

use crate::messages::http_client;
use crate::Error;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.openai.com/v1";

/// Model used unless one is configured.
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

/// A generated image, either hosted or returned inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Image {
    Url(String),
    Inline { media_type: String, data: String },
}

impl Image {
    /// A URI usable wherever an image source is expected.
    ///
    /// Inline images become `data:` URIs.
    pub fn to_uri(&self) -> String {
        match self {
            Image::Url(url) => url.clone(),
            Image::Inline { media_type, data } => format!("data:{media_type};base64,{data}"),
        }
    }
}

/// Image generation client.
#[derive(Clone)]
pub struct ImageClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    size: Option<String>,
}

impl ImageClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: API_BASE.to_string(),
            size: None,
        }
    }

    /// Create a client from `IMAGE_API_KEY`, honouring `IMAGE_API_BASE`,
    /// `IMAGE_MODEL` and `IMAGE_SIZE` when set.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("IMAGE_API_KEY").map_err(|_| Error::NoApiKey)?;
        let mut client = Self::new(api_key);
        if let Ok(base) = std::env::var("IMAGE_API_BASE") {
            client = client.with_base_url(base);
        }
        if let Ok(model) = std::env::var("IMAGE_MODEL") {
            client = client.with_model(model);
        }
        if let Ok(size) = std::env::var("IMAGE_SIZE") {
            client = client.with_size(size);
        }
        Ok(client)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Request a specific size such as `1024x1024`.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Generate one image for the prompt.
    pub async fn generate(&self, prompt: &str) -> Result<Image, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );

        let body = ApiImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: self.size.as_deref(),
        };

        tracing::debug!(model = %self.model, "sending image generation request");

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiImageResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parse_image(api_response)
    }
}

fn parse_image(response: ApiImageResponse) -> Result<Image, Error> {
    let first = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("no image in response".to_string()))?;

    match (first.b64_json, first.url) {
        (Some(data), _) if !data.is_empty() => Ok(Image::Inline {
            media_type: format!(
                "image/{}",
                response.output_format.as_deref().unwrap_or("png")
            ),
            data,
        }),
        (_, Some(url)) if !url.is_empty() => Ok(Image::Url(url)),
        _ => Err(Error::Parse(
            "image carried neither data nor url".to_string(),
        )),
    }
}

#[derive(Debug, Serialize)]
struct ApiImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiImageResponse {
    #[serde(default)]
    data: Vec<ApiImageData>,
    #[serde(default)]
    output_format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_image_uri() {
        let image = Image::Inline {
            media_type: "image/png".to_string(),
            data: "AAAA".to_string(),
        };
        assert_eq!(image.to_uri(), "data:image/png;base64,AAAA");
        assert_eq!(
            Image::Url("https://x/y.png".into()).to_uri(),
            "https://x/y.png"
        );
    }

    #[test]
    fn test_parse_prefers_inline_data() {
        let raw = serde_json::json!({
            "data": [{"b64_json": "QUJD", "url": "https://x/y.png"}],
            "output_format": "webp"
        });
        let image = parse_image(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(
            image,
            Image::Inline {
                media_type: "image/webp".to_string(),
                data: "QUJD".to_string()
            }
        );
    }

    #[test]
    fn test_parse_url_only() {
        let raw = serde_json::json!({"data": [{"url": "https://x/y.png"}]});
        let image = parse_image(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(image, Image::Url("https://x/y.png".to_string()));
    }

    #[test]
    fn test_parse_empty_is_error() {
        let raw = serde_json::json!({"data": []});
        assert!(matches!(
            parse_image(serde_json::from_value(raw).unwrap()),
            Err(Error::Parse(_))
        ));
    }
}
