//! Tool handlers for the Gemini image MCP server.
//!
//! This module provides the parameter types for the four image tools and the
//! `ImageToolHandler` that proxies each of them to the Gemini
//! `generateContent` API: one text part plus zero or more inline base64 image
//! parts in, one generated image out.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::images;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// MIME type assumed for image inputs and outputs that do not declare one.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Prompt used by `style_transfer` when the caller supplies none.
pub const STYLE_TRANSFER_PROMPT: &str =
    "Apply the style of the second image to the first image while preserving the original content";

/// Minimum number of input images for `compose_images`.
pub const MIN_COMPOSE_IMAGES: usize = 2;

/// One input image, supplied either as inline base64 data or as a local
/// file path. Inline data wins when both are present.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    /// Base64 image data without a data URL prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// Path to the input image file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// image/png or image/jpeg (defaults to image/png)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Parameters for the `generate_image` tool (text-to-image).
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageParams {
    /// Detailed scene description. Use photographic terms for photorealism.
    pub prompt: String,
    /// Optional path to save the image (png/jpeg by extension)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_to_file_path: Option<String>,
}

/// Parameters for the `edit_image` tool (text + one image to image).
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditImageParams {
    /// Describe the edit; the model matches original style and lighting.
    pub prompt: String,
    /// One input image
    pub image: ImageInput,
    /// Optional path to save the edited image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_to_file_path: Option<String>,
}

/// Parameters for the `compose_images` tool (multiple images + prompt).
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComposeImagesParams {
    /// Describe how to compose the elements of the input images.
    pub prompt: String,
    /// Input images, at least two, sent in the given order
    pub images: Vec<ImageInput>,
    /// Optional path to save the composed image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_to_file_path: Option<String>,
}

impl ComposeImagesParams {
    /// Validate the minimum image count before any network call is made.
    pub fn validate(&self) -> Result<()> {
        if self.images.len() < MIN_COMPOSE_IMAGES {
            return Err(Error::validation(format!(
                "compose_images requires at least {} images, got {}",
                MIN_COMPOSE_IMAGES,
                self.images.len()
            )));
        }
        Ok(())
    }
}

/// Parameters for the `style_transfer` tool (base image + style image).
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleTransferParams {
    /// Optional additional instruction for the style transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Image whose content is preserved
    pub base_image: ImageInput,
    /// Image whose style is applied
    pub style_image: ImageInput,
    /// Optional path to save the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_to_file_path: Option<String>,
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// Gemini `generateContent` request body.
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    /// Request contents (a single entry holding the ordered parts)
    pub contents: Vec<RequestContent>,
}

/// One content entry in the request.
#[derive(Debug, Serialize)]
pub struct RequestContent {
    /// Ordered parts: the text prompt first, then inline images
    pub parts: Vec<RequestPart>,
}

/// A single request part: either text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    /// Text prompt part
    Text {
        /// The prompt text
        text: String,
    },
    /// Inline base64 image part
    InlineData {
        /// The inline image payload
        inline_data: RequestInlineData,
    },
}

/// Inline image payload in the request (snake_case on the wire).
#[derive(Debug, Serialize)]
pub struct RequestInlineData {
    /// MIME type of the image
    pub mime_type: String,
    /// Base64-encoded image data
    pub data: String,
}

/// Gemini `generateContent` response body. Every level may be absent.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    /// Response candidates; only the first is inspected
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One response candidate.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    /// Candidate content
    pub content: Option<CandidateContent>,
}

/// Content of a response candidate.
#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    /// Response parts in API order
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One response part; only inline image data is extracted (camelCase on the wire).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    /// Inline image payload, when this part carries one
    pub inline_data: Option<ResponseInlineData>,
}

/// Inline image payload in the response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInlineData {
    /// Base64-encoded image data
    pub data: Option<String>,
    /// MIME type of the image
    pub mime_type: Option<String>,
}

// =============================================================================
// Result Types
// =============================================================================

/// Generated image data.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Base64-encoded image data
    pub data: String,
    /// MIME type of the image
    pub mime_type: String,
}

/// Result of a tool invocation: status line, first generated image, and the
/// same image rendered as a data URL.
#[derive(Debug)]
pub struct ImageReply {
    /// Human-readable status line, naming the save path if one exists
    pub status: String,
    /// The first generated image
    pub image: GeneratedImage,
    /// `data:<mime>;base64,<data>` rendering of the image
    pub data_url: String,
    /// Resolved absolute path of the saved file, when a target was supplied
    pub saved_path: Option<PathBuf>,
}

/// Convert image inputs into inline-data request parts, preserving order.
///
/// MIME type defaults to `image/png`; path-based inputs are read through
/// `images::load_base64`. An input with neither data nor path fails with a
/// validation error naming its position.
pub async fn to_inline_parts(inputs: &[ImageInput]) -> Result<Vec<RequestPart>> {
    let mut parts = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let mime_type = input
            .mime_type
            .clone()
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let data = match (&input.data_base64, &input.path) {
            (Some(data), _) => data.clone(),
            (None, Some(path)) => images::load_base64(path).await?,
            (None, None) => {
                return Err(Error::validation(format!(
                    "image input {} requires either dataBase64 or path",
                    index
                )));
            }
        };
        parts.push(RequestPart::InlineData {
            inline_data: RequestInlineData { mime_type, data },
        });
    }
    Ok(parts)
}

/// Extract generated images from the first candidate, in response order.
fn extract_images(response: GenerateContentResponse) -> Vec<GeneratedImage> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    parts
        .into_iter()
        .filter_map(|part| part.inline_data)
        .filter_map(|inline| {
            inline.data.map(|data| GeneratedImage {
                data,
                mime_type: inline
                    .mime_type
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            })
        })
        .collect()
}

/// Handler for the four image tools.
///
/// Holds the immutable configuration and a shared HTTP client; each
/// invocation is an independent request/response with no state in between.
#[derive(Clone)]
pub struct ImageToolHandler {
    /// Application configuration
    config: Config,
    /// HTTP client for API requests
    http: reqwest::Client,
}

impl ImageToolHandler {
    /// Create a new handler with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Issue one `generateContent` call: prompt text first, then the inline
    /// image parts in caller order.
    ///
    /// # Returns
    /// The ordered, non-empty list of generated images. Any failure (request,
    /// non-success status, unparsable body, no image data) is terminal.
    pub async fn generate_content(
        &self,
        prompt: &str,
        inputs: &[ImageInput],
    ) -> Result<Vec<GeneratedImage>> {
        let mut parts = vec![RequestPart::Text {
            text: prompt.to_string(),
        }];
        parts.extend(to_inline_parts(inputs).await?);

        let request = GenerateContentRequest {
            contents: vec![RequestContent { parts }],
        };

        let endpoint = &self.config.endpoint;
        debug!(endpoint = %endpoint, "Calling Gemini generateContent API");

        let response = self
            .http
            .post(endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::api(endpoint, 0, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(endpoint, status.as_u16(), body));
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            Error::api(
                endpoint,
                status.as_u16(),
                format!("Failed to parse response: {}", e),
            )
        })?;

        let results = extract_images(api_response);
        if results.is_empty() {
            return Err(Error::api(
                endpoint,
                status.as_u16(),
                "No image data returned by the Gemini API",
            ));
        }

        info!(count = results.len(), "Received images from API");
        Ok(results)
    }

    /// Generate an image from a text prompt.
    #[instrument(level = "info", name = "generate_image", skip(self, params))]
    pub async fn generate_image(&self, params: GenerateImageParams) -> Result<ImageReply> {
        let results = self.generate_content(&params.prompt, &[]).await?;
        self.reply("Generated image", results, params.save_to_file_path.as_deref())
            .await
    }

    /// Edit a single input image according to the prompt.
    #[instrument(level = "info", name = "edit_image", skip(self, params))]
    pub async fn edit_image(&self, params: EditImageParams) -> Result<ImageReply> {
        let results = self
            .generate_content(&params.prompt, std::slice::from_ref(&params.image))
            .await?;
        self.reply("Edited image", results, params.save_to_file_path.as_deref())
            .await
    }

    /// Compose a new image from two or more input images.
    #[instrument(level = "info", name = "compose_images", skip(self, params))]
    pub async fn compose_images(&self, params: ComposeImagesParams) -> Result<ImageReply> {
        params.validate()?;
        let results = self.generate_content(&params.prompt, &params.images).await?;
        self.reply("Composed image", results, params.save_to_file_path.as_deref())
            .await
    }

    /// Apply the style of one image to another, images in [base, style] order.
    #[instrument(level = "info", name = "style_transfer", skip(self, params))]
    pub async fn style_transfer(&self, params: StyleTransferParams) -> Result<ImageReply> {
        let prompt = params.prompt.as_deref().unwrap_or(STYLE_TRANSFER_PROMPT);
        let inputs = [params.base_image.clone(), params.style_image.clone()];
        let results = self.generate_content(prompt, &inputs).await?;
        self.reply(
            "Style transferred image",
            results,
            params.save_to_file_path.as_deref(),
        )
        .await
    }

    /// Take the first generated image, optionally persist it, and build the reply.
    async fn reply(
        &self,
        label: &str,
        results: Vec<GeneratedImage>,
        save_to: Option<&str>,
    ) -> Result<ImageReply> {
        let Some(first) = results.into_iter().next() else {
            return Err(Error::api(
                &self.config.endpoint,
                200,
                "No image data returned by the Gemini API",
            ));
        };

        let saved_path = images::save_base64(&first.data, &first.mime_type, save_to).await?;
        let status = match &saved_path {
            Some(path) => format!("{} saved to {}", label, path.display()),
            None => label.to_string(),
        };
        let data_url = format!("data:{};base64,{}", first.mime_type, first.data);

        Ok(ImageReply {
            status,
            data_url,
            saved_path,
            image: first,
        })
    }
}
