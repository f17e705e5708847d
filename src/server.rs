//! MCP Server implementation for the Gemini image server.
//!
//! Exposes four tools over the MCP tool registry:
//! - `generate_image`: text-to-image
//! - `edit_image`: edit one input image with a prompt
//! - `compose_images`: combine two or more input images
//! - `style_transfer`: apply a style image to a base image
//!
//! Every tool reply carries three ordered content items: a status line, the
//! raw image, and a data-URL rendering of the same image.

use crate::config::Config;
use crate::error::Error;
use crate::handler::{
    ComposeImagesParams, EditImageParams, GenerateImageParams, ImageReply, ImageToolHandler,
    StyleTransferParams,
};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::info;

/// MCP Server for Gemini image generation.
#[derive(Clone)]
pub struct ImageServer {
    /// Handler performing the actual API calls
    handler: ImageToolHandler,
    /// Server name advertised in MCP server info
    server_name: String,
}

impl ImageServer {
    /// Create a new ImageServer with the given configuration.
    pub fn new(config: Config) -> Self {
        let server_name = config.server_name.clone();
        Self {
            handler: ImageToolHandler::new(config),
            server_name,
        }
    }
}

/// Deserialize tool arguments into the tool's parameter struct.
fn parse_args<T: DeserializeOwned>(
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> Result<T, McpError> {
    arguments
        .map(|args| serde_json::from_value(serde_json::Value::Object(args)))
        .transpose()
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))?
        .ok_or_else(|| McpError::invalid_params("Missing parameters", None))
}

/// Map a handler error onto the MCP error surface.
fn tool_error(error: Error) -> McpError {
    if error.is_validation() {
        McpError::invalid_params(error.to_string(), None)
    } else {
        McpError::internal_error(error.to_string(), None)
    }
}

/// Build the three ordered content items of a tool reply.
fn reply_contents(reply: ImageReply) -> Vec<Content> {
    vec![
        Content::text(reply.status),
        Content::image(reply.image.data, reply.image.mime_type),
        Content::text(reply.data_url),
    ]
}

/// JSON schema for a tool parameter struct, in the shape rmcp expects.
fn input_schema<T: schemars::JsonSchema>() -> Arc<serde_json::Map<String, serde_json::Value>> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema).unwrap_or_default() {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

impl ServerHandler for ImageServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Image generation server backed by the Gemini 2.5 Flash Image API. \
                 Use generate_image for text-to-image, edit_image to modify one image, \
                 compose_images to combine several images, and style_transfer to apply \
                 the style of one image to another."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_
    {
        async move {
            use rmcp::model::{ListToolsResult, Tool};

            Ok(ListToolsResult {
                tools: vec![
                    Tool {
                        name: Cow::Borrowed("generate_image"),
                        description: Some(Cow::Borrowed(
                            "Generate an image from a text prompt using Gemini 2.5 Flash Image",
                        )),
                        input_schema: input_schema::<GenerateImageParams>(),
                        annotations: None,
                        icons: None,
                        meta: None,
                        output_schema: None,
                        title: None,
                    },
                    Tool {
                        name: Cow::Borrowed("edit_image"),
                        description: Some(Cow::Borrowed(
                            "Edit an image using a prompt. Provide one input image via base64 or file path.",
                        )),
                        input_schema: input_schema::<EditImageParams>(),
                        annotations: None,
                        icons: None,
                        meta: None,
                        output_schema: None,
                        title: None,
                    },
                    Tool {
                        name: Cow::Borrowed("compose_images"),
                        description: Some(Cow::Borrowed(
                            "Compose a new image using multiple input images and a guiding prompt.",
                        )),
                        input_schema: input_schema::<ComposeImagesParams>(),
                        annotations: None,
                        icons: None,
                        meta: None,
                        output_schema: None,
                        title: None,
                    },
                    Tool {
                        name: Cow::Borrowed("style_transfer"),
                        description: Some(Cow::Borrowed(
                            "Transfer style from a style image to a base image, guided by an optional prompt.",
                        )),
                        input_schema: input_schema::<StyleTransferParams>(),
                        annotations: None,
                        icons: None,
                        meta: None,
                        output_schema: None,
                        title: None,
                    },
                ],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            info!(tool = %params.name, "Tool call received");

            let reply = match params.name.as_ref() {
                "generate_image" => {
                    let tool_params: GenerateImageParams = parse_args(params.arguments)?;
                    self.handler.generate_image(tool_params).await
                }
                "edit_image" => {
                    let tool_params: EditImageParams = parse_args(params.arguments)?;
                    self.handler.edit_image(tool_params).await
                }
                "compose_images" => {
                    let tool_params: ComposeImagesParams = parse_args(params.arguments)?;
                    self.handler.compose_images(tool_params).await
                }
                "style_transfer" => {
                    let tool_params: StyleTransferParams = parse_args(params.arguments)?;
                    self.handler.style_transfer(tool_params).await
                }
                _ => {
                    return Err(McpError::invalid_params(
                        format!("Unknown tool: {}", params.name),
                        None,
                    ));
                }
            }
            .map_err(tool_error)?;

            Ok(CallToolResult::success(reply_contents(reply)))
        }
    }
}
