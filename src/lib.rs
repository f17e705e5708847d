//! Gemini Flash Image MCP Server Library
//!
//! An MCP server exposing Gemini 2.5 Flash image generation as tools:
//! text-to-image, image editing, multi-image composition, and style transfer.

pub mod config;
pub mod error;
pub mod handler;
pub mod images;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use handler::{
    ComposeImagesParams, EditImageParams, GenerateImageParams, GeneratedImage, ImageInput,
    ImageReply, ImageToolHandler, StyleTransferParams,
};
pub use server::ImageServer;
pub use transport::{McpServerBuilder, ServerError, Transport, TransportArgs, TransportMode, shutdown_channel};
