//! Configuration module for loading environment variables and settings.

use tracing::warn;

/// Default Gemini image generation endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image-preview:generateContent";

/// Default server name advertised over MCP.
pub const DEFAULT_SERVER_NAME: &str = "gemini-2-5-flash-mcp";

/// Application configuration loaded from environment variables.
///
/// Read once at startup and immutable thereafter; handlers receive it by
/// reference and never consult the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key, passed as the `key` query parameter on each request
    pub api_key: String,
    /// Full `generateContent` endpoint URL
    pub endpoint: String,
    /// Server name advertised in MCP server info
    pub server_name: String,
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// A missing `GEMINI_API_KEY` is logged but not fatal: the server still
    /// starts, and each tool call fails at the remote API instead.
    pub fn from_env() -> Self {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            warn!("GEMINI_API_KEY is not set; image generation calls will fail");
        }

        let endpoint = std::env::var("GEMINI_IMAGE_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        let server_name =
            std::env::var("MCP_NAME").unwrap_or_else(|_| DEFAULT_SERVER_NAME.to_string());

        Self {
            api_key,
            endpoint,
            server_name,
        }
    }
}
