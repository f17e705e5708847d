//! Gemini Flash Image MCP Server
//!
//! MCP server proxying image generation tools to the Gemini 2.5 Flash Image API.

use anyhow::Result;
use clap::Parser;
use gemini_flash_image_mcp::{Config, ImageServer, McpServerBuilder, TransportArgs};

/// Command-line arguments for the image server.
#[derive(Parser, Debug)]
#[command(name = "gemini-flash-image-mcp")]
#[command(about = "MCP server for image generation using Gemini 2.5 Flash Image")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(
        server_name = %config.server_name,
        endpoint = %config.endpoint,
        "Configuration loaded"
    );

    // Create the server handler
    let server = ImageServer::new(config);

    // Build and run the MCP server
    let transport = args.transport.into_transport();

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
