use clap::Parser;

use coda_client::CodaClient;
use coda_core::config::{self, API_KEY_HELP_URL};
use coda_mcp_runtime::McpServer;

#[derive(Parser)]
#[command(
    name = "coda-mcp",
    version,
    about = "Coda MCP server, exposing the Coda API as tools over stdio"
)]
struct Cli {
    /// Coda API token; also read from API_KEY or CODA_API_KEY
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Coda API base URL
    #[arg(long, env = "CODA_API_URL")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let api_key = match config::resolve_api_key(cli.api_key) {
        Ok(key) => key,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("Get your Coda API key from: {API_KEY_HELP_URL}");
            std::process::exit(1);
        }
    };

    let client = match CodaClient::new(api_key, cli.api_url.as_deref()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(message) = McpServer::new(client).serve_stdio().await {
        eprintln!("Failed to start server: {message}");
        std::process::exit(1);
    }
}
