use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use fakestore_mcp::client::RpcClient;
use fakestore_mcp::config::Config;
use fakestore_mcp::gateway::Gateway;
use fakestore_mcp::mcp;
use fakestore_mcp::mcp::session::SessionStore;

#[derive(Parser)]
#[command(
    name = "fakestore-mcp",
    about = "Storefront MCP server backed by the FakeStore API"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server (default)
    Serve,

    /// Call a single tool against a running server and print the payload
    Call {
        /// Tool name, e.g. get_products
        #[arg(short, long)]
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        arguments: String,

        /// MCP endpoint URL
        #[arg(short, long, default_value = "http://127.0.0.1:3000/mcp")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::Call {
            tool,
            arguments,
            url,
        } => cmd_call(&tool, &arguments, &url).await,
    }
}

/// Start the MCP server.
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        gateway_url = %config.gateway_url,
        "Starting storefront MCP server"
    );

    let gateway = Arc::new(Gateway::new(&config.gateway_url));
    let sessions = SessionStore::new();
    let app = mcp::router(gateway, sessions);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "MCP server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Call one tool and pretty-print its payload.
async fn cmd_call(tool: &str, arguments: &str, url: &str) -> anyhow::Result<()> {
    let args: serde_json::Value = serde_json::from_str(arguments)?;
    let mut client = RpcClient::new(url);
    let payload = client.call_tool(tool, args).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
