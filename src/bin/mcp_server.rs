//! price-compare MCP Server
//!
//! This binary provides a Model Context Protocol (MCP) server exposing the
//! price-comparison operations to AI assistants and other MCP clients.

use clap::{Parser, ValueEnum};
use price_compare::browser::{BrowserSession, ConnectionOptions, LaunchOptions, Timings};
use price_compare::mcp::BrowserServer;
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;

#[cfg(feature = "mcp-server")]
use rmcp::transport::{
    sse_server::{SseServer, SseServerConfig},
    streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager},
};

#[cfg(feature = "mcp-server")]
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Standard input/output transport (default)
    Stdio,
    /// Server-Sent Events transport
    Sse,
    /// HTTP streamable transport
    Http,
}

#[derive(Parser)]
#[command(name = "mcp-server")]
#[command(version)]
#[command(about = "FairPrice / Lazada price comparison MCP server", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// JSON file overriding operation timings
    #[arg(long, value_name = "FILE")]
    timings: Option<PathBuf>,

    /// Transport type to use
    #[arg(long, short = 't', value_enum, default_value = "stdio")]
    transport: Transport,

    /// Port for SSE or HTTP transport (default: 3000)
    #[arg(long, short = 'p', default_value = "3000")]
    port: u16,

    /// SSE endpoint path (default: /sse)
    #[arg(long, default_value = "/sse")]
    sse_path: String,

    /// SSE POST path for messages (default: /message)
    #[arg(long, default_value = "/message")]
    sse_post_path: String,

    /// HTTP streamable endpoint path (default: /mcp)
    #[arg(long, default_value = "/mcp")]
    http_path: String,
}

/// How each served session gets its browser
#[derive(Clone)]
enum BrowserSource {
    Launch(LaunchOptions),
    Connect(ConnectionOptions),
}

impl BrowserSource {
    fn server(&self) -> Result<BrowserServer, String> {
        match self {
            BrowserSource::Launch(options) => BrowserServer::with_options(options.clone()),
            BrowserSource::Connect(options) => BrowserSession::connect(options.clone())
                .map(BrowserServer::with_session)
                .map_err(|e| format!("Failed to connect to browser: {}", e)),
        }
    }
}

fn load_timings(path: Option<&PathBuf>) -> Result<Timings, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(Timings::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let timings = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid timings in {}: {}", path.display(), e))?;
    Ok(timings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let timings = load_timings(cli.timings.as_ref())?;

    eprintln!("price-compare MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let source = match cli.ws_endpoint.clone() {
        Some(endpoint) => {
            eprintln!("WebSocket endpoint: {}", endpoint);
            BrowserSource::Connect(ConnectionOptions::new(endpoint).timings(timings))
        }
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed).timings(timings);
            if let Some(path) = cli.executable_path.clone() {
                eprintln!("Browser executable: {}", path.display());
                options = options.chrome_path(path);
            }
            if let Some(dir) = cli.user_data_dir.clone() {
                eprintln!("User data directory: {}", dir.display());
                options = options.user_data_dir(dir);
            }
            let mode = if options.headless { "headless" } else { "headed" };
            eprintln!("Browser mode: {}", mode);
            BrowserSource::Launch(options)
        }
    };

    // Route to appropriate transport
    match cli.transport {
        Transport::Stdio => {
            eprintln!("Transport: stdio");
            eprintln!("Ready to accept MCP connections via stdio");
            let service = source
                .server()
                .map_err(|e| format!("Failed to create browser server: {}", e))?;
            let server = service.serve(stdio()).await?;
            let quit_reason = server.waiting().await?;
            eprintln!("Server quit with reason: {:?}", quit_reason);
            // Give a small delay for destructors to complete
            tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
            eprintln!("Cleanup complete, exiting...");
        }
        Transport::Sse => {
            eprintln!("Transport: SSE");
            eprintln!("Port: {}", cli.port);
            eprintln!("SSE path: {}", cli.sse_path);
            eprintln!("SSE POST path: {}", cli.sse_post_path);

            let bind_addr = format!("127.0.0.1:{}", cli.port);

            let ct = CancellationToken::new();
            let config = SseServerConfig {
                bind: bind_addr.parse()?,
                sse_path: cli.sse_path.clone(),
                post_path: cli.sse_post_path.clone(),
                ct: ct.clone(),
                sse_keep_alive: None,
            };

            let (mut sse_server, router) = SseServer::new(config);

            eprintln!(
                "Ready to accept MCP connections at http://{}{}",
                bind_addr, cli.sse_path
            );

            // One browser per connection; a connection whose browser cannot
            // start is dropped and the server keeps accepting
            tokio::spawn(async move {
                while let Some(transport) = sse_server.next_transport().await {
                    let service = match source.server() {
                        Ok(service) => service,
                        Err(e) => {
                            log::error!("Dropping SSE connection: {}", e);
                            continue;
                        }
                    };
                    let ct = ct.child_token();
                    tokio::spawn(async move {
                        match service.serve_with_ct(transport, ct).await {
                            Ok(server) => {
                                if let Err(e) = server.waiting().await {
                                    log::warn!("SSE session ended abnormally: {}", e);
                                }
                            }
                            Err(e) => log::warn!("SSE session failed to initialize: {}", e),
                        }
                    });
                }
            });

            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, router.into_make_service()).await?;
        }
        Transport::Http => {
            eprintln!("Transport: HTTP streamable");
            eprintln!("Port: {}", cli.port);
            eprintln!("HTTP path: {}", cli.http_path);

            let bind_addr = format!("127.0.0.1:{}", cli.port);

            let service_factory = move || source.server().map_err(std::io::Error::other);

            let http_service = StreamableHttpService::new(
                service_factory,
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new().nest_service(&cli.http_path, http_service);

            eprintln!(
                "Ready to accept MCP connections at http://{}{}",
                bind_addr, cli.http_path
            );

            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
