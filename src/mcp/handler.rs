use crate::browser::{BrowserSession, LaunchOptions};
use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool_handler,
};
use std::sync::{Arc, Mutex, MutexGuard};

const INSTRUCTIONS: &str = "Price comparison across FairPrice and Lazada. For each store: \
browser_navigate to the storefront, browser_handle_recaptcha, browser_close_popups, \
browser_input_search with the product name, browser_handle_recaptcha and \
browser_close_popups again, browser_click_product, then browser_get_product_details. \
Pass both JSON results to combine_answer.";

/// MCP server owning one browser session.
///
/// Tool calls are serialized through the session lock; a page has a single
/// document and frame context and cannot be driven concurrently.
#[derive(Clone)]
pub struct BrowserServer {
    session: Arc<Mutex<BrowserSession>>,
    pub(crate) tool_router: ToolRouter<Self>,
}

impl BrowserServer {
    /// Launch a headless browser with default options
    pub fn new() -> Result<Self, String> {
        Self::with_options(LaunchOptions::default())
    }

    /// Launch a browser with the given options
    pub fn with_options(options: LaunchOptions) -> Result<Self, String> {
        let session = BrowserSession::launch(options)
            .map_err(|e| format!("Failed to launch browser: {}", e))?;
        Ok(Self::with_session(session))
    }

    /// Serve an existing session
    pub fn with_session(session: BrowserSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    pub(crate) fn session(&self) -> MutexGuard<'_, BrowserSession> {
        // A tool that panicked mid-call still leaves a usable browser behind
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[tool_handler]
impl ServerHandler for BrowserServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}
