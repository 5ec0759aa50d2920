//! MCP (Model Context Protocol) server for agent-driven price comparison
//!
//! This module exposes every registered tool over rmcp by forwarding calls to
//! the session's tool registry.

pub mod handler;
pub use handler::BrowserServer;

use crate::error::BrowserError;
use crate::tools::{
    ClickProductParams, CombineAnswerParams, FindTextParams, InputSearchParams, NavigateParams,
    ToolResult as InternalToolResult,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    tool, tool_router,
};
use serde::Serialize;
use serde_json::Value;

/// Convert internal ToolResult to MCP CallToolResult
fn convert_result(result: InternalToolResult) -> Result<CallToolResult, McpError> {
    let payload = result
        .data
        .map(|data| serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()));

    if result.success {
        let text = payload.unwrap_or_else(|| "Success".to_string());
        Ok(CallToolResult::success(vec![Content::text(text)]))
    } else {
        // Expected failures go back to the agent as tool output, not protocol errors
        let error = result.error.unwrap_or_else(|| "Unknown error".to_string());
        let mut content = vec![Content::text(error)];
        content.extend(payload.map(Content::text));
        Ok(CallToolResult::error(content))
    }
}

fn convert_error(error: BrowserError) -> McpError {
    match error {
        BrowserError::InvalidParameters(_)
        | BrowserError::UnknownTool(_)
        | BrowserError::InvalidLocator(_) => McpError::invalid_params(error.to_string(), None),
        _ => McpError::internal_error(error.to_string(), None),
    }
}

impl BrowserServer {
    fn run_tool(
        &self,
        name: &str,
        params: impl Serialize,
    ) -> Result<InternalToolResult, McpError> {
        let params = serde_json::to_value(params)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        self.session()
            .execute_tool(name, params)
            .map_err(convert_error)
    }

    fn call(&self, name: &str, params: impl Serialize) -> Result<CallToolResult, McpError> {
        convert_result(self.run_tool(name, params)?)
    }
}

#[tool_router]
impl BrowserServer {
    /// Navigate to a URL
    #[tool(description = "Navigate to a specified URL in the browser")]
    fn browser_navigate(
        &self,
        params: Parameters<NavigateParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("navigate", params.0)
    }

    /// Go back in history
    #[tool(description = "Go back to the previous page")]
    fn browser_go_back(&self) -> Result<CallToolResult, McpError> {
        self.call("go_back", Value::Null)
    }

    #[tool(description = "Close any visible modal or pop-up on the page. \
                          Does not work on cookie consent banners")]
    fn browser_close_popups(&self) -> Result<CallToolResult, McpError> {
        self.call("close_popups", Value::Null)
    }

    #[tool(description = "Type text into the site's search box and optionally submit the search")]
    fn browser_input_search(
        &self,
        params: Parameters<InputSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("input_search", params.0)
    }

    #[tool(description = "Click the top search result matching a product name")]
    fn browser_click_product(
        &self,
        params: Parameters<ClickProductParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("click_product", params.0)
    }

    /// Ctrl+F equivalent
    #[tool(description = "Search the page for text and scroll the nth occurrence into view")]
    fn browser_find_text(
        &self,
        params: Parameters<FindTextParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("find_text", params.0)
    }

    #[tool(description = "Extract product name, current price, original price and promotion \
                          from the current product page as JSON")]
    fn browser_get_product_details(&self) -> Result<CallToolResult, McpError> {
        self.call("get_product_details", Value::Null)
    }

    #[tool(description = "Find an embedded reCAPTCHA and click its checkbox if one is shown")]
    fn browser_handle_recaptcha(&self) -> Result<CallToolResult, McpError> {
        self.call("handle_recaptcha", Value::Null)
    }

    /// Take a screenshot of the page
    #[tool(description = "Take a screenshot of the current page")]
    fn browser_screenshot(&self) -> Result<CallToolResult, McpError> {
        let result = self.run_tool("screenshot", Value::Null)?;
        let Some(data) = result.data.as_ref().filter(|_| result.success) else {
            return convert_result(result);
        };

        let image = data["image"].as_str().unwrap_or_default().to_string();
        let summary = data["message"]
            .as_str()
            .unwrap_or("Screenshot captured")
            .to_string();
        Ok(CallToolResult::success(vec![
            Content::image(image, "image/png"),
            Content::text(summary),
        ]))
    }

    /// Merge the per-store results
    #[tool(description = "Combine the FairPrice and Lazada product details into the final \
                          comparison; missing results become placeholders")]
    fn combine_answer(
        &self,
        params: Parameters<CombineAnswerParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("combine_answer", params.0)
    }
}
