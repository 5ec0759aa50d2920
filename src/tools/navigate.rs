use crate::error::Result;
use crate::tools::utils::normalize_url;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the navigate tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// URL to navigate to
    pub url: String,

    /// Let client-side rendering settle after the load (default: true)
    #[serde(default = "default_wait")]
    pub wait_for_load: bool,
}

fn default_wait() -> bool {
    true
}

/// Tool for navigating to a URL
#[derive(Default)]
pub struct NavigateTool;

impl Tool for NavigateTool {
    type Params = NavigateParams;

    fn name(&self) -> &str {
        "navigate"
    }

    fn description(&self) -> &str {
        "Navigate to a URL; bare domains and names get a scheme added"
    }

    fn execute_typed(
        &self,
        params: NavigateParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let normalized_url = normalize_url(&params.url);

        if let Err(e) = context.page.navigate(&normalized_url) {
            if !e.is_recoverable() {
                return Err(e);
            }
            return Ok(ToolResult::failure(format!(
                "Failed to navigate to {}: {}",
                normalized_url, e
            )));
        }

        if params.wait_for_load {
            context.page.pause(context.timings.page_settle());
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!("Navigated to {}", normalized_url),
            "original_url": params.url,
            "normalized_url": normalized_url,
            "waited": params.wait_for_load
        })))
    }
}

/// Parameters for the go_back tool (no parameters needed)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GoBackParams {}

/// Tool for going back one entry in history
#[derive(Default)]
pub struct GoBackTool;

impl Tool for GoBackTool {
    type Params = GoBackParams;

    fn name(&self) -> &str {
        "go_back"
    }

    fn description(&self) -> &str {
        "Go back to the previous page in history"
    }

    fn execute_typed(
        &self,
        _params: GoBackParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let page = context.page;
        let url = page.go_back().and_then(|()| {
            page.pause(context.timings.scroll_settle());
            page.current_url()
        });

        let url = match url {
            Ok(url) => url,
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) => return Ok(ToolResult::failure(format!("Failed to go back: {}", e))),
        };
        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!("Navigated back to {}", url),
            "url": url
        })))
    }
}
