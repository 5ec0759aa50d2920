use crate::dom::{Cascade, Locator};
use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the find_text tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindTextParams {
    /// Literal text to search for
    pub text: String,

    /// Which occurrence to scroll to, starting at 1 (default: 1)
    #[serde(default = "default_nth")]
    pub nth_result: usize,
}

fn default_nth() -> usize {
    1
}

/// Tool for jumping to the nth occurrence of some text, like Ctrl+F
#[derive(Default)]
pub struct FindTextTool;

impl Tool for FindTextTool {
    type Params = FindTextParams;

    fn name(&self) -> &str {
        "find_text"
    }

    fn description(&self) -> &str {
        "Search the page for text and scroll the nth occurrence into view"
    }

    fn execute_typed(
        &self,
        params: FindTextParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let matches = Cascade::new(context.page).present(&Locator::text(&params.text))?;
        let count = matches.len();

        let Some(element) = params.nth_result.checked_sub(1).and_then(|i| matches.get(i)) else {
            return Ok(ToolResult::failure(format!(
                "Match n°{} not found (only {} matches found)",
                params.nth_result, count
            )));
        };

        if let Err(e) = context.page.scroll_into_view(element, 0) {
            if !e.is_recoverable() {
                return Err(e);
            }
            return Ok(ToolResult::failure(format!(
                "Match n°{} of '{}' could not be scrolled into view: {}",
                params.nth_result, params.text, e
            )));
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!(
                "Found {} matches for '{}'. Focused on element {} of {}",
                count, params.text, params.nth_result, count
            ),
            "matches": count,
            "focused": params.nth_result
        })))
    }
}
