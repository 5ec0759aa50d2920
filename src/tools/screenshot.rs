use crate::error::{BrowserError, Result};
use crate::tools::{Tool, ToolContext, ToolResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::GenericImageView;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the screenshot tool (no parameters needed)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScreenshotParams {}

/// Tool for capturing the viewport as a PNG
#[derive(Default)]
pub struct ScreenshotTool;

impl Tool for ScreenshotTool {
    type Params = ScreenshotParams;

    fn name(&self) -> &str {
        "screenshot"
    }

    fn description(&self) -> &str {
        "Capture the visible part of the current page as a PNG"
    }

    fn execute_typed(
        &self,
        _params: ScreenshotParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let png = context.page.screenshot()?;

        let (width, height) = image::load_from_memory(&png)
            .map(|img| img.dimensions())
            .map_err(|e| {
                let reason = format!("capture is not a readable image: {}", e);
                BrowserError::ScreenshotFailed(reason)
            })?;

        let url = context.page.current_url()?;

        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!("Captured {}x{} screenshot of {}", width, height, url),
            "image": STANDARD.encode(&png),
            "mime_type": "image/png",
            "width": width,
            "height": height,
            "url": url
        })))
    }
}
