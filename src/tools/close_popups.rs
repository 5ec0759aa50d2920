use crate::dom::site::overlays;
use crate::dom::{Cascade, SCRIPT_FIRST, click_with_fallback};
use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the close_popups tool (no parameters needed)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ClosePopupsParams {}

/// Tool for dismissing modals and overlays
#[derive(Default)]
pub struct ClosePopupsTool;

impl Tool for ClosePopupsTool {
    type Params = ClosePopupsParams;

    fn name(&self) -> &str {
        "close_popups"
    }

    fn description(&self) -> &str {
        "Close any visible modal or pop-up on the page. \
         Does not work on cookie consent banners"
    }

    fn execute_typed(
        &self,
        _params: ClosePopupsParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let cascade = Cascade::new(context.page)
            .timeout(context.timings.overlay_wait())
            .poll_interval(context.timings.poll_interval());

        let mut dismissed = 0;
        let mut failed = 0;

        // Every selector is processed; one bad selector never stops the sweep
        for locator in overlays().iter() {
            let elements = match cascade.visible(locator) {
                Ok(elements) => elements,
                Err(e) => {
                    log::warn!("Error handling selector {}: {}", locator, e);
                    continue;
                }
            };

            for element in elements {
                match click_with_fallback(context.page, &element, SCRIPT_FIRST) {
                    Ok(_) => dismissed += 1,
                    Err(e) => {
                        log::warn!(
                            "Could not dismiss {} matched by {}: {}",
                            element,
                            locator,
                            e
                        );
                        failed += 1;
                    }
                }
            }
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "message": "Modals closed",
            "dismissed": dismissed,
            "failed": failed
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeNode, FakePage};
    use crate::dom::site::OVERLAY_SELECTORS;

    fn close_popups(page: &FakePage) -> ToolResult {
        let mut context = ToolContext::new(page);
        ClosePopupsTool
            .execute_typed(ClosePopupsParams::default(), &mut context)
            .unwrap()
    }

    #[test]
    fn test_dismisses_every_visible_match_with_script_click() {
        let page = FakePage::new("https://www.lazada.sg/");
        let first = page.add(FakeNode::new("div"));
        let hidden = page.add(FakeNode::new("div").hidden());
        let second = page.add(FakeNode::new("div"));
        page.bind("[class*='modal']", &[first, hidden, second]);

        let result = close_popups(&page);

        assert!(result.success);
        assert_eq!(result.status(), Some("Modals closed"));
        assert_eq!(result.data.unwrap()["dismissed"], 2);
        assert_eq!(
            page.events(),
            vec![
                format!("script_click:{}", first.0),
                format!("script_click:{}", second.0)
            ]
        );
    }

    #[test]
    fn test_falls_back_to_native_click() {
        let page = FakePage::new("https://www.lazada.sg/");
        let close = page.add(FakeNode::new("button").failing_script_click());
        page.bind(".modal-close", &[close]);

        close_popups(&page);

        assert_eq!(page.events(), vec![format!("click:{}", close.0)]);
    }

    #[test]
    fn test_processes_whole_table_despite_failures() {
        let page = FakePage::new("https://www.fairprice.com.sg/");
        page.reject("button[class*='close']");
        page.fail("[class*='modal']");
        let backdrop = page.add(FakeNode::new("div"));
        page.bind("[class*='overlay']", &[backdrop]);

        let result = close_popups(&page);

        assert!(result.success);
        assert_eq!(result.data.unwrap()["dismissed"], 1);
        for selector in OVERLAY_SELECTORS {
            assert!(
                page.queries().iter().any(|q| q == selector),
                "{selector} was skipped"
            );
        }
    }

    #[test]
    fn test_waits_are_bounded_per_selector() {
        let page = FakePage::new("https://example.com");

        close_popups(&page);

        // 500ms at 100ms polls: six queries per selector
        assert_eq!(page.queries().len(), OVERLAY_SELECTORS.len() * 6);
    }
}
