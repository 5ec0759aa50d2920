use crate::dom::{Cascade, wait_until};
use crate::error::{BrowserError, Result};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InputSearchParams {
    /// Text to type into the search box
    pub text: String,

    /// Press Enter after typing (default: true)
    #[serde(default = "default_submit")]
    pub submit: bool,
}

fn default_submit() -> bool {
    true
}

#[derive(Default)]
pub struct InputSearchTool;

impl Tool for InputSearchTool {
    type Params = InputSearchParams;

    fn name(&self) -> &str {
        "input_search"
    }

    fn description(&self) -> &str {
        "Type text into the site's search box and optionally submit the search"
    }

    fn execute_typed(
        &self,
        params: InputSearchParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let page = context.page;
        let timings = &context.timings;
        let cascade = Cascade::new(page)
            .timeout(timings.search_wait())
            .poll_interval(timings.poll_interval());

        let typed = cascade.try_act(&context.site()?.search_box(), |search_box| {
            let ready = wait_until(page, timings.search_wait(), timings.poll_interval(), || {
                Ok(page.is_clickable(search_box).unwrap_or(false))
            })?;
            if !ready {
                return Err(BrowserError::NotInteractable(format!(
                    "search box {} never became clickable",
                    search_box
                )));
            }

            page.clear(search_box)?;
            page.send_keys(search_box, &params.text)?;
            page.pause(timings.type_settle());

            if params.submit {
                page.press_key(search_box, "Enter")?;
                page.pause(timings.submit_settle());
            }
            Ok(())
        })?;

        match typed {
            Some(found) => Ok(ToolResult::success_with(serde_json::json!({
                "message": format!(
                    "Successfully input '{}' into search box using selector: {}",
                    params.text, found.locator.expression
                ),
                "selector": found.locator.expression,
                "submitted": params.submit
            }))),
            None => Ok(ToolResult::failure(
                "Failed to input search text: No search box found after trying all selectors",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Timings;
    use crate::browser::fake::{FakeNode, FakePage};
    use crate::tools::ToolRegistry;
    use std::time::Duration;

    fn params(text: &str, submit: bool) -> InputSearchParams {
        InputSearchParams {
            text: text.to_string(),
            submit,
        }
    }

    fn no_search_wait(page: &FakePage) -> ToolContext<'_> {
        ToolContext::new(page).with_timings(Timings {
            search_wait_ms: 0,
            ..Default::default()
        })
    }

    #[test]
    fn test_params_default_submit() {
        let json = serde_json::json!({ "text": "milo" });
        let params: InputSearchParams = serde_json::from_value(json).unwrap();
        assert!(params.submit);
    }

    #[test]
    fn test_types_and_submits_into_site_search_box() {
        let page = FakePage::new("https://www.fairprice.com.sg/");
        let input = page.add(FakeNode::new("input"));
        page.bind("#search-input-bar", &[input]);
        let mut context = ToolContext::new(&page);

        let result = InputSearchTool.execute_typed(params("milo", true), &mut context).unwrap();

        assert!(result.success);
        assert_eq!(
            result.status(),
            Some("Successfully input 'milo' into search box using selector: #search-input-bar")
        );
        assert_eq!(page.value_of(input).as_deref(), Some("milo"));
        assert_eq!(
            page.events(),
            vec![
                format!("clear:{}", input.0),
                format!("type:{}:milo", input.0),
                format!("key:{}:Enter", input.0)
            ]
        );
        assert_eq!(
            page.pauses(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
    }

    #[test]
    fn test_without_submit() {
        let page = FakePage::new("https://www.lazada.sg/");
        let input = page.add(FakeNode::new("input"));
        page.bind(".search-box__input", &[input]);
        let mut context = ToolContext::new(&page);

        let result = InputSearchTool
            .execute_typed(params("iphone 15", false), &mut context)
            .unwrap();

        assert!(result.success);
        let events = page.events();
        assert!(!events.iter().any(|e| e.starts_with("key:")));
    }

    #[test]
    fn test_unclickable_box_falls_through_to_generic_selector() {
        let page = FakePage::new("https://www.lazada.sg/");
        let disabled = page.add(FakeNode::new("input").unclickable());
        let generic = page.add(FakeNode::new("input"));
        page.bind(".search-box__input--O34g", &[disabled]);
        page.bind("[name='q']", &[generic]);
        let mut context = no_search_wait(&page);

        let result = InputSearchTool.execute_typed(params("tea", true), &mut context).unwrap();

        assert!(result.success);
        assert_eq!(result.data.unwrap()["selector"], "[name='q']");
        assert_eq!(page.value_of(disabled), None);
    }

    #[test]
    fn test_no_search_box() {
        let page = FakePage::new("https://shop.example.com");
        let mut context = no_search_wait(&page);
        let params = serde_json::json!({ "text": "tea" });

        let result = ToolRegistry::with_defaults()
            .execute("input_search", params, &mut context)
            .unwrap();

        assert!(!result.success);
        assert_eq!(
            result.status(),
            Some("Failed to input search text: No search box found after trying all selectors")
        );
        assert!(page.events().is_empty());
    }
}
