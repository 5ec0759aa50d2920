use crate::browser::{ElementHandle, PageDriver, Timings};
use crate::dom::site::{challenge_checkboxes, challenge_frames};
use crate::dom::{Cascade, Locator, LocatorSpec, NATIVE_FIRST, click_with_fallback, wait_until};
use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Progress through one verification challenge.
///
/// Every entered frame is followed by `Restored`, whatever happened inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    Idle,
    FrameEntered,
    Clicked,
    Verified,
    Restored,
}

/// Parameters for the handle_recaptcha tool (no parameters needed)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HandleRecaptchaParams {}

/// Tool for ticking an embedded reCAPTCHA checkbox
#[derive(Default)]
pub struct HandleRecaptchaTool;

impl Tool for HandleRecaptchaTool {
    type Params = HandleRecaptchaParams;

    fn name(&self) -> &str {
        "handle_recaptcha"
    }

    fn description(&self) -> &str {
        "Find an embedded reCAPTCHA and click its checkbox if one is shown"
    }

    fn execute_typed(
        &self,
        _params: HandleRecaptchaParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let page = context.page;
        let timings = &context.timings;
        let cascade = Cascade::new(page);
        let frames = challenge_frames();

        let mut trace = vec![ChallengeState::Idle];
        if !any_present(&cascade, &frames)? {
            return Ok(ToolResult::success_with(serde_json::json!({
                "message": "No reCAPTCHA found",
                "states": trace
            })));
        }

        let verified = cascade.try_in_frames(&frames, |scope| {
            trace.push(ChallengeState::FrameEntered);
            let outcome = tick_checkbox(scope.page(), timings, &mut trace);
            scope.exit();
            trace.push(ChallengeState::Restored);
            Ok(outcome?.then_some(()))
        })?;

        if verified.is_some() {
            return Ok(ToolResult::success_with(serde_json::json!({
                "message": "Successfully clicked reCAPTCHA checkbox",
                "states": trace
            })));
        }

        Ok(ToolResult::failure_with(
            "Could not click reCAPTCHA checkbox",
            serde_json::json!({ "states": trace }),
        ))
    }
}

fn any_present(cascade: &Cascade<'_>, frames: &LocatorSpec) -> Result<bool> {
    for locator in frames.iter() {
        if !cascade.present(locator)?.is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Click checkbox candidates inside the current frame until one reports checked
fn tick_checkbox(
    page: &dyn PageDriver,
    timings: &Timings,
    trace: &mut Vec<ChallengeState>,
) -> Result<bool> {
    for locator in challenge_checkboxes().iter() {
        let Some(checkbox) = wait_for_clickable(page, locator, timings)? else {
            continue;
        };

        if let Err(e) = click_with_fallback(page, &checkbox, NATIVE_FIRST) {
            if !e.is_recoverable() {
                return Err(e);
            }
            log::debug!(
                "Checkbox {} via {} rejected the click: {}",
                checkbox,
                locator,
                e
            );
            continue;
        }
        trace.push(ChallengeState::Clicked);

        page.pause(timings.challenge_settle());

        match page.attribute(&checkbox, "aria-checked") {
            Ok(checked) if checked.as_deref() == Some("true") => {
                trace.push(ChallengeState::Verified);
                return Ok(true);
            }
            Ok(_) => {}
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) => log::debug!(
                "Checkbox {} via {} is unreadable: {}",
                checkbox,
                locator,
                e
            ),
        }
    }
    Ok(false)
}

fn wait_for_clickable(
    page: &dyn PageDriver,
    locator: &Locator,
    timings: &Timings,
) -> Result<Option<ElementHandle>> {
    let mut target = None;

    wait_until(page, timings.challenge_wait(), timings.poll_interval(), || {
        match page.find_all(locator) {
            Ok(elements) => {
                target = elements
                    .into_iter()
                    .find(|e| page.is_clickable(e).unwrap_or(false));
                Ok(target.is_some())
            }
            Err(e) if !e.is_recoverable() => Err(e),
            Err(e) => {
                log::debug!("{} failed: {}", locator, e);
                Ok(false)
            }
        }
    })?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::ChallengeState::*;
    use super::*;
    use crate::browser::fake::{FakeNode, FakePage};
    use crate::error::BrowserError;

    const FRAMES: &str = "iframe[title*='reCAPTCHA']";

    fn run(page: &FakePage) -> Result<ToolResult> {
        let timings = Timings {
            challenge_wait_ms: 0,
            ..Default::default()
        };
        let mut context = ToolContext::new(page).with_timings(timings);
        HandleRecaptchaTool.execute_typed(HandleRecaptchaParams::default(), &mut context)
    }

    const CLICKED: &str = "Successfully clicked reCAPTCHA checkbox";

    fn states(result: &ToolResult) -> Vec<ChallengeState> {
        let data = result.data.as_ref().unwrap();
        serde_json::from_value(data["states"].clone()).unwrap()
    }

    #[test]
    fn test_no_challenge() {
        let page = FakePage::new("https://www.lazada.sg/");

        let result = run(&page).unwrap();

        assert!(result.success);
        assert_eq!(result.status(), Some("No reCAPTCHA found"));
        assert_eq!(page.frame_depth(), 0);
    }

    #[test]
    fn test_checkbox_verified() {
        let page = FakePage::new("https://www.lazada.sg/");
        let frame = page.add(FakeNode::new("iframe"));
        let checkbox = page.add(FakeNode::new("span").checks_on_click());
        page.bind(FRAMES, &[frame]);
        page.bind_in_frame(frame, "#recaptcha-anchor", &[checkbox]);

        let result = run(&page).unwrap();

        assert_eq!(result.status(), Some(CLICKED));
        assert_eq!(
            states(&result),
            vec![Idle, FrameEntered, Clicked, Verified, Restored]
        );
        assert_eq!(page.frame_depth(), 0);
        assert_eq!(page.pauses(), vec![Timings::default().challenge_settle()]);
    }

    #[test]
    fn test_unchecked_click_moves_to_next_frame() {
        let page = FakePage::new("https://www.lazada.sg/");
        let decoy = page.add(FakeNode::new("iframe"));
        let real = page.add(FakeNode::new("iframe"));
        let stubborn = page.add(FakeNode::new("div"));
        let checkbox = page.add(
            FakeNode::new("span")
                .failing_click()
                .checks_on_click(),
        );
        page.bind(FRAMES, &[decoy, real]);
        page.bind_in_frame(decoy, "[role='checkbox']", &[stubborn]);
        page.bind_in_frame(real, ".recaptcha-checkbox", &[checkbox]);

        let result = run(&page).unwrap();

        assert!(result.success);
        assert_eq!(
            states(&result),
            vec![
                Idle,
                FrameEntered,
                Clicked,
                Restored,
                FrameEntered,
                Clicked,
                Verified,
                Restored
            ]
        );
        let script_click = format!("script_click:{}", checkbox.0);
        assert!(page.events().contains(&script_click));
    }

    #[test]
    fn test_nothing_clickable() {
        let page = FakePage::new("https://www.fairprice.com.sg/");
        let frame = page.add(FakeNode::new("iframe"));
        let hidden = page.add(FakeNode::new("span").hidden());
        page.bind(FRAMES, &[frame]);
        page.bind_in_frame(frame, ".recaptcha-checkbox-border", &[hidden]);

        let result = run(&page).unwrap();

        assert!(!result.success);
        assert_eq!(result.status(), Some("Could not click reCAPTCHA checkbox"));
        assert_eq!(states(&result), vec![Idle, FrameEntered, Restored]);
        assert_eq!(page.frame_depth(), 0);
    }

    #[test]
    fn test_frame_restored_when_error_escapes() {
        let page = FakePage::new("https://www.fairprice.com.sg/");
        let frame = page.add(FakeNode::new("iframe"));
        page.bind(FRAMES, &[frame]);
        page.reject(".recaptcha-checkbox-border");

        let result = run(&page);

        assert!(matches!(result, Err(BrowserError::InvalidLocator(_))));
        assert_eq!(page.frame_depth(), 0);
        let last = page.events().pop();
        assert_eq!(last.as_deref(), Some("exit_frame"));
    }

    #[test]
    fn test_non_frame_match_is_skipped() {
        let page = FakePage::new("https://www.fairprice.com.sg/");
        let div = page.add(FakeNode::new("div"));
        page.bind(FRAMES, &[div]);

        let result = run(&page).unwrap();

        assert_eq!(states(&result), vec![Idle]);
        assert_eq!(page.frame_depth(), 0);
    }

    #[test]
    fn test_detached_checkbox_falls_through_to_anchor() {
        let page = FakePage::new("https://www.lazada.sg/");
        let frame = page.add(FakeNode::new("iframe"));
        let replaced = page.add(FakeNode::new("div").detaches_on_click());
        let anchor = page.add(FakeNode::new("span").checks_on_click());
        page.bind(FRAMES, &[frame]);
        page.bind_in_frame(frame, ".recaptcha-checkbox-border", &[replaced]);
        page.bind_in_frame(frame, "#recaptcha-anchor", &[anchor]);

        let result = run(&page).unwrap();

        assert_eq!(result.status(), Some(CLICKED));
        assert_eq!(
            states(&result),
            vec![Idle, FrameEntered, Clicked, Clicked, Verified, Restored]
        );
        assert_eq!(page.frame_depth(), 0);
    }
}
