use crate::browser::config::{ConnectionOptions, LaunchOptions, Timings};
use crate::browser::driver::{ElementHandle, PageDriver};
use crate::dom::Locator;
use crate::error::{BrowserError, Result};
use crate::tools::{ToolContext, ToolRegistry, ToolResult};
use headless_chrome::browser::tab::point::Point;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::protocol::cdp::Runtime::ExecutionContextId;
use headless_chrome::protocol::cdp::{DOM, Page, Runtime};
use headless_chrome::{Browser, Tab};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::{ffi::OsStr, sync::Arc, sync::Mutex, time::Duration};

/// Page-side half of the driver. Elements are tagged with `data-pc-handle`
/// so that a handle stays valid across evaluations.
const PAGE_OPS_JS: &str = include_str!("page_ops.js");

/// Name of the isolated world created inside every entered frame
const FRAME_WORLD: &str = "price-compare";

/// Feature switches headless_chrome passes by default
const DEFAULT_DISABLED_FEATURES: &str = "--disable-features=TranslateUI,BlinkGenPropertyTrees";

/// The defaults plus the switches that give cross-site frames their own renderer
const DISABLED_FEATURES: &str =
    "--disable-features=TranslateUI,BlinkGenPropertyTrees,IsolateOrigins,site-per-process";

/// Reply envelope produced by the page-side script
#[derive(Debug, Deserialize)]
struct OpReply {
    #[serde(default)]
    ok: Value,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Offset {
    x: f64,
    y: f64,
}

/// An entered frame: its element handle in the parent context and the
/// execution context that runs inside its document
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameContext {
    handle: u64,
    context_id: ExecutionContextId,
}

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tool registry for executing browser automation tools
    tool_registry: ToolRegistry,

    /// Timings handed to tools run through this session
    timings: Timings,

    /// Frames entered, outermost first
    frames: Mutex<Vec<FrameContext>>,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Storefronts serve a challenge page to obviously automated browsers
        launch_opts
            .ignore_default_args
            .push(OsStr::new("--enable-automation"));
        launch_opts
            .args
            .push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.push(OsStr::new("--disable-popup-blocking"));
        launch_opts.args.push(OsStr::new("--force-device-scale-factor=1"));

        // Cross-site frames (the reCAPTCHA widget) must stay in the page's
        // renderer to be reachable from the page's DevTools session
        launch_opts
            .ignore_default_args
            .push(OsStr::new(DEFAULT_DISABLED_FEATURES));
        launch_opts.args.push(OsStr::new(DISABLED_FEATURES));
        launch_opts
            .args
            .push(OsStr::new("--disable-site-isolation-trials"));

        // A two-site comparison runs for minutes; the default idle timeout is 30 seconds
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser =
            Browser::new(launch_opts).map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        browser.new_tab().map_err(|e| {
            BrowserError::LaunchFailed(format!("Failed to create tab: {}", e))
        })?;

        Ok(Self::from_browser(browser, options.timings))
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let idle_timeout = Duration::from_millis(options.timeout);
        let browser = Browser::connect_with_timeout(options.ws_url, idle_timeout)
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        Ok(Self::from_browser(browser, options.timings))
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    fn from_browser(browser: Browser, timings: Timings) -> Self {
        Self {
            browser,
            tool_registry: ToolRegistry::with_defaults(),
            timings,
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| {
                BrowserError::TabOperationFailed(format!("Failed to get tabs: {}", e))
            })?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // First pass: visible and focused; second pass: visible only
        let queries = [
            "document.visibilityState === 'visible' && document.hasFocus()",
            "document.visibilityState === 'visible'",
        ];
        for query in queries {
            for tab in &tabs {
                match tab.evaluate(query, false) {
                    Ok(remote_object) => {
                        if remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                    Err(e) => log::debug!("Failed to check tab status: {}", e),
                }
            }
        }

        // Headless tabs never report focus; fall back to the first one
        tabs.into_iter()
            .next()
            .ok_or_else(|| {
                BrowserError::TabOperationFailed("No active tab found".to_string())
            })
    }

    /// Timings used by tools run through this session
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| {
                BrowserError::NavigationFailed(format!("Navigation timeout: {}", e))
            })?;

        Ok(())
    }

    /// Get the tool registry
    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    /// Execute a tool by name
    pub fn execute_tool(&self, name: &str, params: Value) -> Result<ToolResult> {
        let mut context = ToolContext::new(self).with_timings(self.timings.clone());
        self.tool_registry.execute(name, params, &mut context)
    }

    /// Close the browser
    pub fn close(&self) -> Result<()> {
        // headless_chrome closes the process when the Browser is dropped;
        // closing every tab shuts the session down early
        for tab in self.get_tabs()? {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab {}: {}", tab.get_target_id(), e);
            }
        }
        Ok(())
    }

    fn frame_stack(&self) -> std::sync::MutexGuard<'_, Vec<FrameContext>> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Execution context of the innermost entered frame; `None` is the page itself
    fn current_context(&self) -> Option<ExecutionContextId> {
        self.frame_stack().last().map(|frame| frame.context_id)
    }

    /// Evaluate `expression` in `context_id`, or in the page's main world
    fn evaluate_in(
        &self,
        context_id: Option<ExecutionContextId>,
        expression: String,
        by_value: bool,
    ) -> Result<Runtime::RemoteObject> {
        let reply = self
            .tab()?
            .call_method(Runtime::Evaluate {
                expression,
                return_by_value: Some(by_value),
                generate_preview: Some(false),
                silent: Some(true),
                await_promise: Some(false),
                include_command_line_api: Some(false),
                user_gesture: Some(false),
                object_group: None,
                context_id,
                throw_on_side_effect: None,
                timeout: None,
                disable_breaks: None,
                repl_mode: None,
                allow_unsafe_eval_blocked_by_csp: None,
                unique_context_id: None,
                serialization_options: None,
            })
            .map_err(|e| match context_id {
                // The frame navigated or was removed since it was entered
                Some(id) => BrowserError::FrameFailed(format!("frame context {}: {}", id, e)),
                None => BrowserError::EvaluationFailed(e.to_string()),
            })?;

        if let Some(details) = reply.exception_details {
            return Err(BrowserError::EvaluationFailed(details.text));
        }
        Ok(reply.result)
    }

    fn page_ops_script(op: &str, args: &Value) -> String {
        format!("({})({}, {})", PAGE_OPS_JS.trim(), json!(op), args)
    }

    /// Run one page-side operation in `context_id`
    fn call_in<T: DeserializeOwned>(
        &self,
        context_id: Option<ExecutionContextId>,
        op: &str,
        args: Value,
    ) -> Result<T> {
        let result = self.evaluate_in(context_id, Self::page_ops_script(op, &args), true)?;

        let raw = result
            .value
            .and_then(|v| v.as_str().map(str::to_owned))
            .ok_or_else(|| {
                BrowserError::EvaluationFailed(format!("{}: no value returned", op))
            })?;

        parse_reply(op, &raw)
    }

    /// Run one page-side operation in the current frame context
    fn call<T: DeserializeOwned>(&self, op: &str, args: Value) -> Result<T> {
        self.call_in(self.current_context(), op, args)
    }

    fn handles(ids: Vec<u64>) -> Vec<ElementHandle> {
        ids.into_iter().map(ElementHandle).collect()
    }

    fn focus(&self, element: &ElementHandle) -> Result<()> {
        self.call::<bool>("focus", json!({ "handle": element.0 }))?;
        Ok(())
    }

    /// Position of the current frame's viewport within the page's viewport
    fn frame_offset(&self) -> Result<(f64, f64)> {
        let frames = self.frame_stack().clone();
        let mut parent = None;
        let (mut x, mut y) = (0.0, 0.0);

        for frame in frames {
            let offset: Offset =
                self.call_in(parent, "frameOffset", json!({ "handle": frame.handle }))?;
            x += offset.x;
            y += offset.y;
            parent = Some(frame.context_id);
        }
        Ok((x, y))
    }

    /// DevTools frame id of the frame owned by `frame`, looked up in `parent`
    fn frame_id(
        &self,
        parent: Option<ExecutionContextId>,
        frame: &ElementHandle,
    ) -> Result<String> {
        let args = json!({ "handle": frame.0, "raw": true });
        let script = Self::page_ops_script("frameElement", &args);
        let element = self.evaluate_in(parent, script, false)?;

        let Some(object_id) = element.object_id else {
            // The lookup failed and the script answered with an error envelope
            let raw = element
                .value
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default();
            return Err(match parse_reply::<Value>("frameElement", &raw) {
                Err(e) => e,
                Ok(_) => BrowserError::StaleElement(format!("frame {} has no element", frame)),
            });
        };

        let node = self
            .tab()?
            .call_method(DOM::DescribeNode {
                node_id: None,
                backend_node_id: None,
                object_id: Some(object_id),
                depth: Some(0),
                pierce: Some(false),
            })
            .map_err(|e| {
                BrowserError::FrameFailed(format!("describing {}: {}", frame, e))
            })?
            .node;

        node.frame_id.ok_or_else(|| {
            BrowserError::FrameFailed(format!("{} has no frame document", frame))
        })
    }
}

/// Decode the page-side reply envelope, mapping error kinds onto [`BrowserError`]
fn parse_reply<T: DeserializeOwned>(op: &str, raw: &str) -> Result<T> {
    let reply: OpReply = serde_json::from_str(raw).map_err(|e| {
        BrowserError::EvaluationFailed(format!("{}: malformed reply: {}", op, e))
    })?;

    if let Some(kind) = reply.error {
        let message = reply.message.unwrap_or_default();
        return Err(match kind.as_str() {
            "locator" => BrowserError::InvalidLocator(message),
            "stale" => BrowserError::StaleElement(message),
            "interactable" => BrowserError::NotInteractable(message),
            "frame" => BrowserError::FrameFailed(message),
            _ => BrowserError::EvaluationFailed(format!("{}: {}", op, message)),
        });
    }

    serde_json::from_value(reply.ok).map_err(|e| {
        BrowserError::EvaluationFailed(format!("{}: unexpected reply: {}", op, e))
    })
}

impl PageDriver for BrowserSession {
    fn current_url(&self) -> Result<String> {
        Ok(self.tab()?.get_url())
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.frame_stack().clear();
        self.tab()?.navigate_to(url).map_err(|e| {
            BrowserError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e))
        })?;

        self.wait_for_navigation()
    }

    fn go_back(&self) -> Result<()> {
        let go_back_js = r#"
            (function() {
                window.history.back();
                return true;
            })()
        "#;

        self.frame_stack().clear();
        self.tab()?
            .evaluate(go_back_js, false)
            .map_err(|e| {
                BrowserError::NavigationFailed(format!("Failed to go back: {}", e))
            })?;

        // Wait a moment for navigation
        std::thread::sleep(Duration::from_millis(300));

        Ok(())
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let args = json!({
            "strategy": locator.query_strategy().as_str(),
            "expression": locator.query_expression(),
        });
        self.call::<Vec<u64>>("find", args).map(Self::handles)
    }

    fn find_within(&self, scope: &ElementHandle, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let args = json!({
            "handle": scope.0,
            "strategy": locator.query_strategy().as_str(),
            "expression": locator.query_expression(),
        });
        self.call::<Vec<u64>>("findWithin", args).map(Self::handles)
    }

    fn parent(&self, element: &ElementHandle) -> Result<Option<ElementHandle>> {
        let parent: Option<u64> = self.call("parent", json!({ "handle": element.0 }))?;
        Ok(parent.map(ElementHandle))
    }

    fn tag_name(&self, element: &ElementHandle) -> Result<String> {
        self.call("tag", json!({ "handle": element.0 }))
    }

    fn text(&self, element: &ElementHandle) -> Result<String> {
        self.call("text", json!({ "handle": element.0 }))
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        self.call("attribute", json!({ "handle": element.0, "name": name }))
    }

    fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        self.call("displayed", json!({ "handle": element.0 }))
    }

    fn is_clickable(&self, element: &ElementHandle) -> Result<bool> {
        self.call("clickable", json!({ "handle": element.0 }))
    }

    fn click(&self, element: &ElementHandle) -> Result<()> {
        self.call::<bool>("scrollIntoView", json!({ "handle": element.0, "offset": 0 }))?;
        let center: Offset = self.call("center", json!({ "handle": element.0 }))?;
        let (dx, dy) = self.frame_offset()?;

        self.tab()?
            .click_point(Point {
                x: center.x + dx,
                y: center.y + dy,
            })
            .map_err(|e| {
                BrowserError::NotInteractable(format!("click on {} failed: {}", element, e))
            })?;
        Ok(())
    }

    fn script_click(&self, element: &ElementHandle) -> Result<()> {
        self.call::<bool>("scriptClick", json!({ "handle": element.0 }))?;
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> Result<()> {
        self.call::<bool>("clear", json!({ "handle": element.0 }))?;
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()> {
        self.focus(element)?;
        self.tab()?.type_str(text).map_err(|e| {
            BrowserError::NotInteractable(format!("typing into {} failed: {}", element, e))
        })?;
        Ok(())
    }

    fn press_key(&self, element: &ElementHandle, key: &str) -> Result<()> {
        self.focus(element)?;
        self.tab()?.press_key(key).map_err(|e| {
            BrowserError::NotInteractable(format!("pressing {} on {} failed: {}", key, element, e))
        })?;
        Ok(())
    }

    fn scroll_into_view(&self, element: &ElementHandle, offset_y: i64) -> Result<()> {
        let args = json!({ "handle": element.0, "offset": offset_y });
        self.call::<bool>("scrollIntoView", args)?;
        Ok(())
    }

    fn enter_frame(&self, frame: &ElementHandle) -> Result<()> {
        let parent = self.current_context();

        let is_frame: bool = self.call_in(parent, "isFrame", json!({ "handle": frame.0 }))?;
        if !is_frame {
            let message = format!("element {} is not a frame", frame);
            return Err(BrowserError::FrameFailed(message));
        }

        // Cross-origin documents are out of reach of the parent's script, so
        // the frame gets an execution context of its own
        let frame_id = self.frame_id(parent, frame)?;
        let world = self
            .tab()?
            .call_method(Page::CreateIsolatedWorld {
                frame_id,
                world_name: Some(FRAME_WORLD.to_string()),
                grant_univeral_access: Some(true),
            })
            .map_err(|e| {
                BrowserError::FrameFailed(format!("cannot reach the document of {}: {}", frame, e))
            })?;

        self.frame_stack().push(FrameContext {
            handle: frame.0,
            context_id: world.execution_context_id,
        });
        if let Err(e) = self.call::<bool>("ping", json!({})) {
            self.frame_stack().pop();
            return Err(e);
        }
        Ok(())
    }

    fn exit_frame(&self) -> Result<()> {
        self.frame_stack().pop();
        Ok(())
    }

    fn frame_depth(&self) -> usize {
        self.frame_stack().len()
    }

    fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab()?
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))
    }
}
