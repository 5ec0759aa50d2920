//! Operations exposed to the orchestrator
//!
//! Every operation is a [`Tool`] with typed, schema-described parameters. Tools
//! run against a [`ToolContext`] borrowing the page and report through a
//! [`ToolResult`]: an expected failure (nothing found, element rejected the
//! click) is a result with `success == false`, while `Err` is kept for bad
//! parameters, malformed locators and a broken browser connection.

pub mod click_product;
pub mod close_popups;
pub mod combine;
pub mod find_text;
pub mod input_search;
pub mod navigate;
pub mod product_details;
pub mod recaptcha;
pub mod screenshot;
pub mod utils;

pub use click_product::{ClickProductParams, ClickProductTool};
pub use close_popups::{ClosePopupsParams, ClosePopupsTool};
pub use combine::{CombineAnswerParams, CombineAnswerTool};
pub use find_text::{FindTextParams, FindTextTool};
pub use input_search::{InputSearchParams, InputSearchTool};
pub use navigate::{GoBackParams, GoBackTool, NavigateParams, NavigateTool};
pub use product_details::{
    ProductDetailsParams, ProductDetailsTool, extract_product_details,
};
pub use recaptcha::{ChallengeState, HandleRecaptchaParams, HandleRecaptchaTool};
pub use screenshot::{ScreenshotParams, ScreenshotTool};

use crate::browser::{PageDriver, Timings};
use crate::dom::SiteProfile;
use crate::error::{BrowserError, Result};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// State shared with a tool for the duration of one call
pub struct ToolContext<'a> {
    /// Page the tool operates on
    pub page: &'a dyn PageDriver,

    /// Waits and settle delays
    pub timings: Timings,
}

impl<'a> ToolContext<'a> {
    pub fn new(page: &'a dyn PageDriver) -> Self {
        Self {
            page,
            timings: Timings::default(),
        }
    }

    /// Builder method: override the timings
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Site profile of the page currently loaded
    pub fn site(&self) -> Result<SiteProfile> {
        Ok(SiteProfile::from_url(&self.page.current_url()?))
    }
}

/// Outcome of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Success without a payload
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Success carrying a JSON payload
    pub fn success_with(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Success described by a status message
    pub fn message(message: impl Into<String>) -> Self {
        Self::success_with(json!({ "message": message.into() }))
    }

    /// Expected failure with a human-readable reason
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Expected failure that still carries a payload
    pub fn failure_with(error: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
        }
    }

    /// Status line: the failure reason, or the payload's `message` field
    pub fn status(&self) -> Option<&str> {
        if let Some(error) = &self.error {
            return Some(error);
        }
        self.data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
    }
}

/// A browser operation with typed parameters
pub trait Tool: Send + Sync {
    type Params: DeserializeOwned + JsonSchema;

    /// Registry name
    fn name(&self) -> &str;

    /// One-line description shown to agents
    fn description(&self) -> &str;

    /// JSON schema of [`Tool::Params`]
    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(Self::Params)).unwrap_or(Value::Null)
    }

    fn execute_typed(&self, params: Self::Params, context: &mut ToolContext)
    -> Result<ToolResult>;
}

/// Object-safe view of a [`Tool`], used by the registry
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult>;
}

impl<T: Tool> DynTool for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn description(&self) -> &str {
        Tool::description(self)
    }

    fn parameters_schema(&self) -> Value {
        Tool::parameters_schema(self)
    }

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        // Tools without parameters accept a missing body
        let params = if params.is_null() { json!({}) } else { params };
        let typed: T::Params = serde_json::from_value(params).map_err(|e| {
            BrowserError::InvalidParameters(format!("{}: {}", Tool::name(self), e))
        })?;
        self.execute_typed(typed, context)
    }
}

/// Tools addressable by name, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn DynTool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in operation
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NavigateTool);
        registry.register(GoBackTool);
        registry.register(ClosePopupsTool);
        registry.register(InputSearchTool);
        registry.register(ClickProductTool);
        registry.register(FindTextTool);
        registry.register(ProductDetailsTool);
        registry.register(HandleRecaptchaTool);
        registry.register(ScreenshotTool);
        registry.register(CombineAnswerTool);
        registry
    }

    /// Add a tool, replacing any tool registered under the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = Tool::name(&tool).to_string();
        self.tools.insert(name, Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run the tool registered as `name`
    pub fn execute(
        &self,
        name: &str,
        params: Value,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| BrowserError::UnknownTool(name.to_string()))?;

        log::debug!("Executing tool '{}'", name);
        let result = tool.execute(params, context)?;

        match result.status() {
            Some(status) if result.success => log::info!("{}: {}", name, status),
            Some(status) => log::info!("{} failed: {}", name, status),
            None => log::info!("{}: done", name),
        }
        Ok(result)
    }
}
