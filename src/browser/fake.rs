//! In-memory [`PageDriver`] for unit tests.
//!
//! Locators are not interpreted: a test binds each query expression to the
//! elements it should return, per frame context. Every query and interaction
//! is recorded so tests can assert on traversal order.

use crate::browser::driver::{ElementHandle, PageDriver};
use crate::dom::Locator;
use crate::error::{BrowserError, Result};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FakeNode {
    tag: String,
    text: String,
    attributes: HashMap<String, String>,
    displayed: bool,
    clickable: bool,
    parent: Option<ElementHandle>,
    click_fails: bool,
    script_click_fails: bool,
    checks_on_click: bool,
    detaches_on_click: bool,
    stale_after_query: bool,
    detached: bool,
}

impl FakeNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            clickable: true,
            parent: None,
            click_fails: false,
            script_click_fails: false,
            checks_on_click: false,
            detaches_on_click: false,
            stale_after_query: false,
            detached: false,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn unclickable(mut self) -> Self {
        self.clickable = false;
        self
    }

    pub fn child_of(mut self, parent: ElementHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }

    pub fn failing_script_click(mut self) -> Self {
        self.script_click_fails = true;
        self
    }

    /// Clicking sets `aria-checked="true"`, like a challenge checkbox that accepts the click
    pub fn checks_on_click(mut self) -> Self {
        self.checks_on_click = true;
        self
    }

    /// A native click replaces the element, as a re-rendering widget does
    pub fn detaches_on_click(mut self) -> Self {
        self.detaches_on_click = true;
        self
    }

    /// Queries still return the element, but it is detached before any use
    pub fn stale_after_query(mut self) -> Self {
        self.stale_after_query = true;
        self
    }
}

#[derive(Default)]
struct FakeState {
    url: String,
    history: Vec<String>,
    nodes: Vec<FakeNode>,
    bindings: HashMap<(Option<u64>, String), Vec<ElementHandle>>,
    scoped: HashMap<(u64, String), Vec<ElementHandle>>,
    invalid: HashSet<String>,
    failing: HashSet<String>,
    history_fails: bool,
    frames: Vec<u64>,
    values: HashMap<u64, String>,
    queries: Vec<String>,
    events: Vec<String>,
    pauses: Vec<Duration>,
}

pub struct FakePage {
    state: RefCell<FakeState>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let state = FakeState {
            url: url.to_string(),
            ..Default::default()
        };
        Self {
            state: RefCell::new(state),
        }
    }

    pub fn add(&self, node: FakeNode) -> ElementHandle {
        let mut state = self.state.borrow_mut();
        state.nodes.push(node);
        ElementHandle(state.nodes.len() as u64 - 1)
    }

    /// Make `expression` return `elements` in the top-level document
    pub fn bind(&self, expression: &str, elements: &[ElementHandle]) {
        let key = (None, expression.to_string());
        self.state.borrow_mut().bindings.insert(key, elements.to_vec());
    }

    /// Make `expression` return `elements` inside `frame`
    pub fn bind_in_frame(
        &self,
        frame: ElementHandle,
        expression: &str,
        elements: &[ElementHandle],
    ) {
        let key = (Some(frame.0), expression.to_string());
        self.state.borrow_mut().bindings.insert(key, elements.to_vec());
    }

    /// Make `expression` return `elements` when queried inside `scope`
    pub fn bind_within(&self, scope: ElementHandle, expression: &str, elements: &[ElementHandle]) {
        let key = (scope.0, expression.to_string());
        self.state.borrow_mut().scoped.insert(key, elements.to_vec());
    }

    /// Queries for `expression` fail as syntactically invalid
    pub fn reject(&self, expression: &str) {
        self.state.borrow_mut().invalid.insert(expression.to_string());
    }

    /// Queries for `expression` fail with a transient evaluation error
    pub fn fail(&self, expression: &str) {
        self.state.borrow_mut().failing.insert(expression.to_string());
    }

    /// Remove an element from its document; later operations on it are stale
    pub fn detach(&self, element: ElementHandle) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(element.0 as usize) {
            node.detached = true;
        }
    }

    /// Going back fails with a navigation error
    pub fn fail_history(&self) {
        self.state.borrow_mut().history_fails = true;
    }

    pub fn set_url(&self, url: &str) {
        self.state.borrow_mut().url = url.to_string();
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.borrow().queries.clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.state.borrow().events.clone()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.state.borrow().pauses.clone()
    }

    pub fn value_of(&self, element: ElementHandle) -> Option<String> {
        self.state.borrow().values.get(&element.0).cloned()
    }

    fn with_node<T>(
        &self,
        element: &ElementHandle,
        f: impl FnOnce(&mut FakeNode) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.borrow_mut();
        match state.nodes.get_mut(element.0 as usize) {
            Some(node) if !node.detached && !node.stale_after_query => f(node),
            Some(_) => Err(BrowserError::StaleElement(format!(
                "element {} is no longer attached",
                element
            ))),
            None => Err(BrowserError::ElementNotFound(format!(
                "unknown element {}",
                element
            ))),
        }
    }

    fn record(&self, event: String) {
        self.state.borrow_mut().events.push(event);
    }

    fn check_query(&self, expression: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.queries.push(expression.to_string());
        if state.invalid.contains(expression) {
            return Err(BrowserError::InvalidLocator(format!(
                "'{}' is not a valid selector",
                expression
            )));
        }
        if state.failing.contains(expression) {
            return Err(BrowserError::EvaluationFailed(format!(
                "query '{}' failed",
                expression
            )));
        }
        Ok(())
    }

    fn attached(&self, elements: Vec<ElementHandle>) -> Vec<ElementHandle> {
        let state = self.state.borrow();
        elements
            .into_iter()
            .filter(|e| state.nodes.get(e.0 as usize).is_some_and(|n| !n.detached))
            .collect()
    }
}

impl PageDriver for FakePage {
    fn current_url(&self) -> Result<String> {
        Ok(self.state.borrow().url.clone())
    }

    fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let previous = std::mem::replace(&mut state.url, url.to_string());
        state.history.push(previous);
        state.events.push(format!("navigate:{}", url));
        Ok(())
    }

    fn go_back(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.history_fails {
            let reason = "history is unavailable".to_string();
            return Err(BrowserError::NavigationFailed(reason));
        }
        if let Some(previous) = state.history.pop() {
            state.url = previous;
        }
        state.events.push("go_back".to_string());
        Ok(())
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let expression = locator.query_expression();
        self.check_query(&expression)?;
        let found = {
            let state = self.state.borrow();
            let frame = state.frames.last().copied();
            state
                .bindings
                .get(&(frame, expression))
                .cloned()
                .unwrap_or_default()
        };
        Ok(self.attached(found))
    }

    fn find_within(&self, scope: &ElementHandle, locator: &Locator) -> Result<Vec<ElementHandle>> {
        self.with_node(scope, |_| Ok(()))?;
        let expression = locator.query_expression();
        self.check_query(&expression)?;
        let found = self
            .state
            .borrow()
            .scoped
            .get(&(scope.0, expression))
            .cloned()
            .unwrap_or_default();
        Ok(self.attached(found))
    }

    fn parent(&self, element: &ElementHandle) -> Result<Option<ElementHandle>> {
        self.with_node(element, |node| Ok(node.parent))
    }

    fn tag_name(&self, element: &ElementHandle) -> Result<String> {
        self.with_node(element, |node| Ok(node.tag.clone()))
    }

    fn text(&self, element: &ElementHandle) -> Result<String> {
        self.with_node(element, |node| Ok(node.text.clone()))
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        self.with_node(element, |node| Ok(node.attributes.get(name).cloned()))
    }

    fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        self.with_node(element, |node| Ok(node.displayed))
    }

    fn is_clickable(&self, element: &ElementHandle) -> Result<bool> {
        self.with_node(element, |node| Ok(node.displayed && node.clickable))
    }

    fn click(&self, element: &ElementHandle) -> Result<()> {
        self.with_node(element, |node| {
            if !node.displayed || !node.clickable || node.click_fails {
                return Err(BrowserError::NotInteractable(format!(
                    "element {} rejected the click",
                    element
                )));
            }
            if node.checks_on_click {
                node.attributes.insert("aria-checked".to_string(), "true".to_string());
            }
            node.detached = node.detaches_on_click;
            Ok(())
        })?;
        self.record(format!("click:{}", element.0));
        Ok(())
    }

    fn script_click(&self, element: &ElementHandle) -> Result<()> {
        self.with_node(element, |node| {
            if node.script_click_fails {
                return Err(BrowserError::EvaluationFailed(format!(
                    "script click on {} threw",
                    element
                )));
            }
            if node.checks_on_click {
                node.attributes.insert("aria-checked".to_string(), "true".to_string());
            }
            Ok(())
        })?;
        self.record(format!("script_click:{}", element.0));
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> Result<()> {
        self.with_node(element, |_| Ok(()))?;
        self.state.borrow_mut().values.remove(&element.0);
        self.record(format!("clear:{}", element.0));
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()> {
        self.with_node(element, |node| {
            if !node.displayed || !node.clickable {
                return Err(BrowserError::NotInteractable(format!(
                    "element {} cannot take input",
                    element
                )));
            }
            Ok(())
        })?;
        self.state
            .borrow_mut()
            .values
            .entry(element.0)
            .or_default()
            .push_str(text);
        self.record(format!("type:{}:{}", element.0, text));
        Ok(())
    }

    fn press_key(&self, element: &ElementHandle, key: &str) -> Result<()> {
        self.with_node(element, |_| Ok(()))?;
        self.record(format!("key:{}:{}", element.0, key));
        Ok(())
    }

    fn scroll_into_view(&self, element: &ElementHandle, offset_y: i64) -> Result<()> {
        self.with_node(element, |_| Ok(()))?;
        self.record(format!("scroll:{}:{}", element.0, offset_y));
        Ok(())
    }

    fn enter_frame(&self, frame: &ElementHandle) -> Result<()> {
        let tag = self.tag_name(frame)?;
        if tag != "iframe" {
            return Err(BrowserError::FrameFailed(format!(
                "element {} is a <{}>, not an iframe",
                frame, tag
            )));
        }
        self.state.borrow_mut().frames.push(frame.0);
        self.record(format!("enter_frame:{}", frame.0));
        Ok(())
    }

    fn exit_frame(&self) -> Result<()> {
        self.state.borrow_mut().frames.pop();
        self.record("exit_frame".to_string());
        Ok(())
    }

    fn frame_depth(&self) -> usize {
        self.state.borrow().frames.len()
    }

    fn screenshot(&self) -> Result<Vec<u8>> {
        let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 3));
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageOutputFormat::Png)
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))?;
        Ok(png.into_inner())
    }

    fn pause(&self, duration: Duration) {
        self.state.borrow_mut().pauses.push(duration);
    }
}
