use crate::dom::Locator;
use crate::error::Result;
use std::fmt;
use std::time::Duration;

/// Opaque reference to an element owned by a [`PageDriver`].
///
/// Handles are only meaningful to the driver that produced them and only
/// while the element stays attached to its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Browser capabilities the operations are written against.
///
/// All queries run in the current frame context. The context starts at the
/// top-level document and is changed only through [`PageDriver::enter_frame`]
/// and [`PageDriver::exit_frame`], normally via [`crate::browser::FrameScope`].
pub trait PageDriver {
    /// URL of the active page
    fn current_url(&self) -> Result<String>;

    /// Navigate the active page and wait for the load to finish
    fn navigate(&self, url: &str) -> Result<()>;

    /// Go back one entry in history
    fn go_back(&self) -> Result<()>;

    /// All elements matching `locator`, in document order.
    ///
    /// Returns `BrowserError::InvalidLocator` for syntactically invalid
    /// expressions.
    fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>>;

    /// Elements matching `locator` inside `scope` (XPath is evaluated relative to it)
    fn find_within(&self, scope: &ElementHandle, locator: &Locator) -> Result<Vec<ElementHandle>>;

    /// Parent element, `None` at the document root
    fn parent(&self, element: &ElementHandle) -> Result<Option<ElementHandle>>;

    /// Lower-case tag name
    fn tag_name(&self, element: &ElementHandle) -> Result<String>;

    /// Rendered text of the element
    fn text(&self, element: &ElementHandle) -> Result<String>;

    fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>>;

    fn is_displayed(&self, element: &ElementHandle) -> Result<bool>;

    /// Displayed, enabled and able to receive pointer events
    fn is_clickable(&self, element: &ElementHandle) -> Result<bool>;

    /// Pointer click at the element's center
    fn click(&self, element: &ElementHandle) -> Result<()>;

    /// `element.click()` issued from page script
    fn script_click(&self, element: &ElementHandle) -> Result<()>;

    /// Clear the value of an editable element
    fn clear(&self, element: &ElementHandle) -> Result<()>;

    /// Focus the element and type `text`
    fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()>;

    /// Focus the element and press a named key such as `Enter`
    fn press_key(&self, element: &ElementHandle, key: &str) -> Result<()>;

    /// Align the element to the top of the viewport, then scroll by `offset_y` pixels
    fn scroll_into_view(&self, element: &ElementHandle, offset_y: i64) -> Result<()>;

    /// Make the document of the iframe `frame` the current context
    fn enter_frame(&self, frame: &ElementHandle) -> Result<()>;

    /// Return to the enclosing context; a no-op at the top level
    fn exit_frame(&self) -> Result<()>;

    /// Number of frames currently entered
    fn frame_depth(&self) -> usize;

    /// PNG capture of the viewport
    fn screenshot(&self) -> Result<Vec<u8>>;

    /// Let the page settle for `duration`
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
