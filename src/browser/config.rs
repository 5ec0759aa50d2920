use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Options for launching a new browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Browser window width in pixels
    pub window_width: u32,

    /// Browser window height in pixels
    pub window_height: u32,

    /// Path to the Chrome/Chromium binary
    pub chrome_path: Option<PathBuf>,

    /// Persistent profile directory
    pub user_data_dir: Option<PathBuf>,

    /// Enable the Chrome sandbox
    pub sandbox: bool,

    /// Operation timings used by tools run through this session
    pub timings: Timings,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
            timings: Timings::default(),
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set Chrome binary path
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Builder method: set user data directory
    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Builder method: set sandbox mode
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Builder method: set operation timings
    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }
}

/// Options for connecting to a running browser
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// DevTools WebSocket URL
    pub ws_url: String,

    /// Milliseconds without DevTools traffic before the connection is dropped
    pub timeout: u64,

    /// Operation timings used by tools run through this session
    pub timings: Timings,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout: 30_000,
            timings: Timings::default(),
        }
    }

    /// Builder method: set the idle connection timeout
    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }

    /// Builder method: set operation timings
    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }
}

/// Waits and settle delays used by the operations.
///
/// Every wait is bounded. Settle delays give client-side rendering time to
/// catch up after an action before the page is queried again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Interval between polls while waiting for an element
    pub poll_interval_ms: u64,
    /// Per-selector wait when dismissing overlays
    pub overlay_wait_ms: u64,
    /// Per-selector wait when looking for the search box
    pub search_wait_ms: u64,
    /// Per-selector wait for a challenge checkbox to become clickable
    pub challenge_wait_ms: u64,
    /// Delay before reading a freshly loaded page
    pub page_settle_ms: u64,
    /// Delay after typing into the search box
    pub type_settle_ms: u64,
    /// Delay after submitting a search
    pub submit_settle_ms: u64,
    /// Delay after scrolling an element into view
    pub scroll_settle_ms: u64,
    /// Delay after clicking a challenge checkbox
    pub challenge_settle_ms: u64,
    /// Upward offset applied after scrolling, clears sticky headers
    pub scroll_offset_px: i64,
    /// Maximum ancestors visited when looking for an enclosing link
    pub max_ancestor_hops: usize,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            overlay_wait_ms: 500,
            search_wait_ms: 3_000,
            challenge_wait_ms: 3_000,
            page_settle_ms: 2_000,
            type_settle_ms: 500,
            submit_settle_ms: 1_000,
            scroll_settle_ms: 500,
            challenge_settle_ms: 1_000,
            scroll_offset_px: 100,
            max_ancestor_hops: 5,
        }
    }
}

impl Timings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn overlay_wait(&self) -> Duration {
        Duration::from_millis(self.overlay_wait_ms)
    }

    pub fn search_wait(&self) -> Duration {
        Duration::from_millis(self.search_wait_ms)
    }

    pub fn challenge_wait(&self) -> Duration {
        Duration::from_millis(self.challenge_wait_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn type_settle(&self) -> Duration {
        Duration::from_millis(self.type_settle_ms)
    }

    pub fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.submit_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn challenge_settle(&self) -> Duration {
        Duration::from_millis(self.challenge_settle_ms)
    }
}
