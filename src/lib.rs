//! # price-compare
//!
//! Browser-driven price comparison between FairPrice and Lazada, built to keep
//! working while the stores' markup drifts.
//!
//! ## Features
//!
//! - **Selector cascades**: ordered locator candidates per goal, site-specific
//!   first and generic last, with visibility filtering and per-candidate recovery
//! - **Product extraction**: name, current price, original price and promotion
//!   with tolerant currency parsing
//! - **Interaction tools**: search, product click, pop-up dismissal, reCAPTCHA
//!   checkbox, find-text, navigation and screenshots
//! - **MCP Server**: every tool exposed to AI agents over the Model Context Protocol
//!
//! ## MCP Server
//!
//! ```bash
//! # Run headless browser
//! cargo run --bin mcp-server --features mcp-server
//!
//! # Run with visible browser (useful for debugging)
//! cargo run --bin mcp-server --features mcp-server -- --headed
//! ```
//!
//! ## Command line
//!
//! ```bash
//! cargo run --bin price-compare -- compare "milo powder 1kg"
//! cargo run --bin price-compare -- extract https://www.lazada.sg/products/...
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use price_compare::{BrowserSession, LaunchOptions};
//! use price_compare::workflow::ComparisonWorkflow;
//!
//! # fn main() -> price_compare::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! let report = ComparisonWorkflow::new(&session, session.tool_registry()).run("milo powder");
//! println!("{}", report.verdict);
//! # Ok(())
//! # }
//! ```
//!
//! ### Using the Tool System
//!
//! ```rust,no_run
//! use price_compare::{BrowserSession, LaunchOptions};
//! use price_compare::tools::{ToolContext, ToolRegistry};
//! use serde_json::json;
//!
//! # fn main() -> price_compare::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! let registry = ToolRegistry::with_defaults();
//! let mut context = ToolContext::new(&session);
//!
//! registry.execute("navigate", json!({"url": "https://www.lazada.sg/"}), &mut context)?;
//! registry.execute("input_search", json!({"text": "iphone 15"}), &mut context)?;
//! let details = registry.execute("get_product_details", json!({}), &mut context)?;
//! println!("{:?}", details.data);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: the `PageDriver` abstraction, the Chrome session and configuration
//! - [`dom`]: locators, site profiles and the selector cascade
//! - [`price`]: currency parsing and promotion math
//! - [`product`]: product details and the comparison record
//! - [`tools`]: the operations (navigate, input_search, click_product, ...)
//! - [`workflow`]: the scripted two-store comparison
//! - [`error`]: Error types and result aliases
//! - [`mcp`]: **Model Context Protocol server** (requires `mcp-handler` feature)

pub mod browser;
pub mod dom;
pub mod error;
pub mod price;
pub mod product;
pub mod tools;
pub mod workflow;

#[cfg(feature = "mcp-handler")]
pub mod mcp;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, PageDriver, Timings};
pub use dom::{Cascade, Locator, LocatorSpec, SiteProfile};
pub use error::{BrowserError, Result};
pub use product::{ComparisonResult, PriceVerdict, ProductDetails};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};

#[cfg(feature = "mcp-handler")]
pub use mcp::BrowserServer;
#[cfg(feature = "mcp-handler")]
pub use rmcp::ServiceExt;
