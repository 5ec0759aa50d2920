//! Browser access
//!
//! - [`PageDriver`]: the browser capabilities every operation is written against
//! - [`BrowserSession`]: the Chrome implementation over `headless_chrome`
//! - [`FrameScope`]: frame context that is always restored
//! - [`LaunchOptions`], [`ConnectionOptions`], [`Timings`]: configuration

pub mod config;
pub mod driver;
pub mod frame;
pub mod session;

#[cfg(test)]
pub mod fake;

pub use config::{ConnectionOptions, LaunchOptions, Timings};
pub use driver::{ElementHandle, PageDriver};
pub use frame::FrameScope;
pub use session::BrowserSession;
