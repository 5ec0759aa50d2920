//! Element location on pages whose markup drifts
//!
//! This module provides the pieces the operations use to find elements:
//! - Locator / LocatorSpec: ordered locator candidates for one goal
//! - SiteProfile: per-store locator tables chosen from the page URL
//! - Cascade: priority-ordered traversal with visibility filtering and
//!   per-candidate error recovery

pub mod cascade;
pub mod locator;
pub mod site;

pub use cascade::{
    Cascade, ClickStrategy, Found, NATIVE_FIRST, SCRIPT_FIRST, click_with_fallback, wait_until,
};
pub use locator::{Locator, LocatorSpec, LocatorStrategy, xpath_literal};
pub use site::{SiteProfile, keyword_match_xpath};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_export() {
        let locator = Locator::css("h1");
        assert_eq!(locator.strategy, LocatorStrategy::Css);
    }

    #[test]
    fn test_site_profile_export() {
        let profile = SiteProfile::from_url("https://www.lazada.sg/");
        assert_eq!(profile.name(), "lazada");
    }
}
