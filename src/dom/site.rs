//! Site profiles and their locator tables.
//!
//! Markup on both stores is generated by CSS-in-JS tooling, so class names
//! drift between deployments. Each table therefore lists the known
//! site-specific locators first and generic fallbacks after them.

use crate::dom::locator::{LocatorSpec, xpath_literal};
use serde::{Deserialize, Serialize};

const FAIRPRICE_SEARCH: &[&str] = &["#search-input-bar", "[data-testid='search-input-desktop']"];
const LAZADA_SEARCH: &[&str] = &[".search-box__input--O34g", ".search-box__input"];
const GENERIC_SEARCH: &[&str] = &[
    "[type='search']",
    "[name='search']",
    "[name='q']",
    "[name='query']",
    "[placeholder*='search' i]",
    "[aria-label*='search' i]",
    ".search-input",
    "#search",
    ".searchbox",
    "[role='search'] input",
];

const FAIRPRICE_NAME: &[&str] = &[
    "span.sc-aa673588-1[weight='regular'][color='#333333']",
    ".sc-aa673588-1.drdope",
    "[data-testid='product-name-and-metadata'] span[weight='regular']",
];
const LAZADA_NAME: &[&str] = &[".pdp-mod-product-badge-title", "h1.pdp-mod-product-title"];
const GENERIC_NAME: &[&str] = &[
    "h1",
    "[class*='product-name']",
    "[class*='title']:not([class*='promo'])",
];

const FAIRPRICE_CURRENT_PRICE: &[&str] =
    &["span.kQDEta.gbCpHo", "span.sc-aa673588-1.sc-6ac8ef58-5"];
const LAZADA_CURRENT_PRICE: &[&str] = &[".pdp-price_type_normal", ".pdp-price"];
const GENERIC_CURRENT_PRICE: &[&str] = &[
    "[class*='price']:not([class*='original']):not([class*='was'])",
];

const FAIRPRICE_ORIGINAL_PRICE: &[&str] = &["span.kZssPC", "span.sc-aa673588-1.kZssPC"];
const LAZADA_ORIGINAL_PRICE: &[&str] = &[".pdp-price_type_deleted", ".pdp-price__old"];
const GENERIC_ORIGINAL_PRICE: &[&str] = &["[class*='original']", "[class*='was-price']"];

const LAZADA_PRODUCT_LINKS: &[&str] = &[
    "(//div[contains(@class, 'Bm3ON') or contains(@class, 'grid-card')])[1]",
    "(//a[contains(@href, '//www.lazada.sg/products/')])[1]",
    "(//div[contains(@data-tracking-exposed-item-id, '')])[1]",
    "(//img[@type='product'])[1]/..",
];

/// Overlay and modal selectors dismissed by `close_popups`
pub const OVERLAY_SELECTORS: &[&str] = &[
    "button[class*='close']",
    "[class*='modal']",
    "[class*='modal'] button",
    "[class*='CloseButton']",
    "[aria-label*='close']",
    ".modal-close",
    ".close-modal",
    ".modal .close",
    ".modal-backdrop",
    ".modal-overlay",
    "[class*='overlay']",
];

const CHALLENGE_FRAMES: &[&str] = &["iframe[title*='reCAPTCHA']"];
const CHALLENGE_CHECKBOXES: &[&str] = &[
    ".recaptcha-checkbox-border",
    "#recaptcha-anchor",
    "[role='checkbox']",
    ".recaptcha-checkbox",
];

/// The store a page belongs to, chosen from its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteProfile {
    FairPrice,
    Lazada,
    Generic,
}

impl SiteProfile {
    /// Sniff the profile from a URL
    pub fn from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("lazada") {
            SiteProfile::Lazada
        } else if url.contains("fairprice") {
            SiteProfile::FairPrice
        } else {
            SiteProfile::Generic
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SiteProfile::FairPrice => "fairprice",
            SiteProfile::Lazada => "lazada",
            SiteProfile::Generic => "generic",
        }
    }

    /// Whether product cards carry an explicit link worth preferring over the card itself
    pub fn prefers_card_links(&self) -> bool {
        matches!(self, SiteProfile::FairPrice)
    }

    pub fn search_box(&self) -> LocatorSpec {
        self.table(
            "search box",
            FAIRPRICE_SEARCH,
            LAZADA_SEARCH,
            GENERIC_SEARCH,
        )
    }

    pub fn product_name(&self) -> LocatorSpec {
        self.table("product name", FAIRPRICE_NAME, LAZADA_NAME, GENERIC_NAME)
    }

    pub fn current_price(&self) -> LocatorSpec {
        self.table(
            "current price",
            FAIRPRICE_CURRENT_PRICE,
            LAZADA_CURRENT_PRICE,
            GENERIC_CURRENT_PRICE,
        )
    }

    pub fn original_price(&self) -> LocatorSpec {
        self.table(
            "original price",
            FAIRPRICE_ORIGINAL_PRICE,
            LAZADA_ORIGINAL_PRICE,
            GENERIC_ORIGINAL_PRICE,
        )
    }

    /// Locators for the top search result matching `product_name`
    pub fn product_link(&self, product_name: &str) -> LocatorSpec {
        let spec = LocatorSpec::new(format!("product link for '{}'", product_name));
        let keywords = keyword_match_xpath(product_name);

        match self {
            SiteProfile::Lazada => spec.with_xpath(LAZADA_PRODUCT_LINKS.iter().copied()),
            SiteProfile::FairPrice => spec.with_xpath([
                format!(
                    "(//div[@data-testid='product'][.//span[contains(text(), {})]])[1]",
                    xpath_literal(product_name)
                ),
                format!(
                    "(//div[@data-testid='product-card'][.//span[{}]])[1]",
                    keywords
                ),
                format!("(//a[.//span[{}]][@href])[1]", keywords),
                "(//div[@data-testid='product'])[1]".to_string(),
                format!(
                    "(//div[contains(@class, 'product')]//span[{}]\
                     /ancestor::div[contains(@class, 'product-card')])[1]",
                    keywords
                ),
            ]),
            SiteProfile::Generic => spec.with_xpath([
                format!("//a[{}]", keywords),
                format!("//div[{}]//a", keywords),
                format!("//img[{}]/..", keywords),
            ]),
        }
    }

    fn table(
        &self,
        goal: &str,
        fairprice: &[&str],
        lazada: &[&str],
        generic: &[&str],
    ) -> LocatorSpec {
        let spec = LocatorSpec::new(goal);
        let spec = match self {
            SiteProfile::FairPrice => spec.with_css(fairprice.iter().copied()),
            SiteProfile::Lazada => spec.with_css(lazada.iter().copied()),
            SiteProfile::Generic => spec,
        };
        spec.with_css(generic.iter().copied())
    }
}

/// Locators for overlays that `close_popups` dismisses
pub fn overlays() -> LocatorSpec {
    LocatorSpec::new("overlay")
        .with_css(OVERLAY_SELECTORS.iter().copied())
}

/// Frames that host a verification challenge
pub fn challenge_frames() -> LocatorSpec {
    LocatorSpec::new("challenge frame")
        .with_css(CHALLENGE_FRAMES.iter().copied())
}

/// Checkbox candidates inside a challenge frame
pub fn challenge_checkboxes() -> LocatorSpec {
    LocatorSpec::new("challenge checkbox")
        .with_css(CHALLENGE_CHECKBOXES.iter().copied())
}

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";

/// XPath predicate matching elements whose text contains every keyword of
/// `name`, ignoring ASCII case.
pub fn keyword_match_xpath(name: &str) -> String {
    let conditions: Vec<String> = name
        .to_lowercase()
        .split_whitespace()
        .map(|keyword| {
            format!(
                "contains(translate(., '{}', '{}'), {})",
                UPPERCASE,
                LOWERCASE,
                xpath_literal(keyword)
            )
        })
        .collect();

    if conditions.is_empty() {
        // An empty name matches any node with text
        return "normalize-space(.) != ''".to_string();
    }
    conditions.join(" and ")
}
