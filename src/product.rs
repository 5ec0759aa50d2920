//! Product details and the two-store comparison record
//!
//! Field names and key order are part of the payload consumed by agents:
//! `product`, `originalPrice`, `currentPrice`, `promotion`.

use crate::dom::SiteProfile;
use crate::price::{format_price, parse_price};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

pub const PRODUCT_NOT_FOUND: &str = "Product name not found";
pub const PRICE_NOT_FOUND: &str = "Price not found";

/// Placeholders used when a store produced no result at all
pub const PLACEHOLDER_PRODUCT: &str = "Not found";
pub const PLACEHOLDER_PRICE: &str = "Not available";

/// Details extracted from one product page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub product: String,
    pub original_price: Option<String>,
    pub current_price: String,
    pub promotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ProductDetails {
    fn default() -> Self {
        Self {
            product: PRODUCT_NOT_FOUND.to_string(),
            original_price: None,
            current_price: PRICE_NOT_FOUND.to_string(),
            promotion: None,
            error: None,
        }
    }
}

impl ProductDetails {
    /// Default details describing an extraction that could not run
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self {
            error: Some(format!("Failed to extract product details: {}", reason)),
            ..Default::default()
        }
    }

    /// Entry for a store that produced no result
    pub fn placeholder() -> Self {
        Self {
            product: PLACEHOLDER_PRODUCT.to_string(),
            original_price: None,
            current_price: PLACEHOLDER_PRICE.to_string(),
            promotion: None,
            error: None,
        }
    }

    /// Current price as a number, `None` when it is a placeholder
    pub fn current_value(&self) -> Option<f64> {
        let value = parse_price(&self.current_price);
        (value > 0.0).then_some(value)
    }

    /// Pretty JSON in the payload key order
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Per-store input as an agent may hand it back: any key can be absent or null
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooseDetails {
    product: Option<String>,
    original_price: Option<String>,
    current_price: Option<String>,
    promotion: Option<String>,
}

impl From<LooseDetails> for ProductDetails {
    fn from(loose: LooseDetails) -> Self {
        Self {
            product: loose.product.unwrap_or_else(|| PLACEHOLDER_PRODUCT.to_string()),
            original_price: loose.original_price,
            current_price: loose.current_price.unwrap_or_else(|| PLACEHOLDER_PRICE.to_string()),
            promotion: loose.promotion,
            error: None,
        }
    }
}

/// A store result that could not be parsed
#[derive(Debug, thiserror::Error)]
#[error("Failed to combine results: invalid {site} result: {source}")]
pub struct CombineError {
    pub site: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Side-by-side details from both stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub fairprice: ProductDetails,
    pub lazada: ProductDetails,
}

impl ComparisonResult {
    /// Merge the per-store JSON results.
    ///
    /// Absent or blank inputs become placeholder entries. Unknown keys, such as
    /// an extraction `error`, are dropped.
    pub fn combine(fairprice: Option<&str>, lazada: Option<&str>) -> Result<Self, CombineError> {
        Ok(Self {
            fairprice: parse_store("fairprice", fairprice)?,
            lazada: parse_store("lazada", lazada)?,
        })
    }

    /// [`ComparisonResult::combine`] as a JSON payload; a parse failure becomes
    /// `{error, fairprice_raw, lazada_raw}` instead of an error.
    pub fn combine_payload(fairprice: Option<&str>, lazada: Option<&str>) -> Value {
        match Self::combine(fairprice, lazada) {
            Ok(result) => serde_json::to_value(&result).unwrap_or(Value::Null),
            Err(e) => json!({
                "error": e.to_string(),
                "fairprice_raw": fairprice,
                "lazada_raw": lazada,
            }),
        }
    }

    /// Which store is cheaper
    pub fn verdict(&self) -> PriceVerdict {
        match (self.fairprice.current_value(), self.lazada.current_value()) {
            (Some(fairprice), Some(lazada)) if (fairprice - lazada).abs() < 0.005 => {
                PriceVerdict::Same
            }
            (Some(fairprice), Some(lazada)) if fairprice < lazada => PriceVerdict::Cheaper {
                store: Store::FairPrice,
                savings: lazada - fairprice,
            },
            (Some(fairprice), Some(lazada)) => PriceVerdict::Cheaper {
                store: Store::Lazada,
                savings: fairprice - lazada,
            },
            _ => PriceVerdict::Incomparable,
        }
    }
}

fn parse_store(site: &'static str, raw: Option<&str>) -> Result<ProductDetails, CombineError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ProductDetails::placeholder()),
        Some(text) => serde_json::from_str::<LooseDetails>(text)
            .map(ProductDetails::from)
            .map_err(|source| CombineError { site, source }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    FairPrice,
    Lazada,
}

impl Store {
    /// Stores in the order a comparison visits them
    pub const ALL: [Store; 2] = [Store::FairPrice, Store::Lazada];

    pub fn profile(&self) -> SiteProfile {
        match self {
            Store::FairPrice => SiteProfile::FairPrice,
            Store::Lazada => SiteProfile::Lazada,
        }
    }

    /// Storefront landing page
    pub fn home_url(&self) -> &'static str {
        match self {
            Store::FairPrice => "https://www.fairprice.com.sg/",
            Store::Lazada => "https://www.lazada.sg/",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::FairPrice => write!(f, "FairPrice"),
            Store::Lazada => write!(f, "Lazada"),
        }
    }
}

/// Outcome of comparing the two current prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceVerdict {
    Cheaper { store: Store, savings: f64 },
    Same,
    /// At least one store has no usable price
    Incomparable,
}

impl fmt::Display for PriceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceVerdict::Cheaper { store, savings } => {
                write!(f, "{} is cheaper by {}", store, format_price(*savings))
            }
            PriceVerdict::Same => write!(f, "Both stores charge the same price"),
            PriceVerdict::Incomparable => write!(f, "Prices could not be compared"),
        }
    }
}
