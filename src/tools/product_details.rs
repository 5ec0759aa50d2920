use crate::browser::{ElementHandle, PageDriver, Timings};
use crate::dom::{Cascade, LocatorSpec, SiteProfile};
use crate::error::Result;
use crate::price::{format_price, parse_price, promotion, reconcile};
use crate::product::ProductDetails;
use crate::tools::utils::squash_whitespace;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shortest text accepted as a product name
const MIN_NAME_LEN: usize = 5;

/// Button labels that share markup with product titles
const CALLS_TO_ACTION: &[&str] = &["add to cart", "buy now"];

/// Parameters for the get_product_details tool (no parameters needed)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProductDetailsParams {}

/// Tool for reading name, prices and promotion from a product page
#[derive(Default)]
pub struct ProductDetailsTool;

impl Tool for ProductDetailsTool {
    type Params = ProductDetailsParams;

    fn name(&self) -> &str {
        "get_product_details"
    }

    fn description(&self) -> &str {
        "Extract product name, current price, original price and promotion \
         from the current product page as JSON"
    }

    fn execute_typed(
        &self,
        _params: ProductDetailsParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let details = extract_product_details(context.page, &context.timings);
        let data = serde_json::to_value(&details).unwrap_or_default();

        match &details.error {
            Some(error) => Ok(ToolResult::failure_with(error.clone(), data)),
            None => Ok(ToolResult::success_with(data)),
        }
    }
}

/// Read the product page, degrading to defaults instead of failing.
///
/// An unexpected driver failure is reported in the `error` field of the
/// returned details.
pub fn extract_product_details(page: &dyn PageDriver, timings: &Timings) -> ProductDetails {
    page.pause(timings.page_settle());

    match read_details(page) {
        Ok(details) => details,
        Err(e) => {
            log::warn!("Product extraction failed: {}", e);
            ProductDetails::failed(e)
        }
    }
}

fn read_details(page: &dyn PageDriver) -> Result<ProductDetails> {
    let site = SiteProfile::from_url(&page.current_url()?);
    let cascade = Cascade::new(page);
    let mut details = ProductDetails::default();

    if let Some(found) = cascade.find_map(&site.product_name(), |el| {
        let text = squash_whitespace(&page.text(el)?);
        Ok(is_product_name(&text).then_some(text))
    })? {
        details.product = found.value;
    }

    let current = first_price(&cascade, &site.current_price())?;
    let original = first_price(&cascade, &site.original_price())?;

    if current > 0.0 {
        details.current_price = format_price(current);
    }

    // A lower "original" is a leftover fragment of an earlier page state; it
    // is dropped along with any original shown without a current price
    let (reconciled, current) = reconcile(current, original);
    let reconciled = reconciled.filter(|_| current > 0.0 && original >= current);

    details.original_price = reconciled.map(format_price);
    details.promotion = reconciled.and_then(|o| promotion(o, current)).map(format_price);

    log::info!(
        "{}: '{}' at {} (was {:?})",
        site.name(),
        details.product,
        details.current_price,
        details.original_price
    );
    Ok(details)
}

/// First positive price shown by the candidates of `spec`, `0.0` if none
fn first_price(cascade: &Cascade, spec: &LocatorSpec) -> Result<f64> {
    let page = cascade.page();
    let found = cascade.find_map(spec, |el: &ElementHandle| {
        let text = page.text(el)?;
        let value = parse_price(&text);
        Ok((value > 0.0).then_some(value))
    })?;
    Ok(found.map(|f| f.value).unwrap_or(0.0))
}

/// Whether `text` reads like a product title rather than a label or a price
pub fn is_product_name(text: &str) -> bool {
    let lower = text.to_lowercase();
    text.chars().count() > MIN_NAME_LEN
        && !CALLS_TO_ACTION.iter().any(|cta| lower.contains(cta))
        && !lower.contains("price")
        && !text.contains('$')
}
