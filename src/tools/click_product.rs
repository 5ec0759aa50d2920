use crate::browser::{ElementHandle, PageDriver};
use crate::dom::{
    Cascade, ClickStrategy, Locator, NATIVE_FIRST, SiteProfile, click_with_fallback,
};
use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the click_product tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClickProductParams {
    /// Name of the product to open from the search results
    pub product_name: String,
}

/// What was clicked to open the product page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickTarget {
    /// Explicit link inside a FairPrice product card
    CardLink,
    /// The matched element, or its nearest ancestor, is an anchor
    Link,
    /// The matched element itself
    Element,
}

impl ClickTarget {
    fn message(self, strategy: ClickStrategy) -> &'static str {
        match (self, strategy) {
            (ClickTarget::CardLink, _) => "Successfully clicked FairPrice product link",
            (ClickTarget::Link, _) => "Successfully clicked product link",
            (ClickTarget::Element, ClickStrategy::Native) => {
                "Successfully clicked product element"
            }
            (ClickTarget::Element, ClickStrategy::Script) => {
                "Successfully clicked product with JavaScript"
            }
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ClickTarget::CardLink => "card_link",
            ClickTarget::Link => "link",
            ClickTarget::Element => "element",
        }
    }
}

/// Tool for opening the top search result matching a product name
#[derive(Default)]
pub struct ClickProductTool;

impl Tool for ClickProductTool {
    type Params = ClickProductParams;

    fn name(&self) -> &str {
        "click_product"
    }

    fn description(&self) -> &str {
        "Click the top search result whose text matches every keyword of the product name"
    }

    fn execute_typed(
        &self,
        params: ClickProductParams,
        context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let site = context.site()?;
        let page = context.page;
        let timings = &context.timings;

        page.pause(timings.page_settle());

        let cascade = Cascade::new(page);
        for locator in site.product_link(&params.product_name).iter() {
            // The first match is the top result; later matches are never considered
            let Some(element) = cascade.present(locator)?.into_iter().next() else {
                continue;
            };
            if !page.is_displayed(&element).unwrap_or(false) {
                continue;
            }

            if let Err(e) = page.scroll_into_view(&element, -timings.scroll_offset_px) {
                log::debug!("Could not scroll {} into view: {}", element, e);
            }
            page.pause(timings.scroll_settle());

            let clicked = click_candidate(page, site, &element, timings.max_ancestor_hops)?;
            if let Some((target, strategy)) = clicked {
                let message = target.message(strategy);
                return Ok(ToolResult::success_with(serde_json::json!({
                    "message": message,
                    "selector": locator.expression,
                    "target": target.as_str(),
                    "strategy": strategy.as_str()
                })));
            }
            log::debug!("No click on {} from {} took effect", element, locator);
        }

        Ok(ToolResult::failure(format!(
            "Failed to click product: Could not find clickable element for {}",
            params.product_name
        )))
    }
}

/// Click the best target for a matched result element.
///
/// Targets are tried in order: the FairPrice card link, the element when it is
/// an anchor, its nearest anchor ancestor, then the element itself.
fn click_candidate(
    page: &dyn PageDriver,
    site: SiteProfile,
    element: &ElementHandle,
    max_hops: usize,
) -> Result<Option<(ClickTarget, ClickStrategy)>> {
    let mut targets = Vec::new();

    if site.prefers_card_links() {
        match page.find_within(element, &Locator::xpath(".//a[@href]")) {
            Ok(links) => {
                let link = links.into_iter().next();
                targets.extend(link.map(|l| (ClickTarget::CardLink, l)));
            }
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) => log::debug!("Card link lookup in {} failed: {}", element, e),
        }
    }

    if let Some(anchor) = nearest_anchor(page, element, max_hops) {
        targets.push((ClickTarget::Link, anchor));
    }
    targets.push((ClickTarget::Element, *element));

    for (target, handle) in targets {
        match click_with_fallback(page, &handle, NATIVE_FIRST) {
            Ok(strategy) => return Ok(Some((target, strategy))),
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) => log::debug!("Clicking {} {} failed: {}", target.as_str(), handle, e),
        }
    }
    Ok(None)
}

/// The element itself if it is an anchor, else the closest anchor ancestor
/// within `max_hops`, never climbing past `body`.
fn nearest_anchor(
    page: &dyn PageDriver,
    element: &ElementHandle,
    max_hops: usize,
) -> Option<ElementHandle> {
    let mut current = *element;
    for hop in 0..=max_hops {
        match page.tag_name(&current).ok()?.as_str() {
            "a" => return Some(current),
            "body" => return None,
            _ if hop == max_hops => return None,
            _ => current = page.parent(&current).ok()??,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeNode, FakePage};
    use crate::dom::keyword_match_xpath;

    fn params(name: &str) -> ClickProductParams {
        ClickProductParams {
            product_name: name.to_string(),
        }
    }

    fn lazada_first() -> &'static str {
        "(//div[contains(@class, 'Bm3ON') or contains(@class, 'grid-card')])[1]"
    }

    const MILO_CARD: &str = "(//div[@data-testid='product'][.//span[contains(text(), 'Milo')]])[1]";
    const LAZADA_LINK: &str = "(//a[contains(@href, '//www.lazada.sg/products/')])[1]";

    #[test]
    fn test_fairprice_prefers_card_link() {
        let page = FakePage::new("https://www.fairprice.com.sg/search?query=milo");
        let card = page.add(FakeNode::new("div"));
        let link = page.add(
            FakeNode::new("a")
                .attr("href", "/product/milo")
                .child_of(card),
        );
        page.bind(MILO_CARD, &[card]);
        page.bind_within(card, ".//a[@href]", &[link]);
        let mut context = ToolContext::new(&page);

        let result = ClickProductTool.execute_typed(params("Milo"), &mut context).unwrap();

        assert!(result.success);
        assert_eq!(
            result.status(),
            Some("Successfully clicked FairPrice product link")
        );
        assert_eq!(
            page.events(),
            vec![
                format!("scroll:{}:-100", card.0),
                format!("click:{}", link.0)
            ]
        );
    }

    #[test]
    fn test_walks_up_to_anchor_ancestor() {
        let page = FakePage::new("https://www.lazada.sg/catalog/?q=iphone");
        let anchor = page.add(FakeNode::new("a"));
        let wrapper = page.add(FakeNode::new("div").child_of(anchor));
        let card = page.add(FakeNode::new("div").child_of(wrapper));
        page.bind(lazada_first(), &[card]);
        let mut context = ToolContext::new(&page);

        let result = ClickProductTool.execute_typed(params("iphone 15"), &mut context).unwrap();

        assert_eq!(result.status(), Some("Successfully clicked product link"));
        assert!(page.events().contains(&format!("click:{}", anchor.0)));
    }

    #[test]
    fn test_ancestor_walk_is_bounded() {
        let page = FakePage::new("https://www.lazada.sg/");
        let mut parent = page.add(FakeNode::new("a"));
        for _ in 0..6 {
            parent = page.add(FakeNode::new("div").child_of(parent));
        }
        page.bind(lazada_first(), &[parent]);
        let mut context = ToolContext::new(&page);

        let result = ClickProductTool.execute_typed(params("iphone"), &mut context).unwrap();

        assert_eq!(
            result.status(),
            Some("Successfully clicked product element")
        );
        let last = page.events().pop().unwrap();
        assert_eq!(last, format!("click:{}", parent.0));
    }

    #[test]
    fn test_ancestor_walk_stops_at_body() {
        let page = FakePage::new("https://www.lazada.sg/");
        let anchor = page.add(FakeNode::new("a"));
        let body = page.add(FakeNode::new("body").child_of(anchor));
        let card = page.add(FakeNode::new("div").child_of(body));

        assert_eq!(nearest_anchor(&page, &card, 5), None);
        assert_eq!(nearest_anchor(&page, &anchor, 5), Some(anchor));
    }

    #[test]
    fn test_script_click_as_last_resort() {
        let page = FakePage::new("https://www.lazada.sg/");
        let card = page.add(FakeNode::new("div").failing_click());
        page.bind(lazada_first(), &[card]);
        let mut context = ToolContext::new(&page);

        let result = ClickProductTool.execute_typed(params("iphone"), &mut context).unwrap();

        assert_eq!(
            result.status(),
            Some("Successfully clicked product with JavaScript")
        );
        assert_eq!(result.data.unwrap()["strategy"], "script");
    }

    #[test]
    fn test_hidden_first_match_skips_candidate() {
        let page = FakePage::new("https://www.lazada.sg/");
        let hidden = page.add(FakeNode::new("div").hidden());
        let link = page.add(FakeNode::new("a"));
        page.bind(lazada_first(), &[hidden]);
        page.bind(LAZADA_LINK, &[link]);
        let mut context = ToolContext::new(&page);

        let result = ClickProductTool.execute_typed(params("iphone"), &mut context).unwrap();

        assert!(result.success);
        assert_eq!(result.data.unwrap()["selector"], LAZADA_LINK);
        let hidden_suffix = format!(":{}", hidden.0);
        let events = page.events();
        assert!(!events.iter().any(|e| e.ends_with(&hidden_suffix)));
    }

    #[test]
    fn test_generic_uses_keyword_xpath() {
        let page = FakePage::new("https://shop.example.com/search");
        let link = page.add(FakeNode::new("a"));
        let xpath = format!("//a[{}]", keyword_match_xpath("Green Tea"));
        page.bind(&xpath, &[link]);
        let mut context = ToolContext::new(&page);

        let result = ClickProductTool.execute_typed(params("Green Tea"), &mut context).unwrap();

        assert_eq!(result.status(), Some("Successfully clicked product link"));
    }

    #[test]
    fn test_nothing_clickable() {
        let page = FakePage::new("https://www.lazada.sg/");
        let broken = page.add(
            FakeNode::new("div")
                .failing_click()
                .failing_script_click(),
        );
        page.bind(lazada_first(), &[broken]);
        let mut context = ToolContext::new(&page);

        let result = ClickProductTool.execute_typed(params("iphone 15"), &mut context).unwrap();

        assert!(!result.success);
        assert_eq!(
            result.status(),
            Some("Failed to click product: Could not find clickable element for iphone 15")
        );
        assert_eq!(page.pauses()[0], context.timings.page_settle());
    }
}
