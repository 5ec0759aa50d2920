//! Scripted two-store comparison
//!
//! Runs the same sequence of tools an agent would on each store and merges
//! the extracted details. A failing step is logged and the run carries on;
//! extraction always yields details, if only the defaults.

use crate::browser::{PageDriver, Timings};
use crate::product::{ComparisonResult, PriceVerdict, ProductDetails, Store};
use crate::tools::{ToolContext, ToolRegistry};
use serde::Serialize;
use serde_json::{Value, json};

/// Outcome of one tool call within a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub tool: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Everything a run did on one store
#[derive(Debug, Clone, Serialize)]
pub struct StoreRun {
    pub store: String,
    pub steps: Vec<StepOutcome>,
    pub details: ProductDetails,
}

/// Result of a full comparison
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub runs: Vec<StoreRun>,
    /// Combined payload as an agent would receive it from `combine_answer`
    pub combined: Value,
    pub verdict: PriceVerdict,
}

pub struct ComparisonWorkflow<'a> {
    page: &'a dyn PageDriver,
    registry: &'a ToolRegistry,
    timings: Timings,
}

impl<'a> ComparisonWorkflow<'a> {
    pub fn new(page: &'a dyn PageDriver, registry: &'a ToolRegistry) -> Self {
        Self {
            page,
            registry,
            timings: Timings::default(),
        }
    }

    /// Builder method: timings handed to every tool
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Compare `product_name` across both stores
    pub fn run(&self, product_name: &str) -> ComparisonReport {
        let runs: Vec<StoreRun> = Store::ALL
            .iter()
            .map(|store| self.run_store(*store, product_name))
            .collect();

        let fairprice = runs[0].details.to_json();
        let lazada = runs[1].details.to_json();

        let (combined, verdict) = match ComparisonResult::combine(Some(&fairprice), Some(&lazada)) {
            Ok(result) => (serde_json::to_value(&result).unwrap_or_default(), result.verdict()),
            Err(e) => {
                log::warn!("{}", e);
                let payload = ComparisonResult::combine_payload(Some(&fairprice), Some(&lazada));
                (payload, PriceVerdict::Incomparable)
            }
        };

        log::info!("Comparison for '{}': {}", product_name, verdict);
        ComparisonReport {
            runs,
            combined,
            verdict,
        }
    }

    /// Search one store for `product_name` and read the top result
    pub fn run_store(&self, store: Store, product_name: &str) -> StoreRun {
        log::info!("Searching {} for '{}'", store, product_name);

        let plan = [
            ("navigate", json!({ "url": store.home_url() })),
            ("handle_recaptcha", json!({})),
            ("close_popups", json!({})),
            ("input_search", json!({ "text": product_name })),
            ("handle_recaptcha", json!({})),
            ("close_popups", json!({})),
            ("click_product", json!({ "product_name": product_name })),
        ];

        let mut steps = Vec::with_capacity(plan.len() + 1);
        for (tool, params) in plan {
            steps.push(self.step(tool, params).0);
        }

        let (outcome, data) = self.step("get_product_details", json!({}));
        steps.push(outcome);

        let details = match data.map(serde_json::from_value::<ProductDetails>) {
            Some(Ok(details)) => details,
            Some(Err(e)) => ProductDetails::failed(e),
            None => {
                let reason = steps.last().and_then(|s| s.status.clone());
                ProductDetails::failed(reason.unwrap_or_default())
            }
        };

        StoreRun {
            store: store.to_string(),
            steps,
            details,
        }
    }

    fn step(&self, tool: &str, params: Value) -> (StepOutcome, Option<Value>) {
        let mut context = ToolContext::new(self.page).with_timings(self.timings.clone());

        match self.registry.execute(tool, params, &mut context) {
            Ok(result) => {
                let status = result.status().map(str::to_owned);
                if !result.success {
                    let reason = status.as_deref().unwrap_or("no reason given");
                    log::warn!("{} did not succeed: {}", tool, reason);
                }
                let outcome = StepOutcome {
                    tool: tool.to_string(),
                    success: result.success,
                    status,
                };
                (outcome, result.data)
            }
            Err(e) => {
                log::warn!("{} failed: {}", tool, e);
                let outcome = StepOutcome {
                    tool: tool.to_string(),
                    success: false,
                    status: Some(e.to_string()),
                };
                (outcome, None)
            }
        }
    }
}
