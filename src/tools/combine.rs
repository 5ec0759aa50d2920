use crate::error::Result;
use crate::product::ComparisonResult;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the combine_answer tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CombineAnswerParams {
    /// JSON returned by get_product_details on FairPrice
    #[serde(default)]
    pub fairprice_result: Option<String>,

    /// JSON returned by get_product_details on Lazada
    #[serde(default)]
    pub lazada_result: Option<String>,
}

/// Tool for merging both stores' details into the final comparison
#[derive(Default)]
pub struct CombineAnswerTool;

impl Tool for CombineAnswerTool {
    type Params = CombineAnswerParams;

    fn name(&self) -> &str {
        "combine_answer"
    }

    fn description(&self) -> &str {
        "Combine the FairPrice and Lazada product details into one comparison; \
         missing results become placeholders"
    }

    fn execute_typed(
        &self,
        params: CombineAnswerParams,
        _context: &mut ToolContext,
    ) -> Result<ToolResult> {
        let fairprice = params.fairprice_result.as_deref();
        let lazada = params.lazada_result.as_deref();

        match ComparisonResult::combine(fairprice, lazada) {
            Ok(result) => {
                let verdict = result.verdict().to_string();
                let mut data = serde_json::to_value(&result).unwrap_or_default();
                data["verdict"] = verdict.into();
                Ok(ToolResult::success_with(data))
            }
            Err(e) => {
                log::warn!("{}", e);
                let payload = ComparisonResult::combine_payload(fairprice, lazada);
                Ok(ToolResult::failure_with(e.to_string(), payload))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakePage;
    use crate::tools::ToolRegistry;
    use serde_json::json;

    #[test]
    fn test_combine_with_missing_store() {
        let page = FakePage::new("about:blank");
        let mut context = ToolContext::new(&page);
        let fairprice = r#"{
            "product": "Milo 1kg",
            "originalPrice": null,
            "currentPrice": "$12.00",
            "promotion": null
        }"#;
        let params = json!({ "fairprice_result": fairprice });

        let result = ToolRegistry::with_defaults()
            .execute("combine_answer", params, &mut context)
            .unwrap();

        let data = result.data.unwrap();
        assert!(result.success);
        assert_eq!(data["fairprice"]["currentPrice"], "$12.00");
        assert_eq!(data["lazada"]["product"], "Not found");
        assert_eq!(data["lazada"]["currentPrice"], "Not available");
        assert_eq!(data["verdict"], "Prices could not be compared");
    }

    #[test]
    fn test_combine_malformed_keeps_raw_inputs() {
        let page = FakePage::new("about:blank");
        let mut context = ToolContext::new(&page);
        let params = CombineAnswerParams {
            fairprice_result: Some("{oops".into()),
            lazada_result: None,
        };

        let result = CombineAnswerTool.execute_typed(params, &mut context).unwrap();

        assert!(!result.success);
        let data = result.data.unwrap();
        assert_eq!(data["fairprice_raw"], "{oops");
        assert_eq!(data["lazada_raw"], serde_json::Value::Null);
    }
}
