use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Technique used to find elements in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// CSS selector
    Css,
    /// XPath expression
    #[serde(rename = "xpath")]
    XPath,
    /// Literal text contained in the element's own text nodes
    Text,
}

impl LocatorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorStrategy::Css => "css",
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::Text => "text",
        }
    }
}

/// A single way of locating an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub expression: String,
}

impl Locator {
    pub fn new(strategy: LocatorStrategy, expression: impl Into<String>) -> Self {
        Self {
            strategy,
            expression: expression.into(),
        }
    }

    pub fn css(expression: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Css, expression)
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::XPath, expression)
    }

    pub fn text(literal: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Text, literal)
    }

    /// The expression a document query actually runs.
    ///
    /// CSS and XPath pass through; text locators become an XPath over the
    /// element's own text nodes.
    pub fn query_expression(&self) -> String {
        match self.strategy {
            LocatorStrategy::Css | LocatorStrategy::XPath => self.expression.clone(),
            LocatorStrategy::Text => {
                format!("//*[contains(text(), {})]", xpath_literal(&self.expression))
            }
        }
    }

    /// Strategy used for the query returned by [`Locator::query_expression`]
    pub fn query_strategy(&self) -> LocatorStrategy {
        match self.strategy {
            LocatorStrategy::Css => LocatorStrategy::Css,
            LocatorStrategy::XPath | LocatorStrategy::Text => LocatorStrategy::XPath,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.expression)
    }
}

/// Ordered locator candidates for one semantic goal.
///
/// Order is priority: site-specific, high-confidence locators come before
/// generic fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSpec {
    goal: String,
    candidates: Vec<Locator>,
}

impl LocatorSpec {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            candidates: Vec::new(),
        }
    }

    /// Builder method: append a candidate
    pub fn with(mut self, locator: Locator) -> Self {
        self.candidates.push(locator);
        self
    }

    /// Builder method: append CSS candidates in order
    pub fn with_css<'a>(mut self, selectors: impl IntoIterator<Item = &'a str>) -> Self {
        self.candidates.extend(selectors.into_iter().map(Locator::css));
        self
    }

    /// Builder method: append XPath candidates in order
    pub fn with_xpath<I, S>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates.extend(expressions.into_iter().map(Locator::xpath));
        self
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn candidates(&self) -> &[Locator] {
        &self.candidates
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locator> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath has no escape sequences, so a value containing both quote kinds is
/// split and rebuilt with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }

    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
