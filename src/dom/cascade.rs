//! Selector cascade.
//!
//! A cascade walks the candidates of a [`LocatorSpec`] in priority order and
//! stops at the first one that produces a usable element. Per-candidate
//! failures (stale nodes, timeouts, rejected clicks) are logged and skipped;
//! only a malformed locator escapes as an error.

use crate::browser::{ElementHandle, FrameScope, PageDriver};
use crate::dom::locator::{Locator, LocatorSpec};
use crate::error::{BrowserError, Result};
use std::time::{Duration, Instant};

/// A successful cascade step
#[derive(Debug, Clone, PartialEq)]
pub struct Found<T> {
    /// Value produced for the element
    pub value: T,
    /// Candidate that matched
    pub locator: Locator,
    /// Element the value came from
    pub element: ElementHandle,
}

/// Ways of clicking an element, tried in order until one succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickStrategy {
    /// Pointer click dispatched by the browser
    Native,
    /// `element.click()` from page script
    Script,
}

impl ClickStrategy {
    pub fn apply(self, page: &dyn PageDriver, element: &ElementHandle) -> Result<()> {
        match self {
            ClickStrategy::Native => page.click(element),
            ClickStrategy::Script => page.script_click(element),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClickStrategy::Native => "native",
            ClickStrategy::Script => "script",
        }
    }
}

/// Pointer click first, script click as the last resort
pub const NATIVE_FIRST: &[ClickStrategy] = &[ClickStrategy::Native, ClickStrategy::Script];

/// Script click first, for overlays that swallow pointer events
pub const SCRIPT_FIRST: &[ClickStrategy] = &[ClickStrategy::Script, ClickStrategy::Native];

/// Click `element` with each strategy of `chain` once, in order.
///
/// Returns the strategy that worked, or the last error.
pub fn click_with_fallback(
    page: &dyn PageDriver,
    element: &ElementHandle,
    chain: &[ClickStrategy],
) -> Result<ClickStrategy> {
    let mut last_error =
        BrowserError::NotInteractable(format!("no click strategy for {}", element));

    for strategy in chain {
        match strategy.apply(page, element) {
            Ok(()) => return Ok(*strategy),
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) => {
                log::debug!("{} click on {} failed: {}", strategy.as_str(), element, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Polls at least once. The attempt budget is derived from the timeout so a
/// driver whose `pause` does not sleep still terminates.
pub fn wait_until(
    page: &dyn PageDriver,
    timeout: Duration,
    poll_interval: Duration,
    mut condition: impl FnMut() -> Result<bool>,
) -> Result<bool> {
    let attempts = attempt_budget(timeout, poll_interval);
    let started = Instant::now();

    for attempt in 0..attempts {
        if condition()? {
            return Ok(true);
        }
        if attempt + 1 == attempts || started.elapsed() >= timeout {
            break;
        }
        page.pause(poll_interval);
    }

    Ok(false)
}

fn attempt_budget(timeout: Duration, poll_interval: Duration) -> u32 {
    if timeout.is_zero() {
        return 1;
    }
    let poll = poll_interval.max(Duration::from_millis(1));
    let budget = timeout.as_millis().div_ceil(poll.as_millis()) + 1;
    u32::try_from(budget).unwrap_or(u32::MAX)
}

/// Cascade over locator candidates against one page
pub struct Cascade<'a> {
    page: &'a dyn PageDriver,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'a> Cascade<'a> {
    pub fn new(page: &'a dyn PageDriver) -> Self {
        Self {
            page,
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Builder method: how long each candidate may take to appear
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method: interval between polls of a candidate
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn page(&self) -> &'a dyn PageDriver {
        self.page
    }

    /// Elements matched by `locator`, waiting up to the cascade timeout for
    /// at least one to be present.
    pub fn present(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let mut found = Vec::new();
        let mut last_error = None;

        wait_until(
            self.page,
            self.timeout,
            self.poll_interval,
            || match self.page.find_all(locator) {
                Ok(elements) => {
                    found = elements;
                    Ok(!found.is_empty())
                }
                Err(e) if !e.is_recoverable() => Err(e),
                Err(e) => {
                    last_error = Some(e);
                    Ok(false)
                }
            },
        )?;

        if found.is_empty() {
            if let Some(e) = last_error {
                log::debug!("{} failed: {}", locator, e);
            }
        }
        Ok(found)
    }

    /// Present elements of `locator` that are currently displayed
    pub fn visible(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let elements = self.present(locator)?;
        Ok(elements
            .into_iter()
            .filter(|e| self.page.is_displayed(e).unwrap_or(false))
            .collect())
    }

    /// First visible element, in candidate order, for which `f` produces a value
    pub fn find_map<T>(
        &self,
        spec: &LocatorSpec,
        mut f: impl FnMut(&ElementHandle) -> Result<Option<T>>,
    ) -> Result<Option<Found<T>>> {
        for locator in spec.iter() {
            for element in self.visible(locator)? {
                match f(&element) {
                    Ok(Some(value)) => {
                        log::debug!("{}: matched {} via {}", spec.goal(), element, locator);
                        return Ok(Some(Found {
                            value,
                            locator: locator.clone(),
                            element,
                        }));
                    }
                    Ok(None) => {}
                    Err(e) if !e.is_recoverable() => return Err(e),
                    Err(e) => log::debug!(
                        "{}: skipping {} from {}: {}",
                        spec.goal(),
                        element,
                        locator,
                        e
                    ),
                }
            }
        }

        log::debug!(
            "{}: no candidate matched ({} tried)",
            spec.goal(),
            spec.len()
        );
        Ok(None)
    }

    /// First visible element, in candidate order, satisfying `predicate`
    pub fn try_locate(
        &self,
        spec: &LocatorSpec,
        mut predicate: impl FnMut(&ElementHandle) -> Result<bool>,
    ) -> Result<Option<Found<ElementHandle>>> {
        self.find_map(spec, |element| Ok(predicate(element)?.then_some(*element)))
    }

    /// Act on the first visible element of each candidate until an action succeeds.
    ///
    /// A failed action abandons that candidate and moves on to the next one.
    pub fn try_act<T>(
        &self,
        spec: &LocatorSpec,
        mut action: impl FnMut(&ElementHandle) -> Result<T>,
    ) -> Result<Option<Found<T>>> {
        for locator in spec.iter() {
            let Some(element) = self.visible(locator)?.into_iter().next() else {
                continue;
            };

            match action(&element) {
                Ok(value) => {
                    log::debug!("{}: acted on {} via {}", spec.goal(), element, locator);
                    return Ok(Some(Found {
                        value,
                        locator: locator.clone(),
                        element,
                    }));
                }
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) => log::debug!(
                    "{}: action on {} via {} failed: {}",
                    spec.goal(),
                    element,
                    locator,
                    e
                ),
            }
        }

        log::debug!("{}: no candidate accepted the action", spec.goal());
        Ok(None)
    }

    /// Run `f` inside each frame matched by `frames` until it produces a value.
    ///
    /// `f` owns the scope of the frame it runs in. The outer context is
    /// restored no later than when `f` returns, however it returns.
    pub fn try_in_frames<T>(
        &self,
        frames: &LocatorSpec,
        mut f: impl FnMut(FrameScope<'a>) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        for locator in frames.iter() {
            for frame in self.present(locator)? {
                let outcome = FrameScope::enter(self.page, &frame).and_then(&mut f);

                match outcome {
                    Ok(Some(value)) => return Ok(Some(value)),
                    Ok(None) => {}
                    Err(e) if !e.is_recoverable() => return Err(e),
                    Err(e) => log::debug!("{}: frame {} failed: {}", frames.goal(), frame, e),
                }
            }
        }
        Ok(None)
    }
}
