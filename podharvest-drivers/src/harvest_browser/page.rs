use crate::harvest_browser::{behavioral::BehavioralEngine, stealth::CORE_EVASIONS};
use anyhow::{anyhow, Result};
use fantoccini::{elements::Element, Client, Locator};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One navigated tab: waits, clicks, scripts and capture helpers.
pub struct HarvestPage {
    pub(crate) client: Client,
    pub(crate) behavioral_engine: BehavioralEngine,
    wait_timeout: Duration,
}

impl HarvestPage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(client: Client, behavioral_engine: BehavioralEngine, wait_timeout: Duration) -> Self {
        Self {
            client,
            behavioral_engine,
            wait_timeout,
        }
    }

    /// Navigate to `url` and apply the evasion script.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.behavioral_engine.jitter().await;
        self.client.goto(url).await?;
        self.client.execute(CORE_EVASIONS, vec![]).await?;
        info!(target: "browser", %url, "navigated");
        Ok(())
    }

    /// Wait until the first selector in `selectors` matches, polling all of them in order.
    pub async fn wait_for_any(&self, selectors: &[String]) -> Result<Element> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            for selector in selectors {
                match self.client.find(Locator::Css(selector)).await {
                    Ok(element) => {
                        debug!(target: "browser.selector", %selector, "selector matched");
                        return Ok(element);
                    }
                    Err(e) if e.is_no_such_element() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            if Instant::now() >= deadline {
                return Err(anyhow!(
                    "none of [{}] appeared within {:?}",
                    selectors.join(", "),
                    self.wait_timeout
                ));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for a single selector.
    pub async fn wait_for(&self, selector: &str) -> Result<Element> {
        self.wait_for_any(&[selector.to_string()]).await
    }

    /// Click the first element matching any of `selectors`.
    pub async fn click_first(&self, selectors: &[String]) -> Result<()> {
        let element = self.wait_for_any(selectors).await?;
        self.behavioral_engine.jitter().await;
        element.click().await?;
        Ok(())
    }

    /// Find one element, `None` when nothing matches.
    pub async fn find_optional(&self, selector: &str) -> Result<Option<Element>> {
        match self.client.find(Locator::Css(selector)).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Run a script in the page; `args` are exposed as `arguments[n]`.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    /// Return the full page HTML source.
    pub async fn source(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    /// PNG screenshot of the current viewport.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(self.client.screenshot().await?)
    }

    /// Return the current page URL.
    pub async fn current_url(&self) -> Result<Url> {
        Ok(self.client.current_url().await?)
    }
}
