use crate::harvest_browser::{
    behavioral::BehavioralEngine,
    page::HarvestPage,
    profile::{session_profile, UserAgentProfile},
    stealth::build_chrome_arguments,
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use podharvest_config::BrowserConfig;
use serde_json::json;
use std::time::Duration;
use tracing::info;
use webdriver::capabilities::Capabilities;

/// Thin wrapper around a `fantoccini` WebDriver client.
///
/// The WebDriver service (chromedriver or a remote grid) is expected to be
/// running already; this type only opens and closes a session on it.
pub struct HarvestDriver {
    pub client: Client,
    pub behavioral_engine: BehavioralEngine,
    pub profile: UserAgentProfile,
    wait_timeout: Duration,
}

impl HarvestDriver {
    /// Open a session on `config.webdriver_url`.
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let profile = session_profile(config);
        let args = build_chrome_arguments(&profile, config.headless);

        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .with_context(|| format!("failed to connect to WebDriver at {}", config.webdriver_url))?;

        info!(
            target: "browser",
            webdriver = %config.webdriver_url,
            headless = config.headless,
            user_agent = %profile.user_agent,
            "browser session opened"
        );

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::default(),
            profile,
            wait_timeout: Duration::from_secs(config.wait_timeout_secs.max(1)),
        })
    }

    /// Navigate to `url` and return a [`HarvestPage`] bound to this session.
    pub async fn goto(&self, url: &str) -> Result<HarvestPage> {
        let page = HarvestPage::new(
            self.client.clone(),
            self.behavioral_engine.clone(),
            self.wait_timeout,
        );
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        info!(target: "browser", "browser session closed");
        Ok(())
    }
}
