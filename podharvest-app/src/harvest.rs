use anyhow::{Context, Result};
use chrono::Utc;
use podharvest_config::{CollectorConfig, PodharvestConfig};
use podharvest_core::{
    normalize_records, CollectOutcome, Collector, CollectorSettings, NormalizedEpisodeRecord,
    StopReason,
};
use podharvest_drivers::diagnostics::DiagnosticCapture;
use podharvest_drivers::harvest_browser::driver::HarvestDriver;
use podharvest_drivers::harvest_browser::page::HarvestPage;
use podharvest_drivers::rows::PageRowSource;
use podharvest_drivers::search::search_url;
use std::time::Duration;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Outcome of one scrape run.
#[derive(Debug)]
pub struct HarvestReport {
    pub run_id: Uuid,
    pub records: Vec<NormalizedEpisodeRecord>,
    pub iterations: u32,
    pub stop: StopReason,
}

pub fn collector_settings(cfg: &CollectorConfig) -> CollectorSettings {
    CollectorSettings {
        max_stable_attempts: cfg.max_stable_attempts,
        settle_delay: Duration::from_millis(cfg.settle_delay_ms),
    }
}

/// Search for `term`, open its episode list and collect up to `collector.limit` episodes.
///
/// The browser session is closed on every path once it has been opened.
pub async fn run(cfg: &PodharvestConfig, term: &str) -> Result<HarvestReport> {
    let run_id = Uuid::new_v4();
    let span = info_span!("harvest", %run_id, term);

    async move {
        let driver = HarvestDriver::connect(&cfg.browser).await?;
        let result = scrape(&driver, cfg, term, run_id).await;
        if let Err(e) = driver.close().await {
            warn!(target: "app", error = %e, "closing browser session failed");
        }
        result
    }
    .instrument(span)
    .await
}

async fn scrape(
    driver: &HarvestDriver,
    cfg: &PodharvestConfig,
    term: &str,
    run_id: Uuid,
) -> Result<HarvestReport> {
    let url = search_url(
        &cfg.site.base_url,
        &cfg.site.search_path,
        &cfg.site.search_param,
        term,
    )?;
    let page = driver.goto(url.as_str()).await?;

    if let Err(e) = open_episode_list(&page, cfg).await {
        capture_diagnostics(&page, cfg, run_id, "episode list could not be opened").await;
        return Err(e);
    }

    let base = page.current_url().await.ok();
    let mut source = PageRowSource::new(&page, &cfg.site, base);
    let collector = Collector::new(collector_settings(&cfg.collector));
    let CollectOutcome {
        records,
        iterations,
        stop,
    } = collector.collect(&mut source, cfg.collector.limit).await;

    if records.is_empty() {
        warn!(target: "app", "no episodes collected");
        capture_diagnostics(&page, cfg, run_id, "no episodes collected").await;
    }

    let records = normalize_records(records, Utc::now());
    info!(target: "app", count = records.len(), iterations, ?stop, "episodes normalised");

    Ok(HarvestReport {
        run_id,
        records,
        iterations,
        stop,
    })
}

async fn open_episode_list(page: &HarvestPage, cfg: &PodharvestConfig) -> Result<()> {
    page.click_first(&cfg.site.result_selectors)
        .await
        .context("no podcast in search results")?;
    page.click_first(&cfg.site.reveal_selectors)
        .await
        .context("episode list control not found")?;
    // A missing container is not fatal: the collector's viewport scroll may still render it.
    if let Err(e) = page.wait_for(&cfg.site.list_selector).await {
        warn!(target: "app", error = %e, "episode list container not visible yet");
    }
    Ok(())
}

async fn capture_diagnostics(page: &HarvestPage, cfg: &PodharvestConfig, run_id: Uuid, reason: &str) {
    if !cfg.diagnostics.enabled {
        return;
    }
    let capture = DiagnosticCapture::new(&cfg.diagnostics.dir);
    if let Err(e) = capture.capture(page, run_id, reason).await {
        warn!(target: "app", error = %e, "diagnostic capture failed");
    }
}
