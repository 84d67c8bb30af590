use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::harvest_browser::page::HarvestPage;

/// Metadata written next to the captured screenshot and page source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticManifest {
    pub run_id: Uuid,
    pub reason: String,
    pub url: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub html_checksum: Option<String>,
    pub screenshot: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

/// Writes `<run_id>.png`, `<run_id>.html` and `<run_id>.json` into a directory.
#[derive(Debug, Clone)]
pub struct DiagnosticCapture {
    dir: PathBuf,
}

impl DiagnosticCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Capture whatever the page can still give us. Individual capture
    /// failures are logged; only directory and manifest I/O errors are returned.
    pub async fn capture(&self, page: &HarvestPage, run_id: Uuid, reason: &str) -> Result<DiagnosticManifest> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create diagnostics dir {}", self.dir.display()))?;

        let url = match page.current_url().await {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!(target: "diagnostics", error = %e, "could not read page url");
                None
            }
        };

        let screenshot = match page.screenshot().await {
            Ok(png) => Some(self.write_artifact(run_id, "png", &png)?),
            Err(e) => {
                warn!(target: "diagnostics", error = %e, "screenshot failed");
                None
            }
        };

        let (html, html_checksum) = match page.source().await {
            Ok(source) => (
                Some(self.write_artifact(run_id, "html", source.as_bytes())?),
                Some(html_checksum(&source)),
            ),
            Err(e) => {
                warn!(target: "diagnostics", error = %e, "page source unavailable");
                (None, None)
            }
        };

        let manifest = DiagnosticManifest {
            run_id,
            reason: reason.to_string(),
            url,
            captured_at: Utc::now(),
            html_checksum,
            screenshot,
            html,
        };
        self.write_artifact(run_id, "json", &serde_json::to_vec_pretty(&manifest)?)?;

        info!(target: "diagnostics", %run_id, dir = %self.dir.display(), %reason, "diagnostics captured");
        Ok(manifest)
    }

    fn write_artifact(&self, run_id: Uuid, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.artifact_path(run_id, extension);
        std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    fn artifact_path(&self, run_id: Uuid, extension: &str) -> PathBuf {
        self.dir.join(format!("{run_id}.{extension}"))
    }
}

/// BLAKE3 hex digest of the captured page source.
pub fn html_checksum(html: &str) -> String {
    blake3::hash(html.as_bytes()).to_hex().to_string()
}
