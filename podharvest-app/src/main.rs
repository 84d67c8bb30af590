use anyhow::Result;
use clap::Parser;
use harvest::HarvestReport;
use podharvest_common::OutputFormat;
use podharvest_common::observability::{LogConfig, LogFormat, init_logging};
use podharvest_config::{PodharvestConfig, PodharvestConfigLoader, default_config_path};
use podharvest_core::{JsonSink, RecordSink};
use std::path::PathBuf;
use tracing::info;
mod harvest;

/// Scrape episode metadata for a podcast from a directory site.
#[derive(Debug, Parser)]
#[command(name = "podharvest", version)]
struct Cli {
    /// Podcast to search for.
    search_term: String,

    /// Maximum number of episodes to return.
    #[arg(short, long)]
    limit: Option<usize>,

    /// Configuration file (YAML/TOML/JSON). Defaults to `podharvest.yaml` in the
    /// working directory and the user config dir, when present.
    #[arg(short, long, env = "PODHARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Write records here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// `json` (array) or `jsonl` (one object per line).
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,
}

impl Cli {
    /// Command-line flags take precedence over every configuration source.
    fn apply(&self, cfg: &mut PodharvestConfig) {
        if let Some(limit) = self.limit {
            cfg.collector.limit = limit;
        }
        if let Some(output) = &self.output {
            cfg.output.path = Some(output.clone());
        }
        if let Some(format) = self.format {
            cfg.output.format = format;
        }
        if self.headed {
            cfg.browser.headless = false;
        }
    }

    fn load_config(&self) -> Result<PodharvestConfig> {
        let loader = match &self.config {
            Some(path) => PodharvestConfigLoader::new().with_file(path),
            None => {
                let mut loader = PodharvestConfigLoader::new();
                if let Some(user) = default_config_path() {
                    loader = loader.with_optional_file(user);
                }
                loader.with_optional_file("podharvest.yaml")
            }
        };
        let mut cfg = loader.load()?;
        self.apply(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }
}

fn emit(cfg: &PodharvestConfig, report: &HarvestReport) -> Result<()> {
    match &cfg.output.path {
        Some(path) => JsonSink::create(path, cfg.output.format)?.emit(&report.records)?,
        None => JsonSink::stdout(cfg.output.format).emit(&report.records)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    let log_path = init_logging(LogConfig {
        app_name: "podharvest",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: if cfg.logging.json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        default_filter: cfg.logging.filter.clone(),
    })?;
    info!(target: "app", log = %log_path.display(), term = %cli.search_term, "starting");

    let report = harvest::run(&cfg, &cli.search_term).await?;
    emit(&cfg, &report)?;

    info!(
        target: "app",
        run_id = %report.run_id,
        count = report.records.len(),
        stop = ?report.stop,
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "podharvest",
            "Serial",
            "--limit",
            "5",
            "--format",
            "jsonl",
            "--output",
            "out.jsonl",
            "--headed",
        ]);
        let mut cfg = PodharvestConfig::default();
        cli.apply(&mut cfg);

        assert_eq!(cli.search_term, "Serial");
        assert_eq!(cfg.collector.limit, 5);
        assert_eq!(cfg.output.format, OutputFormat::JsonLines);
        assert_eq!(cfg.output.path, Some(PathBuf::from("out.jsonl")));
        assert!(!cfg.browser.headless);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = Cli::parse_from(["podharvest", "Serial"]);
        let mut cfg = PodharvestConfig::default();
        cfg.collector.limit = 9;
        cli.apply(&mut cfg);

        assert_eq!(cfg.collector.limit, 9);
        assert!(cfg.browser.headless);
        assert!(cfg.output.path.is_none());
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["podharvest", "Serial", "--format", "csv"]).is_err());
    }
}
