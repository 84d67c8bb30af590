use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use podharvest_common::{OutputFormat, Result};

use crate::episode::NormalizedEpisodeRecord;

/// Destination for the final, ordered episode list.
pub trait RecordSink {
    fn emit(&mut self, records: &[NormalizedEpisodeRecord]) -> Result<()>;
}

/// Writes records as JSON to any [`Write`] implementation.
pub struct JsonSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonSink<BufWriter<io::Stdout>> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(BufWriter::new(io::stdout()), format)
    }
}

impl JsonSink<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: impl AsRef<Path>, format: OutputFormat) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(BufWriter::new(File::create(path)?), format))
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn emit(&mut self, records: &[NormalizedEpisodeRecord]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, records)?;
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                for record in records {
                    serde_json::to_writer(&mut self.writer, record)?;
                    writeln!(self.writer)?;
                }
            }
        }
        self.writer.flush()?;
        tracing::info!(target: "sink", count = records.len(), format = ?self.format, "records emitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn record(title: &str) -> NormalizedEpisodeRecord {
        NormalizedEpisodeRecord {
            title: title.to_string(),
            description: None,
            date: Some("14 November 2024".to_string()),
            date_iso: Some("2024-11-14".to_string()),
            share_url: None,
        }
    }

    #[test]
    fn json_array_preserves_order() {
        let mut sink = JsonSink::new(Vec::new(), OutputFormat::Json);
        sink.emit(&[record("first"), record("second")]).unwrap();

        let parsed: Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "first");
        assert_eq!(items[1]["dateISO"], "2024-11-14");
    }

    #[test]
    fn empty_list_is_an_empty_array() {
        let mut sink = JsonSink::new(Vec::new(), OutputFormat::Json);
        sink.emit(&[]).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.trim(), "[]");
    }

    #[test]
    fn json_lines_writes_one_object_per_line() {
        let mut sink = JsonSink::new(Vec::new(), OutputFormat::JsonLines);
        sink.emit(&[record("a"), record("b"), record("c")]).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let titles: Vec<String> = text
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["title"].to_string())
            .collect();
        assert_eq!(titles, vec!["\"a\"", "\"b\"", "\"c\""]);
    }

    #[test]
    fn file_sink_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("episodes.json");

        let mut sink = JsonSink::create(&path, OutputFormat::Json).unwrap();
        sink.emit(&[record("only")]).unwrap();
        drop(sink);

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[0]["title"], "only");
    }
}
