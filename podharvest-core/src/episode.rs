use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalizer::normalize_date;

/// One episode row as read from the page, before date normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEpisodeRecord {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub raw_date: Option<String>,
    #[serde(default)]
    pub share_url: Option<String>,
}

impl RawEpisodeRecord {
    /// Build a record from extracted fields.
    ///
    /// Returns `None` when the title is missing or blank; such rows carry no
    /// identity and are skipped by the collector. Optional fields are trimmed
    /// and blank values collapse to `None`.
    ///
    /// ```
    /// use podharvest_core::RawEpisodeRecord;
    ///
    /// let rec = RawEpisodeRecord::new("  Pilot ", Some(" "), Some("14 Nov 2024"), None).unwrap();
    /// assert_eq!(rec.title, "Pilot");
    /// assert_eq!(rec.description, None);
    /// assert!(RawEpisodeRecord::new("   ", None, None, None).is_none());
    /// ```
    pub fn new(
        title: &str,
        description: Option<&str>,
        raw_date: Option<&str>,
        share_url: Option<&str>,
    ) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            description: non_blank(description),
            raw_date: non_blank(raw_date),
            share_url: non_blank(share_url),
        })
    }

    /// Consume the raw record and produce its normalised counterpart.
    pub fn normalize(self, now: DateTime<Utc>) -> NormalizedEpisodeRecord {
        let canonical = normalize_date(self.raw_date.as_deref(), now);
        NormalizedEpisodeRecord {
            title: self.title,
            description: self.description,
            date: canonical.full,
            date_iso: canonical.iso,
            share_url: self.share_url,
        }
    }
}

/// Episode record handed to sinks.
///
/// Serialises as a flat object with the keys `title`, `description`, `date`,
/// `dateISO` and `shareUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEpisodeRecord {
    pub title: String,
    pub description: Option<String>,
    /// Long form such as "14 November 2024", or the raw text when it could not be parsed.
    pub date: Option<String>,
    #[serde(rename = "dateISO")]
    pub date_iso: Option<String>,
    #[serde(rename = "shareUrl")]
    pub share_url: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn normalised_record_uses_external_key_names() {
        let now = Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap();
        let rec = RawEpisodeRecord::new(
            "Episode 12",
            Some("We talk about lifetimes"),
            Some("14 Nov 2024"),
            Some("https://example.com/e/12"),
        )
        .unwrap()
        .normalize(now);

        assert_eq!(
            serde_json::to_value(&rec).unwrap(),
            json!({
                "title": "Episode 12",
                "description": "We talk about lifetimes",
                "date": "14 November 2024",
                "dateISO": "2024-11-14",
                "shareUrl": "https://example.com/e/12",
            })
        );
    }

    #[test]
    fn absent_fields_serialise_as_null() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let rec = RawEpisodeRecord::new("Bonus", None, None, None)
            .unwrap()
            .normalize(now);
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v["description"].is_null());
        assert!(v["date"].is_null());
        assert!(v["dateISO"].is_null());
        assert!(v["shareUrl"].is_null());
    }
}
