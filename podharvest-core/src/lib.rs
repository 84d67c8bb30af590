//! Episode collection and date normalisation.
//!
//! - [`collector`]: the incremental scroll-and-extract loop over a [`collector::RowSource`]
//! - [`normalizer`]: pure conversion of human date strings into canonical dates
//! - [`episode`]: raw and normalised episode records
//! - [`sink`]: emission of the final ordered list
pub mod collector;
pub mod episode;
pub mod normalizer;
pub mod sink;

pub use collector::{CollectOutcome, Collector, CollectorSettings, RowSource, StopReason};
pub use episode::{NormalizedEpisodeRecord, RawEpisodeRecord};
pub use normalizer::{normalize_date, normalize_records, CanonicalDate};
pub use sink::{JsonSink, RecordSink};
