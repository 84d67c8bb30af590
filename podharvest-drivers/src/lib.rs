//! Driver layer for browser automation against a podcast directory.
//!
//! This crate owns everything that touches a live page. The collection
//! algorithm itself lives in `podharvest-core` and only sees the
//! [`rows::PageRowSource`] adapter.
//!
//! - [`harvest_browser::driver::HarvestDriver`]: WebDriver client wrapper
//! - [`harvest_browser::page::HarvestPage`]: navigation, waits, clicks and scripts
//! - [`harvest_browser::behavioral::BehavioralEngine`]: jittered pauses before interactions
//! - [`harvest_browser::profile`]: desktop profiles and Chrome arguments
//! - [`rows::PageRowSource`]: episode rows read through configurable selectors
//! - [`search::search_url`]: directory search URL construction
//! - [`diagnostics::DiagnosticCapture`]: screenshot/source capture for empty runs
pub mod diagnostics;
pub mod harvest_browser;
pub mod rows;
pub mod search;
