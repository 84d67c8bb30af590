//! Production [`RowSource`] backed by a WebDriver page.
//!
//! Field lookup is best-effort: every field has a list of selectors tried in
//! order, and the first non-empty match wins. A row whose title cannot be
//! found yields no record; WebDriver errors (stale elements and the like)
//! fail only that row.
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use fantoccini::{elements::Element, Locator};
use podharvest_config::SiteConfig;
use podharvest_core::{RawEpisodeRecord, RowSource};
use tracing::trace;
use url::Url;

use crate::harvest_browser::page::HarvestPage;

const SCROLL_ROW_INTO_VIEW: &str = "arguments[0].scrollIntoView({block: 'end'});";
const SCROLL_ONE_SCREEN: &str = "window.scrollBy(0, window.innerHeight);";

/// Reads episode rows from the list container described by a [`SiteConfig`].
pub struct PageRowSource<'a> {
    page: &'a HarvestPage,
    site: &'a SiteConfig,
    /// Base for resolving relative share links.
    base: Option<Url>,
}

impl<'a> PageRowSource<'a> {
    pub fn new(page: &'a HarvestPage, site: &'a SiteConfig, base: Option<Url>) -> Self {
        Self { page, site, base }
    }

    fn resolve_link(&self, href: &str) -> String {
        resolve_link(self.base.as_ref(), href)
    }
}

#[async_trait]
impl RowSource for PageRowSource<'_> {
    type Row = Element;

    async fn rows(&mut self) -> Result<Vec<Element>> {
        let Some(container) = self.page.find_optional(&self.site.list_selector).await? else {
            return Ok(Vec::new());
        };
        Ok(container
            .find_all(Locator::Css(&self.site.row_selector))
            .await?)
    }

    async fn extract(&mut self, row: &Element) -> Result<Option<RawEpisodeRecord>> {
        let Some(title) = first_text(row, &self.site.title_selectors).await? else {
            trace!(target: "browser.rows", "row without title");
            return Ok(None);
        };
        let description = first_text(row, &self.site.description_selectors).await?;
        let raw_date = match first_text(row, &self.site.date_selectors).await? {
            Some(text) => Some(text),
            None => first_attr(row, &self.site.date_selectors, "datetime").await?,
        };
        let share_url = first_attr(row, &self.site.link_selectors, "href")
            .await?
            .map(|href| self.resolve_link(&href));

        Ok(RawEpisodeRecord::new(
            &title,
            description.as_deref(),
            raw_date.as_deref(),
            share_url.as_deref(),
        ))
    }

    async fn scroll_into_view(&mut self, row: &Element) -> Result<()> {
        let arg = serde_json::to_value(row)?;
        self.page.execute(SCROLL_ROW_INTO_VIEW, vec![arg]).await?;
        Ok(())
    }

    async fn scroll_viewport(&mut self) -> Result<()> {
        self.page.execute(SCROLL_ONE_SCREEN, vec![]).await?;
        Ok(())
    }

    async fn settle(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Visible text of the first selector that matches with non-blank text.
async fn first_text(row: &Element, selectors: &[String]) -> Result<Option<String>> {
    for selector in selectors {
        let Some(element) = find_child(row, selector).await? else {
            continue;
        };
        let text = element.text().await?;
        if !text.trim().is_empty() {
            return Ok(Some(text.trim().to_string()));
        }
    }
    Ok(None)
}

/// Attribute value of the first selector whose element carries a non-blank `attr`.
async fn first_attr(row: &Element, selectors: &[String], attr: &str) -> Result<Option<String>> {
    for selector in selectors {
        let Some(element) = find_child(row, selector).await? else {
            continue;
        };
        if let Some(value) = element.attr(attr).await? {
            if !value.trim().is_empty() {
                return Ok(Some(value.trim().to_string()));
            }
        }
    }
    Ok(None)
}

async fn find_child(row: &Element, selector: &str) -> Result<Option<Element>> {
    match row.find(Locator::Css(selector)).await {
        Ok(element) => Ok(Some(element)),
        Err(e) if e.is_no_such_element() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    match base.map(|b| b.join(href)) {
        Some(Ok(url)) => url.to_string(),
        _ => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_resolve_against_page() {
        let base = Url::parse("https://directory.test/podcast/123").unwrap();
        assert_eq!(
            resolve_link(Some(&base), "/episode/9?share=1"),
            "https://directory.test/episode/9?share=1"
        );
    }

    #[test]
    fn absolute_links_are_kept() {
        let base = Url::parse("https://directory.test/podcast/123").unwrap();
        assert_eq!(
            resolve_link(Some(&base), "https://cdn.test/e/9"),
            "https://cdn.test/e/9"
        );
    }

    #[test]
    fn without_base_href_is_returned_verbatim() {
        assert_eq!(resolve_link(None, "/episode/9"), "/episode/9");
    }
}
