use anyhow::{Context, Result};
use url::Url;

/// Build the directory search URL for `term`.
///
/// `path` is resolved against `base`, and the term is percent-encoded into
/// the `param` query parameter.
///
/// ```
/// use podharvest_drivers::search::search_url;
///
/// let url = search_url("https://directory.test", "/search", "q", "rust & friends").unwrap();
/// assert_eq!(url.as_str(), "https://directory.test/search?q=rust+%26+friends");
/// ```
pub fn search_url(base: &str, path: &str, param: &str, term: &str) -> Result<Url> {
    let base = Url::parse(base).with_context(|| format!("invalid site base url: {base}"))?;
    let mut url = base
        .join(path)
        .with_context(|| format!("invalid search path: {path}"))?;
    url.query_pairs_mut().append_pair(param, term.trim());
    Ok(url)
}
