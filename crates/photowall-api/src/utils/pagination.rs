//! Query parameter parsing for catalog listing.
//!
//! Bad values fall back to defaults instead of failing the request.

use serde::Deserialize;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

/// Raw listing query. Values stay strings so unparsable input can fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page_alias: Option<String>,
}

impl ListQuery {
    /// `(page, per_page)` after defaults and clamping.
    pub fn resolve(&self) -> (usize, usize) {
        let page = parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let per_page = parse_positive(self.per_page.as_deref().or(self.per_page_alias.as_deref()))
            .unwrap_or(DEFAULT_PER_PAGE)
            .min(MAX_PER_PAGE);
        (page, per_page)
    }
}

fn parse_positive(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v >= 1)
}
