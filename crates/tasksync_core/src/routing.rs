//! Filter-mode routing over URL fragments.
//!
//! # Responsibility
//! - Map a route fragment (`#/active`, `/completed`, `all`) to a filter mode.
//! - Render a filter mode back into a deep link.
//!
//! # Invariants
//! - Parsing is total: unmatched input yields `FilterMode::All`.
//! - `parse_filter_route(route_for_mode(mode)) == mode` for every mode.

use crate::model::filter::FilterMode;
use once_cell::sync::Lazy;
use regex::Regex;

static FILTER_ROUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)#?/?(all|active|completed)?/?$").expect("valid filter route regex")
});

/// Parses a route fragment into a filter mode, defaulting to `All`.
pub fn parse_filter_route(path: &str) -> FilterMode {
    FILTER_ROUTE_RE
        .captures(path.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|segment| segment.as_str().parse().ok())
        .unwrap_or_default()
}

/// Deep link for one filter mode.
pub fn route_for_mode(mode: FilterMode) -> &'static str {
    match mode {
        FilterMode::All => "#/",
        FilterMode::Active => "#/active",
        FilterMode::Completed => "#/completed",
    }
}
