//! Location helpers for deciding what counts as a trackable page context.

use url::Url;

/// Returns true for locations the engine is willing to track (http/https).
///
/// Anything unparseable degrades to "not trackable" rather than an error.
pub fn is_network_location(location: &str) -> bool {
    match Url::parse(location) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Compares two locations, ignoring any `#fragment`.
///
/// An empty location only matches another empty location.
pub fn locations_match_ignoring_fragment(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return left.is_empty() && right.is_empty();
    }

    match (Url::parse(left), Url::parse(right)) {
        (Ok(mut left), Ok(mut right)) => {
            left.set_fragment(None);
            right.set_fragment(None);
            left == right
        }
        _ => strip_fragment(left) == strip_fragment(right),
    }
}

fn strip_fragment(location: &str) -> &str {
    location
        .split_once('#')
        .map(|(head, _)| head)
        .unwrap_or(location)
}
