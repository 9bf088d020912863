//! Location extraction from free-text queries

use tracing::field::Empty;

/// Returned when no known city appears in the query
pub const FALLBACK_LOCATION: &str = "other";

/// Lowercase needle and display name, checked in order
pub const KNOWN_CITIES: [(&str, &str); 8] = [
    ("seattle", "Seattle"),
    ("miami", "Miami"),
    ("san francisco", "San Francisco"),
    ("new york", "New York"),
    ("chicago", "Chicago"),
    ("boston", "Boston"),
    ("denver", "Denver"),
    ("atlanta", "Atlanta"),
];

/// Name of the first known city mentioned in `user_input`, or `"other"`.
///
/// Runs inside a `location_extraction` span recording the result and the
/// query length in characters.
pub fn extract_location(user_input: &str) -> &'static str {
    let span = tracing::info_span!(
        "location_extraction",
        extracted.location = Empty,
        query.length = user_input.chars().count(),
        otel.status_code = Empty,
    );
    let _enter = span.enter();

    let lowered = user_input.to_lowercase();
    let location = KNOWN_CITIES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, name)| *name)
        .unwrap_or(FALLBACK_LOCATION);

    span.record("extracted.location", location);

    if location != FALLBACK_LOCATION {
        tracing::info!(location, "location_found");
    } else {
        tracing::info!("location_not_found");
    }
    span.record("otel.status_code", "OK");

    location
}
