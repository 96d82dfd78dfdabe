//! Text normalization and name similarity.

use rapidfuzz::distance::jaro_winkler;

/// Normalizes text for comparison by lowercasing and replacing separators with spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.', '/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Distance between two column names: `1 - Jaro-Winkler` of the normalized names.
///
/// Ranges from 0.0 (same normalized name) to 1.0.
pub fn name_distance(left: &str, right: &str) -> f64 {
    let similarity = jaro_winkler::similarity(
        normalize_text(left).chars(),
        normalize_text(right).chars(),
    );
    (1.0 - similarity).clamp(0.0, 1.0)
}
