//! Merges per-step results into one document.

use switchboard_common::SubResult;

pub const EMPTY_PLACEHOLDER: &str = "No results to consolidate.";
const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// A single result is returned as-is, failed or not. Otherwise only
/// successful, non-empty results contribute a titled section.
pub fn merge(results: &[SubResult]) -> String {
    match results {
        [] => EMPTY_PLACEHOLDER.to_string(),
        [only] => only.content.clone(),
        _ => results
            .iter()
            .filter(|r| r.success && !r.content.is_empty())
            .map(|r| {
                format!(
                    "## {} ({})\n\n{}",
                    r.request.category.title(),
                    r.provider_display_name(),
                    r.content
                )
            })
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR),
    }
}
