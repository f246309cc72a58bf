//! Keyword classification of task text.

use std::collections::HashMap;
use switchboard_common::TaskCategory;

use crate::profiles::{profiles, CategoryProfile};

fn matches(profile: &CategoryProfile, text: &str) -> usize {
    profile
        .patterns
        .iter()
        .map(|re| re.find_iter(text).count())
        .sum()
}

/// Match count per category. The catch-all category always scores zero.
pub fn score(text: &str) -> HashMap<TaskCategory, usize> {
    profiles()
        .iter()
        .map(|profile| (profile.category, matches(profile, text)))
        .collect()
}

/// Highest scoring category; ties go to the earliest declared one.
pub fn detect_primary(text: &str) -> TaskCategory {
    let mut best = TaskCategory::General;
    let mut best_score = 0;

    for profile in profiles() {
        let s = matches(profile, text);
        if s > best_score {
            best = profile.category;
            best_score = s;
        }
    }

    best
}

/// Every category with at least one match, in declaration order.
pub fn detect_all(text: &str) -> Vec<TaskCategory> {
    let detected: Vec<TaskCategory> = profiles()
        .iter()
        .filter(|profile| profile.patterns.iter().any(|re| re.is_match(text)))
        .map(|profile| profile.category)
        .collect();

    if detected.is_empty() {
        vec![TaskCategory::General]
    } else {
        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_counts_every_occurrence() {
        let scores = score("Fix the bug, then fix the other bug");
        assert_eq!(scores[&TaskCategory::Debugging], 4);
        assert_eq!(scores[&TaskCategory::General], 0);
    }

    #[test]
    fn primary_prefers_strictly_higher_score() {
        assert_eq!(
            detect_primary("implement the code for this function"),
            TaskCategory::Coding
        );
    }

    #[test]
    fn primary_tie_goes_to_first_declared() {
        // one architecture match, one coding match
        assert_eq!(detect_primary("design and implement"), TaskCategory::Architecture);
    }

    #[test]
    fn unmatched_text_is_general() {
        assert_eq!(detect_primary("hello there"), TaskCategory::General);
        assert_eq!(detect_all("hello there"), vec![TaskCategory::General]);
    }

    #[test]
    fn detect_all_uses_declaration_order() {
        assert_eq!(
            detect_all("implement authentication after you design the API"),
            vec![TaskCategory::Architecture, TaskCategory::Coding]
        );
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(detect_all("DEBUG THIS"), vec![TaskCategory::Debugging]);
    }
}
