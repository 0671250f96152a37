// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wildcard syntax validation and matching, shared by [`super::validate`],
//! [`super::matches`], and [`super::TopicConfig::new`].

/// Collects every wildcard-syntax violation in `filter`. Empty when the
/// filter is valid. Validators that call this never short-circuit on the
/// first violation found.
pub(super) fn violations(filter: &str) -> Vec<String> {
    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len().saturating_sub(1);
    let mut out = Vec::new();

    for (index, level) in levels.iter().enumerate() {
        if level.is_empty() {
            if index != 0 && index != last {
                out.push(format!("empty topic level at position {index}"));
            }
        } else if level.contains('#') {
            if *level != "#" {
                out.push(format!(
                    "'#' must stand alone in its level (found {level:?})"
                ));
            } else if index != last {
                out.push("'#' wildcard must be the final level".to_string());
            }
        } else if level.contains('+') && *level != "+" {
            out.push(format!(
                "'+' must stand alone in its level (found {level:?})"
            ));
        }
    }

    out
}

/// Walks pattern and topic levels in lockstep.
pub(super) fn matches_levels(pattern: &[&str], topic: &[&str]) -> bool {
    match pattern.first() {
        None => topic.is_empty(),
        Some(&"#") => true,
        Some(&"+") => {
            !topic.is_empty() && !topic[0].is_empty() && matches_levels(&pattern[1..], &topic[1..])
        }
        Some(level) => {
            !topic.is_empty() && topic[0] == *level && matches_levels(&pattern[1..], &topic[1..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_violations_for_plain_topic() {
        assert!(violations("a/b/c").is_empty());
    }

    #[test]
    fn leading_and_trailing_slash_allowed() {
        assert!(violations("/a/b").is_empty());
        assert!(violations("a/b/").is_empty());
    }

    #[test]
    fn hash_must_be_terminal() {
        assert!(!violations("a/#/b").is_empty());
        assert!(violations("a/#").is_empty());
    }

    #[test]
    fn hash_must_stand_alone() {
        assert!(!violations("a/b#").is_empty());
    }

    #[test]
    fn plus_must_stand_alone() {
        assert!(!violations("a/+x").is_empty());
        assert!(violations("a/+/b").is_empty());
    }

    #[test]
    fn middle_empty_level_is_illegal() {
        assert!(!violations("a//b").is_empty());
    }

    #[test]
    fn plus_does_not_match_empty_level() {
        assert!(!matches_levels(&["a", "+", "b"], &["a", "", "b"]));
    }
}
