// src/utils/slug.rs
use crate::models::ServiceError;
use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_SLUG_LENGTH: usize = 50;
const FALLBACK_SLUG: &str = "untitled";

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^a-z0-9]+").expect("valid slug regex");
}

/// Turn a display name into a URL-safe slug.
///
/// "Music Festival 2024!" becomes "music-festival-2024".
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let hyphenated = NON_ALPHANUMERIC.replace_all(&lowered, "-");
    let trimmed = hyphenated.trim_matches('-');

    // Only ASCII survives the regex, so byte truncation is safe
    let truncated = if trimmed.len() > MAX_SLUG_LENGTH {
        trimmed[..MAX_SLUG_LENGTH].trim_end_matches('-')
    } else {
        trimmed
    };

    if truncated.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        truncated.to_string()
    }
}

/// Slugify `name`, then append `-1`, `-2`, ... until `exists` reports no collision.
pub fn unique_slug<F>(name: &str, mut exists: F) -> Result<String, ServiceError>
where
    F: FnMut(&str) -> Result<bool, ServiceError>,
{
    let base = slugify(name);
    if !exists(&base)? {
        return Ok(base);
    }

    let mut suffix = 1u32;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slugify_strips_punctuation() {
        assert_eq!(slugify("Music Festival 2024!"), "music-festival-2024");
    }

    #[test]
    fn slugify_collapses_runs_and_trims() {
        assert_eq!(slugify("  --Rust &&  Friends--  "), "rust-friends");
        assert_eq!(slugify("Café Meetup"), "caf-meetup");
    }

    #[test]
    fn slugify_falls_back_for_empty_names() {
        assert_eq!(slugify("!!!"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn slugify_truncates_without_trailing_hyphen() {
        let name = format!("{} {}", "a".repeat(49), "b".repeat(10));
        let slug = slugify(&name);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert_eq!(slug, "a".repeat(49));
    }

    #[test]
    fn unique_slug_appends_counter_on_collision() {
        let taken: HashSet<&str> = ["team-sync", "team-sync-1"].into_iter().collect();
        let slug = unique_slug("Team Sync", |candidate| Ok(taken.contains(candidate))).unwrap();
        assert_eq!(slug, "team-sync-2");
    }

    #[test]
    fn unique_slug_propagates_lookup_errors() {
        let result = unique_slug("Anything", |_| Err(ServiceError::InternalServerError));
        assert_eq!(result, Err(ServiceError::InternalServerError));
    }
}
