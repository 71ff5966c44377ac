// Copyright (c) 2025 - Cowboy AI, Inc.
//! Related Device Naming Heuristic
//!
//! Devices racked together are usually named as a family (`core-switch1`,
//! `core-switch2`, `dist-switch3a`, `dist-switch3b`). Stripping the member
//! suffix yields a base name that groups them for cross-linking. False
//! positives and negatives are acceptable.

/// Derive the family base name of a device name
///
/// # Rules
/// - Trailing decimal run with at least one character before it: strip the run
///   (`core-switch1` → `core-switch`)
/// - Otherwise a single trailing letter preceded by a digit, with at least one
///   character before that digit: strip the letter (`dist-switch3a` → `dist-switch3`)
/// - Otherwise, or if the result would be empty: no base name
pub fn base_name(name: &str) -> Option<&str> {
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() < name.len() {
        // `name` had a trailing digit run; `.+` before it must be non-empty.
        return (!trimmed.is_empty()).then_some(trimmed);
    }

    let mut chars = name.char_indices().rev();
    let (letter_at, letter) = chars.next()?;
    let (_, digit) = chars.next()?;
    let has_lead = chars.next().is_some();

    if letter.is_ascii_alphabetic() && digit.is_ascii_digit() && has_lead {
        Some(&name[..letter_at])
    } else {
        None
    }
}

/// Whether `candidate` belongs to the family identified by `base`
pub fn is_family_member(base: &str, candidate: &str) -> bool {
    candidate
        .get(..base.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("core-switch1", Some("core-switch") ; "trailing digit")]
    #[test_case("core-switch12", Some("core-switch") ; "trailing digit run")]
    #[test_case("dist-switch3a", Some("dist-switch3") ; "letter after digit")]
    #[test_case("Dist-Switch3B", Some("Dist-Switch3") ; "uppercase letter after digit")]
    #[test_case("router", None ; "no suffix")]
    #[test_case("rack3ab", None ; "two trailing letters")]
    #[test_case("42", None ; "all digits leaves empty base")]
    #[test_case("7", None ; "single digit")]
    #[test_case("3a", None ; "nothing before digit")]
    #[test_case("", None ; "empty")]
    fn test_base_name(name: &str, expected: Option<&str>) {
        assert_eq!(base_name(name), expected);
    }

    #[test]
    fn test_family_membership_is_case_insensitive() {
        assert!(is_family_member("core-switch", "CORE-SWITCH2"));
        assert!(is_family_member("core-switch", "core-switch"));
        assert!(!is_family_member("core-switch", "core-sw"));
        assert!(!is_family_member("core-switch", "edge-switch1"));
    }
}
