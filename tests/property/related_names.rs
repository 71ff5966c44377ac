// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Device Family Names

use cim_dcim::domain::{base_name, is_family_member};
use proptest::prelude::*;

/// A family stem ending in a non-digit
fn stem() -> impl Strategy<Value = String> {
    "[a-z][a-z-]{0,10}[a-z]"
}

proptest! {
    /// Property: appending a member number to a stem yields the stem
    #[test]
    fn prop_numbered_member_yields_stem(stem in stem(), n in 0u32..10_000) {
        let name = format!("{stem}{n}");
        prop_assert_eq!(base_name(&name), Some(stem.as_str()));
    }

    /// Property: a letter suffix after a digit strips only the letter
    #[test]
    fn prop_lettered_member_keeps_digit(stem in stem(), n in 0u32..100, letter in "[a-z]") {
        let base = format!("{stem}{n}");
        let name = format!("{base}{letter}");
        prop_assert_eq!(base_name(&name), Some(base.as_str()));
    }

    /// Property: every device is a member of its own family
    #[test]
    fn prop_member_of_own_family(stem in stem(), n in 0u32..100) {
        let name = format!("{stem}{n}");
        let base = base_name(&name).unwrap();
        prop_assert!(is_family_member(base, &name));
        prop_assert!(is_family_member(base, &name.to_uppercase()));
    }

    /// Property: a base is always a non-empty proper prefix of the name
    #[test]
    fn prop_base_is_a_proper_prefix(name in "[a-zA-Z0-9-]{1,16}") {
        if let Some(base) = base_name(&name) {
            prop_assert!(!base.is_empty());
            prop_assert!(base.len() < name.len());
            prop_assert!(name.starts_with(base));
        }
    }
}
