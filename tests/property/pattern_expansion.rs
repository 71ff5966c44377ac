// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Name Pattern Expansion

use cim_dcim::{expand_pattern, NamePattern};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Literal text that never contains brackets
fn literal() -> impl Strategy<Value = String> {
    "[a-z/:.-]{0,4}"
}

/// A small ascending range
fn range() -> impl Strategy<Value = (u32, u32)> {
    (0u32..50, 0u32..6).prop_map(|(low, width)| (low, low + width))
}

/// A template of one to three ranges separated by literals
fn template() -> impl Strategy<Value = (String, Vec<(u32, u32)>)> {
    (literal(), prop::collection::vec((range(), literal()), 1..=3)).prop_map(|(lead, parts)| {
        let mut template = lead;
        let mut ranges = Vec::new();
        for ((low, high), tail) in parts {
            template.push_str(&format!("[{low}-{high}]{tail}"));
            ranges.push((low, high));
        }
        (template, ranges)
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: the expansion count is the product of the range widths
    #[test]
    fn prop_count_is_product_of_widths((template, ranges) in template()) {
        let names = expand_pattern(&template).unwrap();
        let expected: usize = ranges.iter().map(|(lo, hi)| (hi - lo + 1) as usize).product();

        prop_assert_eq!(names.len(), expected);
        prop_assert_eq!(NamePattern::new(template).unwrap().len(), expected);
    }

    /// Property: a template without brackets expands to itself
    #[test]
    fn prop_literal_expands_to_itself(text in "[a-zA-Z0-9/:.-]{1,16}") {
        prop_assert_eq!(expand_pattern(&text).unwrap(), vec![text.clone()]);
    }

    /// Property: a single range yields every value in ascending order
    #[test]
    fn prop_single_range_is_ascending(prefix in literal(), (low, high) in range()) {
        let names = expand_pattern(&format!("{prefix}[{low}-{high}]")).unwrap();
        let expected: Vec<String> = (low..=high).map(|i| format!("{prefix}{i}")).collect();
        prop_assert_eq!(names, expected);
    }

    /// Property: the leftmost range varies slowest
    #[test]
    fn prop_outer_range_varies_slowest((a_lo, a_hi) in range(), (b_lo, b_hi) in range()) {
        let names = expand_pattern(&format!("xe-[{a_lo}-{a_hi}]/[{b_lo}-{b_hi}]")).unwrap();
        let mut expected = Vec::new();
        for a in a_lo..=a_hi {
            for b in b_lo..=b_hi {
                expected.push(format!("xe-{a}/{b}"));
            }
        }
        prop_assert_eq!(names, expected);
    }

    /// Property: ranges separated by a literal never produce duplicate names
    #[test]
    fn prop_separated_ranges_are_distinct((a_lo, a_hi) in range(), (b_lo, b_hi) in range()) {
        let names = expand_pattern(&format!("[{a_lo}-{a_hi}]/[{b_lo}-{b_hi}]")).unwrap();
        let unique: HashSet<&String> = names.iter().collect();
        prop_assert_eq!(unique.len(), names.len());
    }

    /// Property: a descending range is always rejected
    #[test]
    fn prop_descending_range_rejected(high in 0u32..1000, gap in 1u32..1000) {
        let low = high + gap;
        let template = format!("eth[{low}-{high}]");
        prop_assert!(expand_pattern(&template).is_err());
    }
}
