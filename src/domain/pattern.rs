// Copyright (c) 2025 - Cowboy AI, Inc.
//! Name Pattern Value Object with Range Expansion
//!
//! A name pattern describes a batch of physically sequential port names using
//! bracketed numeric ranges:
//!
//! ```text
//! ge-0/0/[0-3]      → ge-0/0/0, ge-0/0/1, ge-0/0/2, ge-0/0/3
//! xe-0/[0-1]/[0-2]  → xe-0/0/0, xe-0/0/1, xe-0/0/2, xe-0/1/0, xe-0/1/1, xe-0/1/2
//! ```
//!
//! Expansion is outer-major: the leftmost range varies slowest.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Names [`expand_pattern`] will materialize before refusing a template
pub const DEFAULT_EXPANSION_LIMIT: usize = 4096;

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)-(\d+)\]").expect("range expression is a valid regex")
});

/// Pattern validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Pattern is empty")]
    Empty,

    #[error("Malformed range expression in pattern: {0}")]
    MalformedRange(String),

    #[error("Range bound is not a valid number: {0}")]
    InvalidBound(String),

    #[error("Range [{low}-{high}] is descending and yields no names")]
    DescendingRange { low: u32, high: u32 },

    #[error("Pattern expands to {count} names, exceeding the limit of {limit}")]
    TooManyNames { count: u128, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum Segment {
    Literal(String),
    Range { low: u32, high: u32 },
}

/// Parsed name pattern
///
/// Invariants:
/// - Non-empty template
/// - Every `[` and `]` belongs to a well-formed `[low-high]` range
/// - `low <= high` for every range
///
/// # Examples
///
/// ```rust
/// use cim_dcim::domain::NamePattern;
///
/// let pattern = NamePattern::new("ge-0/0/[0-3]").unwrap();
/// assert_eq!(pattern.len(), 4);
/// assert_eq!(pattern.expand()[3], "ge-0/0/3");
///
/// assert!(NamePattern::new("eth[a-b]").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamePattern {
    template: String,
    segments: Vec<Segment>,
}

impl NamePattern {
    /// Parse a template into a pattern
    pub fn new(template: impl Into<String>) -> Result<Self, PatternError> {
        let template = template.into();
        if template.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut segments = Vec::new();
        let mut cursor = 0;

        for caps in RANGE.captures_iter(&template) {
            let whole = caps.get(0).expect("capture group 0 always matches");
            push_literal(&mut segments, &template[cursor..whole.start()])?;

            let low = parse_bound(&caps[1])?;
            let high = parse_bound(&caps[2])?;
            if low > high {
                return Err(PatternError::DescendingRange { low, high });
            }
            segments.push(Segment::Range { low, high });
            cursor = whole.end();
        }
        push_literal(&mut segments, &template[cursor..])?;

        Ok(Self { template, segments })
    }

    /// Parse and check the expansion stays within `limit` names
    pub fn with_limit(template: impl Into<String>, limit: usize) -> Result<Self, PatternError> {
        let pattern = Self::new(template)?;
        let count = pattern.count();
        if count > limit as u128 {
            return Err(PatternError::TooManyNames { count, limit });
        }
        Ok(pattern)
    }

    /// The original template
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Whether the template contains at least one range
    pub fn has_ranges(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Range { .. }))
    }

    /// Number of names the pattern expands to, without materializing them
    pub fn len(&self) -> usize {
        usize::try_from(self.count()).unwrap_or(usize::MAX)
    }

    /// A parsed pattern always yields at least one name
    pub fn is_empty(&self) -> bool {
        false
    }

    fn count(&self) -> u128 {
        self.segments.iter().fold(1u128, |acc, segment| match segment {
            Segment::Literal(_) => acc,
            Segment::Range { low, high } => {
                acc.saturating_mul(u128::from(high - low) + 1)
            }
        })
    }

    /// Expand into the ordered sequence of concrete names
    ///
    /// Materializes every name with no size check. Build untrusted templates
    /// with [`NamePattern::with_limit`] so [`NamePattern::len`] is bounded.
    pub fn expand(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.len().min(DEFAULT_EXPANSION_LIMIT));
        expand_into(&self.segments, String::new(), &mut names);
        names
    }
}

/// Expand a template in one step
///
/// Refuses templates yielding more than [`DEFAULT_EXPANSION_LIMIT`] names.
pub fn expand_pattern(template: &str) -> Result<Vec<String>, PatternError> {
    Ok(NamePattern::with_limit(template, DEFAULT_EXPANSION_LIMIT)?.expand())
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) -> Result<(), PatternError> {
    if text.is_empty() {
        return Ok(());
    }
    // Any bracket left over did not match a well-formed range.
    if text.contains(['[', ']']) {
        return Err(PatternError::MalformedRange(text.to_string()));
    }
    segments.push(Segment::Literal(text.to_string()));
    Ok(())
}

fn parse_bound(digits: &str) -> Result<u32, PatternError> {
    digits
        .parse::<u32>()
        .map_err(|_| PatternError::InvalidBound(digits.to_string()))
}

/// Split at the first range into lead / range / remnant and recurse on the remnant.
fn expand_into(segments: &[Segment], prefix: String, out: &mut Vec<String>) {
    let Some(pos) = segments
        .iter()
        .position(|s| matches!(s, Segment::Range { .. }))
    else {
        let mut name = prefix;
        for segment in segments {
            if let Segment::Literal(text) = segment {
                name.push_str(text);
            }
        }
        out.push(name);
        return;
    };

    let mut lead = prefix;
    for segment in &segments[..pos] {
        if let Segment::Literal(text) = segment {
            lead.push_str(text);
        }
    }

    if let Segment::Range { low, high } = segments[pos] {
        let remnant = &segments[pos + 1..];
        for i in low..=high {
            expand_into(remnant, format!("{lead}{i}"), out);
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template)
    }
}

impl FromStr for NamePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NamePattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NamePattern> for String {
    fn from(pattern: NamePattern) -> Self {
        pattern.template
    }
}
