// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties of name pattern expansion, device family grouping, and the
//! all-or-nothing port batch rule.

mod batch_atomicity;
mod pattern_expansion;
mod related_names;
