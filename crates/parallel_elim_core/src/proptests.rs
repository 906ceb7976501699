//! Property-based tests for staged forward elimination.
