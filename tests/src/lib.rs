//! Integration tests live in `tests/`, one test target per group.
