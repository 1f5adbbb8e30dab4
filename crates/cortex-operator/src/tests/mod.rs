//! Test suites for the operator bootstrap.

mod support;
