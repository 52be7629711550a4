//! Test suites for the server bootstrap.

mod support;
