//! Behavioural suites for the session protocol engine.

mod lifecycle_behaviour;
mod support;
