//! Shared scenario world for the behavioural suites.

#[path = "world.rs"]
mod session_world;

pub use session_world::{SessionWorld, world};
