//! Boundary adapters between the event bus and the registries.

mod keypress;
mod window_events;

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;

pub use keypress::KeypressRouter;
pub use window_events::WindowEventRouter;
