//! Stride locomotion library
//!
//! A first-person character controller: a deterministic stance and velocity
//! state machine driven through an abstract motor, plus a rapier3d-backed
//! motor for running it against real geometry.

pub mod character;
pub mod config;
pub mod logging;
pub mod physics;
pub mod testing;
