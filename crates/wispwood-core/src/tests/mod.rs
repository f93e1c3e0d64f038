//! Scenario tests for the whole play scene.
//!
//! - `helpers.rs`: scene setup and tick drivers
//! - `integration.rs`: movement, chase, combat, death, special, pause and
//!   session scenarios driven through [`crate::simulation::Simulation::step`]

mod helpers;
