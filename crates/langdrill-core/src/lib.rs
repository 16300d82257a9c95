//! langdrill-core: Skill tracking, difficulty parameters, and content schema.
//!
//! This crate defines the data model, the level-transition state machine, the
//! level-to-parameter mapping, and the traits that content providers and
//! progress stores implement.

pub mod content;
pub mod engine;
pub mod error;
pub mod locks;
pub mod model;
pub mod params;
pub mod scoring;
pub mod thresholds;
pub mod tracker;
pub mod traits;
