//! Mapping Engine.

pub mod engine;
pub mod prompts;
pub mod scoring;
pub mod types;

pub use engine::MappingEngine;
pub use types::{rank, Candidate, MappingScores};
