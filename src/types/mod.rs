// Tabloop shared type definitions
// Each submodule defines types used across the pipeline.

pub mod errors;
pub mod nudge;
pub mod plan;
pub mod settings;
pub mod snapshot;
pub mod tab;
