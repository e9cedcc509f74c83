// Tabloop services
// Services implement the pipeline: detection, content messaging, the model bridge,
// plan building and execution, nudges, the reaper, background listeners and settings.

pub mod background;
pub mod content_channel;
pub mod group_reaper;
pub mod language_model;
pub mod model_bridge;
pub mod nudge_engine;
pub mod organizer;
pub mod plan_builder;
pub mod plan_executor;
pub mod settings_engine;
pub mod state_detector;
