// Domain layer - Motor telemetry models and decision rules
pub mod billing;
pub mod classifier;
pub mod diagnosis;
pub mod history;
pub mod motor;
pub mod sample;
