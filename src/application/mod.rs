// Application layer - Use cases over the motor telemetry domain
pub mod diagnostics;
pub mod motor_service;
pub mod sample_source;
pub mod simulation;
