// Application state for HTTP handlers
use crate::application::diagnostics::DiagnosticsService;
use crate::application::motor_service::MotorService;

#[derive(Clone)]
pub struct AppState {
    pub motor_service: MotorService,
    pub diagnostics_service: DiagnosticsService,
}
