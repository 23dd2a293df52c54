// HTTP request handlers
use crate::application::diagnostics::NarrativeOutcome;
use crate::application::simulation::SimulationDriver;
use crate::domain::billing::TariffRate;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, error_response, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct Settings {
    pub tariff_rate: TariffRate,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn lookup(state: &AppState, id: &str) -> Result<Arc<SimulationDriver>, Response> {
    state
        .motor_service
        .driver(id)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("unknown motor '{}'", id)))
}

async fn respond<T: Serialize>(data: &T, headers: &HeaderMap) -> Response {
    match json_response(data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// List configured motors
pub async fn list_motors(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(&state.motor_service.list_profiles(), &headers).await
}

/// Current sample, history, diagnosis and billing for one motor
pub async fn get_motor(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match lookup(&state, &id) {
        Ok(driver) => respond(&driver.snapshot().await, &headers).await,
        Err(response) => response,
    }
}

pub async fn start_motor(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match lookup(&state, &id) {
        Ok(driver) => {
            driver.start().await;
            respond(&driver.snapshot().await, &headers).await
        }
        Err(response) => response,
    }
}

pub async fn pause_motor(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match lookup(&state, &id) {
        Ok(driver) => {
            driver.pause().await;
            respond(&driver.snapshot().await, &headers).await
        }
        Err(response) => response,
    }
}

pub async fn reset_motor(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match lookup(&state, &id) {
        Ok(driver) => {
            driver.reset().await;
            respond(&driver.snapshot().await, &headers).await
        }
        Err(response) => response,
    }
}

pub async fn reset_billing(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match lookup(&state, &id) {
        Ok(driver) => {
            driver.reset_billing().await;
            respond(&driver.snapshot().await, &headers).await
        }
        Err(response) => response,
    }
}

/// Reset every motor (system refresh)
pub async fn reset_all(State(state): State<Arc<AppState>>) -> StatusCode {
    state.motor_service.reset_all().await;
    StatusCode::NO_CONTENT
}

/// Ask the narrative collaborator about the motor's current condition
pub async fn request_diagnosis(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let driver = match lookup(&state, &id) {
        Ok(driver) => driver,
        Err(response) => return response,
    };

    match state.diagnostics_service.request(&driver).await {
        NarrativeOutcome::Delivered(narrative) => Json(narrative).into_response(),
        NarrativeOutcome::NoData => {
            error_response(StatusCode::CONFLICT, "no telemetry yet; start the simulation first")
        }
        NarrativeOutcome::Superseded => {
            error_response(StatusCode::CONFLICT, "diagnosis superseded by a reset or newer request")
        }
    }
}

/// Stream driver events for one motor (length-prefixed JSON frames)
pub async fn stream_motor(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match lookup(&state, &id) {
        Ok(driver) => stream_from_receiver(driver.subscribe(), accepts_brotli(&headers))
            .await
            .into_response(),
        Err(response) => response,
    }
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(Settings {
        tariff_rate: state.motor_service.tariff_rate().await,
    })
}

/// Body is taken as raw JSON so non-numeric input gets a 400 and leaves the rate untouched
pub async fn update_tariff(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Some(rate) = body.get("rate").and_then(|v| v.as_f64()) else {
        return error_response(StatusCode::BAD_REQUEST, "rate must be a number");
    };

    match TariffRate::new(rate) {
        Ok(tariff_rate) => {
            state.motor_service.set_tariff_rate(tariff_rate).await;
            Json(Settings { tariff_rate }).into_response()
        }
        Err(e) => {
            tracing::warn!(rate, error = %e, "rejected tariff update");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::{DiagnosticsService, NarrativeProvider, NarrativeRequest};
    use crate::application::motor_service::MotorService;
    use crate::application::sample_source::SampleSource;
    use crate::application::simulation::FixedInterval;
    use crate::domain::sample::MotorProfile;
    use crate::infrastructure::reference_dataset::REFERENCE_ROWS;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StubProvider;

    #[async_trait]
    impl NarrativeProvider for StubProvider {
        async fn analyze(&self, request: &NarrativeRequest) -> anyhow::Result<String> {
            Ok(format!("# Severity: LOW ({})", request.profile.id))
        }
    }

    fn state() -> Arc<AppState> {
        let motor_service = MotorService::new(
            MotorProfile::presets(),
            Arc::new(SampleSource::from_rows(REFERENCE_ROWS).unwrap()),
            TariffRate::default(),
            Arc::new(FixedInterval(Duration::from_millis(1000))),
        );
        Arc::new(AppState {
            motor_service,
            diagnostics_service: DiagnosticsService::new(Arc::new(StubProvider)),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_motor_is_404() {
        let response = get_motor(Path("nope".to_string()), HeaderMap::new(), State(state())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_motors() {
        let response = list_motors(HeaderMap::new(), State(state())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json[0]["phase_kind"], "SINGLE_PHASE");
        assert_eq!(json[1]["id"], "m3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_then_snapshot() {
        let state = state();
        let response = start_motor(Path("m3".to_string()), HeaderMap::new(), State(state.clone())).await;
        assert_eq!(body_json(response).await["is_running"], true);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let json = body_json(get_motor(Path("m3".to_string()), HeaderMap::new(), State(state.clone())).await).await;
        assert_eq!(json["cursor"], 2);
        assert_eq!(json["history"].as_array().unwrap().len(), 2);
        assert_eq!(json["diagnosis"]["tier"], "NORMAL");

        let json = body_json(reset_motor(Path("m3".to_string()), HeaderMap::new(), State(state)).await).await;
        assert_eq!(json["cursor"], 0);
        assert!(json["diagnosis"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn test_billing_reset_keeps_session() {
        let state = state();
        start_motor(Path("m1".to_string()), HeaderMap::new(), State(state.clone())).await;
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let json = body_json(reset_billing(Path("m1".to_string()), HeaderMap::new(), State(state.clone())).await).await;
        assert_eq!(json["billing"]["accumulated_cost"], 0.0);
        assert_eq!(json["cursor"], 2);
        assert_eq!(json["history"].as_array().unwrap().len(), 2);
        assert_eq!(json["is_running"], true);

        let response = reset_billing(Path("nope".to_string()), HeaderMap::new(), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_tariff_keeps_previous_rate() {
        let state = state();

        let response = update_tariff(State(state.clone()), Json(serde_json::json!({"rate": "abc"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = update_tariff(State(state.clone()), Json(serde_json::json!({"rate": -3.0}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let Json(settings) = get_settings(State(state.clone())).await;
        assert_eq!(settings.tariff_rate, TariffRate::default());

        let response = update_tariff(State(state.clone()), Json(serde_json::json!({"rate": 9.25}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let Json(settings) = get_settings(State(state)).await;
        assert_eq!(settings.tariff_rate.value(), 9.25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_diagnosis_requires_data() {
        let state = state();
        let response = request_diagnosis(Path("m1".to_string()), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        start_motor(Path("m1".to_string()), HeaderMap::new(), State(state.clone())).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let response = request_diagnosis(Path("m1".to_string()), State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["text"], "# Severity: LOW (m1)");
    }

    #[tokio::test]
    async fn test_reset_all_returns_no_content() {
        assert_eq!(reset_all(State(state())).await, StatusCode::NO_CONTENT);
    }
}
