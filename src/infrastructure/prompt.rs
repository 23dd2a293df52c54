// Prompt construction for the narrative collaborator
use crate::application::diagnostics::NarrativeRequest;
use crate::domain::motor::{slip_percent, SYNC_SPEED_RPM};
use crate::domain::sample::PhaseKind;
use std::fmt::Write;

fn technical_context(request: &NarrativeRequest) -> String {
    match request.profile.phase_kind {
        PhaseKind::ThreePhase => {
            let slip = slip_percent(request.current.speed);
            format!(
                "- Construction: 4-Pole, 50Hz (Sync Speed: {} RPM)\n\
                 - Calculated Slip: {:.2}% (Normal Full Load ~3-5%)\n\
                 - Topology: Squirrel Cage Induction Motor\n\
                 - Analysis Instruction: Use calculated SLIP to assess rotor bar health and load conditions.",
                SYNC_SPEED_RPM, slip
            )
        }
        PhaseKind::SinglePhase => "- Application: Standard Single Phase Motor\n\
             - Analysis Instruction: Focus on general electrical and mechanical anomalies."
            .to_string(),
    }
}

fn history_lines(request: &NarrativeRequest) -> String {
    let total = request.history.len();
    let mut lines = String::new();
    for (i, sample) in request.history.iter().enumerate() {
        let _ = writeln!(
            lines,
            "T-{}: Temp={}°C, Vib={}mm/s, Cur={}A",
            total - i,
            sample.temperature,
            sample.vibration,
            sample.current
        );
    }
    lines
}

pub fn build_prompt(request: &NarrativeRequest) -> String {
    let profile = &request.profile;
    let thresholds = &request.thresholds;
    let current = &request.current;
    let flag = if current.fault_flag { "FAULT TRIGGERED" } else { "NORMAL" };

    format!(
        "You are an expert AI diagnostics system for electrical motors.

System Configuration:
- Motor Type: {name}
- Nominal Voltage: {nominal}V
- Max Rated Current: {max_current}A
{context}

Safety Thresholds for Analysis:
- Temperature: Normal <= {temp_warning}°C | Warning {temp_warning}-{temp_critical}°C | Critical > {temp_critical}°C
- Vibration: Normal {vib_low} - {vib_high} mm/s | Warning > {vib_high} mm/s or sudden change > {vib_spike} mm/s
- Current: Attention above {high_load:.2}A | Critical if > {max_current}A

Historical Trend (Last {count} samples):
{history}
Current Real-time Telemetry:
- Voltage: {voltage} V
- Current: {amps} A
- Speed: {speed} RPM
- Vibration: {vibration} mm/s
- Temperature: {temperature} °C
- System Flag: {flag}

Task:
Analyze the provided telemetry data and historical trends to generate a predictive condition monitoring report.

Required Output Format (Markdown):
# Severity: [LOW / MEDIUM / HIGH]

### Critical Parameters
[List the specific metrics driving this severity level.]

### Predictive Analysis
[Forecast potential failures based on the trend in the history data.]

### Recommendation
[One actionable maintenance step or safety protocol.]

Tone: Professional, objective, and concise.
",
        name = profile.display_name,
        nominal = profile.nominal_voltage,
        max_current = thresholds.max_rated_current,
        context = technical_context(request),
        temp_warning = thresholds.temp_warning,
        temp_critical = thresholds.temp_critical,
        vib_low = thresholds.vib_lower_limit,
        vib_high = thresholds.vib_upper_limit,
        vib_spike = thresholds.vib_spike_limit,
        high_load = thresholds.high_load_current,
        count = request.history.len(),
        history = history_lines(request),
        voltage = current.voltage,
        amps = current.current,
        speed = current.speed,
        vibration = current.vibration,
        temperature = current.temperature,
        flag = flag,
    )
}
